//! Instruction task generation.
//!
//! This program writes a task of `<inst>\tstub` rows, with the
//! instructions drawn in proportion to the given percentages
//! and shuffled. The task goes to `<dir>/<name>.task`.

use simmix::{ MixRow, WeightedMix, TASK_SUFFIX };
use simmix::mix::write_rows;
use std::error::Error;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
struct TaskGenArgs {
    /// The task name
    name: String,
    /// The total number of instructions in the task
    inst_count: u64,
    /// The instruction mix, as `<inst>:<percent>` pairs adding up to 100
    #[clap(required = true)]
    mix: Vec<String>,
    /// The output directory
    #[clap(long, default_value = simmix::INPUT_DIR)]
    dir: PathBuf,
}

fn run(args: &TaskGenArgs) -> Result<(), Box<dyn Error>> {
    clilog::info!(TGEN_NAME, "task name: {}", args.name);
    clilog::info!(TGEN_COUNT, "instruction count: {}", args.inst_count);
    let mix = WeightedMix::parse_args(&args.mix)?;
    mix.log_breakdown(args.inst_count);

    clilog::info!(TGEN_GEN, "generating task...");
    let rows = mix.generate(args.inst_count, &mut rand::thread_rng(), |e| {
        Ok::<_, simmix::MixError>(MixRow::stub(&e.label))
    })?;
    let path = args.dir.join(format!("{}{}", args.name, TASK_SUFFIX));
    write_rows(&path, &rows)?;
    clilog::info!(TGEN_DONE, "wrote {} instructions to {}",
                  rows.len(), path.display());
    Ok(())
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = <TaskGenArgs as clap::Parser>::parse();
    clilog::debug!(TGEN_ARGS, "args: {:?}", args);
    if let Err(e) = run(&args) {
        clilog::error!(TGEN_ERR, "{}", e);
        std::process::exit(1);
    }
}
