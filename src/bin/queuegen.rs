//! Task queue generation.
//!
//! This program builds a queue out of previously generated
//! tasks. Every task named in the mix must already exist as
//! `<dir>/<task>.task`. The queue lists task names in a
//! random order, in proportion to the given percentages,
//! and is written to `<dir>/<name>.queue`.

use simmix::{ MixRow, WeightedMix, QUEUE_SUFFIX, TASK_SUFFIX };
use simmix::mix::write_rows;
use std::error::Error;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
struct QueueGenArgs {
    /// The queue name
    name: String,
    /// The total number of tasks in the queue
    task_count: u64,
    /// The task mix, as `<task>:<percent>` pairs adding up to 100
    #[clap(required = true)]
    mix: Vec<String>,
    /// The directory holding the tasks and receiving the queue
    #[clap(long, default_value = simmix::INPUT_DIR)]
    dir: PathBuf,
}

fn run(args: &QueueGenArgs) -> Result<(), Box<dyn Error>> {
    clilog::info!(QGEN_NAME, "queue name: {}", args.name);
    clilog::info!(QGEN_COUNT, "task count: {}", args.task_count);
    let mix = WeightedMix::parse_args(&args.mix)?;
    clilog::info!(QGEN_MIX, "task mix breakdown:");
    mix.log_breakdown(args.task_count);
    mix.require(
        &format!("directory '{}'", args.dir.display()),
        |task| args.dir.join(format!("{}{}", task, TASK_SUFFIX)).is_file()
    )?;

    clilog::info!(QGEN_GEN, "generating queue...");
    let rows = mix.generate(args.task_count, &mut rand::thread_rng(), |e| {
        Ok::<_, simmix::MixError>(MixRow::stub(&e.label))
    })?;
    let path = args.dir.join(format!("{}{}", args.name, QUEUE_SUFFIX));
    write_rows(&path, &rows)?;
    clilog::info!(QGEN_DONE, "wrote {} tasks to {}", rows.len(), path.display());
    Ok(())
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = <QueueGenArgs as clap::Parser>::parse();
    clilog::debug!(QGEN_ARGS, "args: {:?}", args);
    if let Err(e) = run(&args) {
        clilog::error!(QGEN_ERR, "{}", e);
        std::process::exit(1);
    }
}
