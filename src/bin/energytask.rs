//! Energy task generation.
//!
//! This program writes a task whose rows are the energies of
//! the mixed instructions under two process sizes: the full
//! voltage one and the near-threshold one. The energies are
//! looked up in a tab-delimited reference table.

use simmix::{ EnergyTable, MixError, MixRow, WeightedMix, TASK_SUFFIX };
use simmix::energy::DEFAULT_ENERGY_MAP;
use simmix::mix::write_rows;
use std::error::Error;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
struct EnergyTaskArgs {
    /// The task name
    name: String,
    /// The total number of instructions in the task
    inst_count: u64,
    /// The process size column of full-voltage energies
    full_header: String,
    /// The process size column of near-threshold energies
    half_header: String,
    /// The instruction mix, as `<inst>:<percent>` pairs adding up to 100
    #[clap(required = true)]
    mix: Vec<String>,
    /// The energy reference table
    #[clap(long, default_value = DEFAULT_ENERGY_MAP)]
    energy_map: PathBuf,
    /// The output directory
    #[clap(long, default_value = simmix::INPUT_DIR)]
    dir: PathBuf,
}

fn run(args: &EnergyTaskArgs) -> Result<(), Box<dyn Error>> {
    clilog::info!(ETASK_NAME, "task name: {}", args.name);
    clilog::info!(ETASK_COUNT, "instruction count: {}", args.inst_count);
    clilog::info!(ETASK_HDR, "full op header: {}, half op header: {}",
                  args.full_header, args.half_header);

    clilog::info!(ETASK_MAP, "mapping op class energy...");
    let full = EnergyTable::open(&args.energy_map, &args.full_header)?;
    let half = EnergyTable::open(&args.energy_map, &args.half_header)?;

    let mix = WeightedMix::parse_args(&args.mix)?;
    mix.log_breakdown(args.inst_count);
    mix.require("energy map", |inst| full.contains(inst) && half.contains(inst))?;

    clilog::info!(ETASK_GEN, "generating task...");
    let rows = mix.generate(args.inst_count, &mut rand::thread_rng(), |e| {
        let not_found = || MixError::NotFound {
            label: e.label.clone(),
            within: "energy map".to_string()
        };
        let f = full.get(&e.label).ok_or_else(not_found)?;
        let h = half.get(&e.label).ok_or_else(not_found)?;
        Ok::<_, MixError>(MixRow(f.clone(), h.clone()))
    })?;
    let path = args.dir.join(format!("{}{}", args.name, TASK_SUFFIX));
    write_rows(&path, &rows)?;
    clilog::info!(ETASK_DONE, "wrote {} instructions to {}",
                  rows.len(), path.display());
    Ok(())
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = <EnergyTaskArgs as clap::Parser>::parse();
    clilog::debug!(ETASK_ARGS, "args: {:?}", args);
    if let Err(e) = run(&args) {
        clilog::error!(ETASK_ERR, "{}", e);
        std::process::exit(1);
    }
}
