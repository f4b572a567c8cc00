//! Power trace aggregation.
//!
//! This program reads per-location power trace logs, named
//! like `<prefix>.brd0.chp0.unt3.blk7.<suffix>`, and prints
//! the total power of the simulated chip over time.
//!
//! The aggregated trace can be saved and fed again later,
//! so that logs may be processed in several runs.

use simmix::{ LayoutDims, PowerTrace, RowFormula };
use std::error::Error;
use std::io::{ self, BufWriter, Write };
use std::path::PathBuf;
use std::time::Instant;

#[derive(clap::Parser, Debug)]
struct PowGraphArgs {
    /// The power trace log files
    #[clap(required = true)]
    logs: Vec<PathBuf>,
    /// Number of blocks per unit, horizontally
    #[clap(long, default_value_t = 4)]
    block_width: usize,
    /// Number of blocks per unit, vertically
    #[clap(long, default_value_t = 4)]
    block_height: usize,
    /// Number of units, horizontally
    #[clap(long, default_value_t = 4)]
    unit_width: usize,
    /// Number of units, vertically
    #[clap(long, default_value_t = 4)]
    unit_height: usize,
    /// Read the layout from the `Simulated ... layout` lines of
    /// the logs instead.
    #[clap(long)]
    dims_from_logs: bool,
    /// Derive rows from the block height instead of the block
    /// width.
    ///
    /// Older power graphs were produced without this, and will
    /// not match on layouts that are not square.
    #[clap(long)]
    symmetric_rows: bool,
    /// The optional previous trace to continue from.
    #[clap(long)]
    db_input: Option<PathBuf>,
    /// The optional path to save the aggregated trace to.
    #[clap(long)]
    db_output: Option<PathBuf>,
}

/// Split seconds into hours, minutes and seconds.
fn hms(seconds: u64) -> (u64, u64, u64) {
    (seconds / 3600, seconds / 60 % 60, seconds % 60)
}

fn run(args: &PowGraphArgs) -> Result<(), Box<dyn Error>> {
    let begin = Instant::now();
    let mut dims = LayoutDims {
        block_width: args.block_width,
        block_height: args.block_height,
        unit_width: args.unit_width,
        unit_height: args.unit_height,
    };
    if args.dims_from_logs {
        for log in &args.logs {
            dims.scan_log(log)?;
        }
    }
    dims.validate()?;
    clilog::info!(PGRAPH_BLK, "block layout: {} by {}...",
                  dims.block_width, dims.block_height);
    clilog::info!(PGRAPH_UNT, "unit layout: {} by {}...",
                  dims.unit_width, dims.unit_height);

    let formula = match args.symmetric_rows {
        true => RowFormula::Symmetric,
        false => RowFormula::Legacy
    };
    let mut trace = match &args.db_input {
        Some(path) => PowerTrace::load(path, dims)?,
        None => PowerTrace::new(dims, formula)?
    };
    if trace.formula != formula {
        clilog::warn!(PGRAPH_FORMULA,
                      "previous trace uses {:?} rows, continuing with it",
                      trace.formula);
    }

    let mut skipped = 0;
    for log in &args.logs {
        if trace.feed_log(log)?.is_none() {
            skipped += 1;
        }
    }
    if skipped != 0 {
        clilog::info!(PGRAPH_SKIP, "skipped {} files without a location",
                      skipped);
    }
    if let Some(last) = trace.last_cycle() {
        clilog::info!(PGRAPH_LAST, "{} cycles, last cycle {}",
                      trace.cycles.len(), last);
    }

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    trace.write_report(&mut w)?;
    w.flush()?;

    if let Some(path) = &args.db_output {
        trace.save(path)?;
    }
    let (h, m, s) = hms(begin.elapsed().as_secs());
    clilog::info!(PGRAPH_TIME, "time to generate graph: {:02}:{:02}:{:02}",
                  h, m, s);
    Ok(())
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = <PowGraphArgs as clap::Parser>::parse();
    clilog::debug!(PGRAPH_ARGS, "args: {:?}", args);
    if let Err(e) = run(&args) {
        clilog::error!(PGRAPH_ERR, "{}", e);
        std::process::exit(1);
    }
}
