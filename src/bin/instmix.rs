//! Op-class instruction mix.
//!
//! This program prints a shuffled list of `<op>\tstub` rows to
//! standard output. Ops are grouped into classes with a share
//! of the total each, and every row is a random op of its class.
//!
//! Without class arguments, the built-in classes are used.

use simmix::OpClass;
use simmix::mix::write_rows_to;
use simmix::opclass::DEFAULT_INST_COUNT;
use std::error::Error;
use std::io::{ self, BufWriter, Write };

#[derive(clap::Parser, Debug)]
struct InstMixArgs {
    /// The number of instructions
    #[clap(long, default_value_t = DEFAULT_INST_COUNT)]
    count: u64,
    /// Op classes, as `<name>=<percent>:<op>,<op>,...`
    ///
    /// If given, these replace the built-in classes.
    classes: Vec<String>,
}

fn run(args: &InstMixArgs) -> Result<(), Box<dyn Error>> {
    let classes = match args.classes.is_empty() {
        true => OpClass::defaults(),
        false => args.classes.iter()
            .map(|c| c.parse::<OpClass>())
            .collect::<Result<Vec<_>, _>>()?
    };
    for c in &classes {
        clilog::info!(IMIX_CLASS, "\t {}: {} ({}%)",
                      c.name, c.count(args.count), c.percent);
    }
    let rows = OpClass::generate(&classes, args.count, &mut rand::thread_rng())?;
    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    write_rows_to(&mut w, &rows)?;
    w.flush()?;
    Ok(())
}

fn main() {
    clilog::init_stderr_color_debug();
    let args = <InstMixArgs as clap::Parser>::parse();
    clilog::debug!(IMIX_ARGS, "args: {:?}", args);
    if let Err(e) = run(&args) {
        clilog::error!(IMIX_ERR, "{}", e);
        std::process::exit(1);
    }
}
