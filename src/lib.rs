//! ## `simmix`: simulation workload mixes
//!
//! This contains the core functionalities and data structures
//! for the workload generation and power trace toolkit:
//! weighted-mix task/queue generation, energy table lookup,
//! op-class instruction mixes, and power trace aggregation.
//!
//! See the binaries for example usage.

pub mod mix;
pub mod energy;
pub mod opclass;
pub mod loc;
pub mod power;

pub use mix::{ MixEntry, MixError, MixRow, WeightedMix };
pub use energy::{ EnergyError, EnergyTable };
pub use opclass::OpClass;
pub use loc::HwLoc;
pub use power::{ LayoutDims, PowerError, PowerGrid, PowerTrace, RowFormula };

/// The directory generated tasks and queues are written into.
pub const INPUT_DIR: &str = "input";
/// File suffix of generated task files.
pub const TASK_SUFFIX: &str = ".task";
/// File suffix of generated queue files.
pub const QUEUE_SUFFIX: &str = ".queue";
/// The placeholder secondary field of task and queue rows.
pub const STUB: &str = "stub";
