//! 实验驱动与参数扫描

mod config;
mod driver;

pub use config::{ExperimentConfig, Sweep, SweepSpec};
pub use driver::{SweepErrorPolicy, SweepOutcome, run_experiment, run_sweep};
