// Scheduling core: job runner and ticker engine

pub mod engine;
pub mod runner;

pub use engine::{Scheduler, SchedulerConfig, SchedulerEngine};
pub use runner::JobRunner;
