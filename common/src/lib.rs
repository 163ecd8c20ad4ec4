// Common library for shared code across the scheduler and API binaries

pub mod config;
pub mod db;
pub mod errors;
pub mod executor;
pub mod jitter;
pub mod lock;
pub mod models;
pub mod scheduler;
pub mod telemetry;
