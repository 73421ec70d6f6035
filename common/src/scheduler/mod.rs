// Scheduler module for the readiness-gated publish loop

pub mod engine;

pub use engine::{CycleOutcome, Scheduler, SchedulerConfig, SchedulerEngine};
