// Common library for the sensor publish agent

pub mod config;
pub mod console;
pub mod errors;
pub mod models;
pub mod rpc;
pub mod scheduler;
pub mod sensor;
pub mod shutdown;
pub mod telemetry;
pub mod transport;
