// Transport readiness: the gate the scheduler waits on and the connectivity check that drives it

pub mod gate;
pub mod monitor;

pub use gate::{readiness_channel, ReadinessGate, ReadinessHandle, WatchReadinessGate};
pub use monitor::{check_target, ConnectivityMonitor};
