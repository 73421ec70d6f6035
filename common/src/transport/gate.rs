// Readiness gate backed by a watch channel

use crate::errors::GateError;
use async_trait::async_trait;
use tokio::sync::watch;

/// Defers work until the publish transport is usable
#[async_trait]
pub trait ReadinessGate: Send + Sync {
    /// Resolve once the transport is ready
    ///
    /// Each call resolves at most once. Returns `GateError::Closed` when the
    /// gate can never become ready.
    async fn wait_ready(&self) -> Result<(), GateError>;

    /// Current readiness without waiting
    fn is_ready(&self) -> bool;
}

/// Create a connected handle/gate pair, initially not ready
pub fn readiness_channel() -> (ReadinessHandle, WatchReadinessGate) {
    let (tx, rx) = watch::channel(false);
    (ReadinessHandle { tx }, WatchReadinessGate { rx })
}

/// Producer side: whoever knows the transport state flips it here
#[derive(Debug, Clone)]
pub struct ReadinessHandle {
    tx: watch::Sender<bool>,
}

impl ReadinessHandle {
    /// Update readiness; repeated identical signals do not wake waiters
    pub fn set_ready(&self, ready: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == ready {
                false
            } else {
                *current = ready;
                true
            }
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct WatchReadinessGate {
    rx: watch::Receiver<bool>,
}

#[async_trait]
impl ReadinessGate for WatchReadinessGate {
    async fn wait_ready(&self) -> Result<(), GateError> {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return Ok(());
            }
            rx.changed().await.map_err(|_| GateError::Closed)?;
        }
    }

    fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }
}
