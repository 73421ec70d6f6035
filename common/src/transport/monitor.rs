// Connectivity check that keeps the readiness gate in sync with the endpoint

use crate::config::TransportConfig;
use crate::errors::ValidationError;
use crate::shutdown::Shutdown;
use crate::telemetry;
use crate::transport::gate::ReadinessHandle;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// Derive the `host:port` to check from an endpoint URL
pub fn check_target(endpoint_url: &str) -> Result<String, ValidationError> {
    let url = reqwest::Url::parse(endpoint_url)
        .map_err(|e| ValidationError::invalid("cloud.endpoint_url", e.to_string()))?;

    let host = url
        .host_str()
        .ok_or_else(|| ValidationError::invalid("cloud.endpoint_url", "URL has no host"))?;
    let port = url.port_or_known_default().ok_or_else(|| {
        ValidationError::invalid("cloud.endpoint_url", "URL has no port and unknown scheme")
    })?;

    // IPv6 literals come back bracketed from host_str
    Ok(format!("{}:{}", host, port))
}

/// Periodically opens a TCP connection to the endpoint and reports readiness
pub struct ConnectivityMonitor {
    target: String,
    check_interval: Duration,
    connect_timeout: Duration,
    handle: ReadinessHandle,
    shutdown: Shutdown,
}

impl ConnectivityMonitor {
    pub fn new(
        endpoint_url: &str,
        config: &TransportConfig,
        handle: ReadinessHandle,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            target: check_target(endpoint_url)?,
            check_interval: Duration::from_millis(config.check_interval_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            handle,
            shutdown: Shutdown::new(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Single connection attempt
    pub async fn check_once(&self) -> bool {
        match timeout(self.connect_timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!(target_addr = %self.target, error = %e, "Connectivity check failed");
                false
            }
            Err(_) => {
                debug!(
                    target_addr = %self.target,
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "Connectivity check timed out"
                );
                false
            }
        }
    }

    /// Check until stopped, publishing every readiness transition
    #[instrument(skip(self), fields(target_addr = %self.target))]
    pub async fn run(&self) {
        info!(
            check_interval_ms = self.check_interval.as_millis() as u64,
            "Starting connectivity monitor"
        );

        let mut shutdown = self.shutdown.subscribe();

        loop {
            let ready = tokio::select! {
                ready = self.check_once() => ready,
                _ = shutdown.recv() => break,
            };

            if self.handle.set_ready(ready) {
                if ready {
                    info!("Transport is ready");
                } else {
                    warn!("Transport became unreachable");
                }
            }
            telemetry::update_transport_ready(ready);

            tokio::select! {
                _ = sleep(self.check_interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        info!("Connectivity monitor stopped");
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::gate::{readiness_channel, ReadinessGate};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn fast_config() -> TransportConfig {
        TransportConfig {
            check_interval_ms: 20,
            connect_timeout_ms: 500,
        }
    }

    #[test]
    fn test_check_target_uses_default_port() {
        assert_eq!(
            check_target("https://api.cesanta.com").unwrap(),
            "api.cesanta.com:443"
        );
        assert_eq!(
            check_target("http://localhost/v1").unwrap(),
            "localhost:80"
        );
    }

    #[test]
    fn test_check_target_keeps_explicit_port() {
        assert_eq!(
            check_target("http://127.0.0.1:8080/rpc").unwrap(),
            "127.0.0.1:8080"
        );
    }

    #[test]
    fn test_check_target_rejects_relative_url() {
        assert!(check_target("//api.cesanta.com").is_err());
    }

    #[tokio::test]
    async fn test_monitor_marks_listening_endpoint_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (handle, gate) = readiness_channel();
        let monitor = Arc::new(
            ConnectivityMonitor::new(&format!("http://{}", addr), &fast_config(), handle)
                .unwrap(),
        );

        let task = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.run().await }
        });

        tokio::time::timeout(Duration::from_secs(5), gate.wait_ready())
            .await
            .expect("monitor should report ready")
            .unwrap();

        monitor.stop();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_check_fails_for_closed_port() {
        // Bind then drop to obtain a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (handle, _gate) = readiness_channel();
        let monitor =
            ConnectivityMonitor::new(&format!("http://{}", addr), &fast_config(), handle).unwrap();

        assert!(!monitor.check_once().await);
    }
}
