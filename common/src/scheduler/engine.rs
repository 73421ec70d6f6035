// Scheduler engine implementation

use crate::config::Settings;
use crate::console::Console;
use crate::errors::{PublishError, SchedulerError};
use crate::models::{CycleStats, LoopState, PublishRequest, PublishResponse};
use crate::rpc::Publisher;
use crate::sensor::SensorSimulator;
use crate::shutdown::Shutdown;
use crate::telemetry;
use crate::transport::ReadinessGate;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Endpoint every reading is published to
    pub endpoint_url: String,
    /// Command name sent with each reading
    pub command: String,
    /// Value of the `__name__` label
    pub metric_name: String,
    /// Delay between a response and the next readiness check (in milliseconds)
    pub interval_ms: u64,
    /// Abandon a publish after this long; `None` waits forever
    pub response_timeout_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "https://api.cesanta.com".to_string(),
            command: "/v1/Metrics.Publish".to_string(),
            metric_name: "value".to_string(),
            interval_ms: 2000,
            response_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint_url: settings.cloud.endpoint_url.clone(),
            command: settings.cloud.command.clone(),
            metric_name: settings.cloud.metric_name.clone(),
            interval_ms: settings.scheduler.interval_ms,
            response_timeout_ms: settings.scheduler.response_timeout_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }
}

/// Result of one readiness + publish step
#[derive(Debug)]
pub enum CycleOutcome {
    Published(PublishResponse),
    Failed(PublishError),
}

impl CycleOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, CycleOutcome::Published(_))
    }
}

/// Scheduler trait for the publish loop
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Run cycles until stopped or the readiness gate closes
    async fn run(&self) -> Result<(), SchedulerError>;

    /// Stop the loop at its next suspension point
    async fn stop(&self);

    /// Wait for readiness, generate one reading and publish it
    async fn run_cycle(&self) -> Result<CycleOutcome, SchedulerError>;
}

#[derive(Debug, Default)]
struct Counters {
    cycles_completed: AtomicU64,
    publishes_succeeded: AtomicU64,
    publishes_failed: AtomicU64,
    consecutive_failures: AtomicU32,
}

/// Main scheduler engine implementation
pub struct SchedulerEngine {
    config: SchedulerConfig,
    gate: Arc<dyn ReadinessGate>,
    publisher: Arc<dyn Publisher>,
    sensor: SensorSimulator,
    console: Arc<dyn Console>,
    shutdown: Shutdown,
    state_tx: watch::Sender<LoopState>,
    counters: Counters,
    running: AtomicBool,
}

impl SchedulerEngine {
    /// Create a new scheduler engine
    pub fn new(
        config: SchedulerConfig,
        gate: Arc<dyn ReadinessGate>,
        publisher: Arc<dyn Publisher>,
        sensor: SensorSimulator,
        console: Arc<dyn Console>,
    ) -> Self {
        let (state_tx, _state_rx) = watch::channel(LoopState::AwaitingReadiness);

        Self {
            config,
            gate,
            publisher,
            sensor,
            console,
            shutdown: Shutdown::new(),
            state_tx,
            counters: Counters::default(),
            running: AtomicBool::new(false),
        }
    }

    /// Spawn the loop and return immediately
    ///
    /// Only one loop runs per engine; a second concurrent start resolves to
    /// `SchedulerError::AlreadyRunning`.
    pub fn start(self: &Arc<Self>) -> JoinHandle<Result<(), SchedulerError>> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run().await })
    }

    pub fn state(&self) -> LoopState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LoopState> {
        self.state_tx.subscribe()
    }

    pub fn stats(&self) -> CycleStats {
        CycleStats {
            cycles_completed: self.counters.cycles_completed.load(Ordering::Relaxed),
            publishes_succeeded: self.counters.publishes_succeeded.load(Ordering::Relaxed),
            publishes_failed: self.counters.publishes_failed.load(Ordering::Relaxed),
            consecutive_failures: self.counters.consecutive_failures.load(Ordering::Relaxed),
        }
    }

    fn set_state(&self, state: LoopState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "Scheduler state changed");
        }
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishResponse, PublishError> {
        let call = self.publisher.call(&self.config.endpoint_url, request);

        match self.config.response_timeout() {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(PublishError::Timeout(limit)),
            },
            None => call.await,
        }
    }

    fn record_outcome(
        &self,
        result: Result<PublishResponse, PublishError>,
        elapsed: Duration,
    ) -> CycleOutcome {
        self.counters.cycles_completed.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(response) => {
                self.counters
                    .publishes_succeeded
                    .fetch_add(1, Ordering::Relaxed);
                self.counters.consecutive_failures.store(0, Ordering::Relaxed);
                telemetry::record_publish_success(&self.config.command, elapsed.as_secs_f64());

                info!(
                    response = %response,
                    duration_ms = elapsed.as_millis() as u64,
                    "Reading published"
                );
                self.console
                    .print(&format!("publish response: {}", response));

                CycleOutcome::Published(response)
            }
            Err(e) => {
                self.counters.publishes_failed.fetch_add(1, Ordering::Relaxed);
                let consecutive = self
                    .counters
                    .consecutive_failures
                    .fetch_add(1, Ordering::Relaxed)
                    + 1;
                telemetry::record_publish_failure(&self.config.command, e.reason());

                error!(
                    error = %e,
                    consecutive_failures = consecutive,
                    "Failed to publish reading"
                );
                self.console.print(&format!("publish failed: {}", e));

                if telemetry::should_trigger_alert(consecutive) {
                    telemetry::alert_consecutive_failures(&self.config.endpoint_url, consecutive);
                }

                CycleOutcome::Failed(e)
            }
        }
    }
}

#[async_trait]
impl Scheduler for SchedulerEngine {
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint_url))]
    async fn run(&self) -> Result<(), SchedulerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Scheduler loop already running, ignoring start");
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            interval_ms = self.config.interval_ms,
            response_timeout_ms = ?self.config.response_timeout_ms,
            "Starting scheduler loop"
        );

        let mut shutdown = self.shutdown.subscribe();

        let result = loop {
            let outcome = tokio::select! {
                biased;
                _ = shutdown.recv() => break Ok(()),
                outcome = self.run_cycle() => outcome,
            };

            if let Err(e) = outcome {
                error!(error = %e, "Scheduler loop aborted");
                break Err(e);
            }

            tokio::select! {
                biased;
                _ = shutdown.recv() => break Ok(()),
                _ = sleep(self.config.interval()) => {}
            }
        };

        self.set_state(LoopState::Stopped);
        self.running.store(false, Ordering::Release);
        info!(stats = ?self.stats(), "Scheduler loop stopped");
        result
    }

    #[instrument(skip(self))]
    async fn stop(&self) {
        info!("Stopping scheduler loop");
        self.shutdown.trigger();
    }

    #[instrument(skip(self))]
    async fn run_cycle(&self) -> Result<CycleOutcome, SchedulerError> {
        self.set_state(LoopState::AwaitingReadiness);
        if !self.gate.is_ready() {
            info!("Transport not ready, waiting");
        }
        self.gate.wait_ready().await?;

        self.set_state(LoopState::AwaitingResponse);
        let reading = self.sensor.sample();
        telemetry::record_reading(reading.value);
        debug!(
            value = reading.value,
            taken_at = %reading.taken_at,
            "Generated reading"
        );

        let request =
            PublishRequest::metric(&self.config.command, &self.config.metric_name, reading);

        let started = Instant::now();
        let result = self.publish(&request).await;
        Ok(self.record_outcome(result, started.elapsed()))
    }
}
