// Background ticker: drives the periodic operations the dashboard polls for.
// Data-stream ticks publish telemetry frames; heartbeat ticks nudge simulated gauges;
// health-check ticks call every external dependency in a task of their own.

use futures_util::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

use crate::config::AppConfig;
use crate::models::{Dependency, HealthCheck, LogLevel, TelemetryFrame, now_millis};
use crate::services::Services;

/// Rate limit for the "no receivers" message (avoid logging every tick when no one is on /ws/telemetry)
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);
const STATS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Services, channel, and shutdown for the worker.
pub struct WorkerDeps {
    pub services: Services,
    pub tx: broadcast::Sender<TelemetryFrame>,
    /// Open /ws/telemetry connections, maintained by the WS handler.
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Tick intervals. All must be non-zero (config validation guarantees it).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub data_stream_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub health_check_interval_ms: u64,
    pub notification_feed_interval_ms: u64,
    /// Publish frames to /ws/telemetry; when false, data-stream ticks still advance the gauges.
    pub real_time_sync: bool,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            data_stream_interval_ms: config.monitoring.data_stream_interval_ms,
            heartbeat_interval_ms: config.monitoring.heartbeat_interval_ms,
            health_check_interval_ms: config.monitoring.health_check_interval_ms,
            notification_feed_interval_ms: config.monitoring.notification_feed_interval_ms,
            real_time_sync: config.monitoring.enable_real_time_sync,
        }
    }
}

/// One data-stream tick: sensors, transmission metrics, health.
pub async fn data_stream_tick(services: &Services) -> TelemetryFrame {
    let sensors = services.sensors.fetch_readings().await.into_value();
    let transmission = services.monitoring.tick_transmission();
    let health = services.monitoring.system_health();
    TelemetryFrame {
        timestamp: now_millis(),
        sensors,
        transmission,
        health,
    }
}

/// One heartbeat tick: drift latencies and confidence, add a log line.
pub fn heartbeat_tick(services: &Services) {
    services.apis.drift_response_times();
    services.ai.update_confidence();
    services.monitoring.generate_random_log();
}

/// Check every dependency concurrently, then log any component that fails the health threshold.
/// Takes at most the slowest endpoint's deadline.
pub async fn health_check_tick(services: &Services) -> HealthCheck {
    join_all(
        Dependency::ALL
            .into_iter()
            .map(|dep| services.apis.check_health(dep)),
    )
    .await;
    let check = services.monitoring.perform_health_check();
    if !check.all_passed() {
        let failing: Vec<&str> = [
            ("sensors", check.sensors),
            ("apis", check.apis),
            ("aiEngine", check.ai_engine),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect();
        tracing::warn!(failing = ?failing, "Health check below threshold");
        services.monitoring.add_log(
            format!("Health check failed: {}", failing.join(", ")),
            LogLevel::Warning,
        );
    }
    check
}

/// One inbox feed tick: maybe add a canned notification.
pub fn notification_feed_tick(services: &Services) {
    if let Some(n) = services.notifications.simulate_feed_tick() {
        tracing::debug!(operation = "notification_feed", id = %n.id, title = %n.title, "Notification added");
    }
}

fn spawn_health_check(services: &Services) -> JoinHandle<()> {
    let services = services.clone();
    tokio::spawn(
        async move {
            let check = health_check_tick(&services).await;
            tracing::debug!(operation = "health_check", overall = check.overall, "Health check complete");
        }
        .in_current_span(),
    )
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> JoinHandle<()> {
    let WorkerDeps {
        services,
        tx,
        ws_connections,
        mut shutdown_rx,
    } = deps;

    let worker_span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        data_stream_interval_ms = config.data_stream_interval_ms
    );

    let task = async move {
        let mut stream_tick = interval(Duration::from_millis(config.data_stream_interval_ms));
        stream_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut heartbeat = interval(Duration::from_millis(config.heartbeat_interval_ms));
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut health_tick = interval(Duration::from_millis(config.health_check_interval_ms));
        health_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut feed_tick = interval(Duration::from_millis(config.notification_feed_interval_ms));
        feed_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of an interval fires immediately; skip it for the inbox feed.
        feed_tick.reset();
        let mut stats_log_tick = interval(STATS_LOG_INTERVAL);
        stats_log_tick.reset();

        let mut last_no_receivers_log: Option<Instant> = None;
        let mut frames_published_total: u64 = 0;
        let mut health_task: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                _ = stream_tick.tick() => {
                    let frame = data_stream_tick(&services).await;
                    if !config.real_time_sync {
                        continue;
                    }
                    if tx.send(frame).is_ok() {
                        frames_published_total += 1;
                    } else {
                        let should_log = last_no_receivers_log
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL);
                        if should_log {
                            tracing::debug!(
                                operation = "broadcast_frame",
                                ws_telemetry_clients = ws_connections.load(Ordering::Relaxed),
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_log = Some(Instant::now());
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    heartbeat_tick(&services);
                }
                _ = health_tick.tick() => {
                    if health_task.as_ref().is_some_and(|h| !h.is_finished()) {
                        tracing::debug!(operation = "health_check", "Previous health check still running; tick skipped");
                    } else {
                        health_task = Some(spawn_health_check(&services));
                    }
                }
                _ = feed_tick.tick() => {
                    notification_feed_tick(&services);
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_telemetry_clients = ws_connections.load(Ordering::Relaxed),
                        frames_published_total,
                        unread_notifications = services.notifications.unread_count(),
                        "app stats"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    if let Some(task) = health_task.take() {
                        task.abort();
                    }
                    break;
                }
            }
        }
    };
    tokio::spawn(task.instrument(worker_span))
}
