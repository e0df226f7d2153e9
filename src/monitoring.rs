// Monitoring aggregator: system health over the three gateways, a bounded log ring and transmission metrics.

use chrono::{DateTime, Local};
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::ai_gateway::AiGateway;
use crate::api_gateway::ApiGateway;
use crate::config::MonitoringConfig;
use crate::models::{
    ComponentHealth, ConnectionMode, DataTransmission, HealthCheck, LogLevel, MonitoringSettings,
    SystemHealth, SystemLogEntry, now_millis,
};
use crate::sensor_gateway::SensorGateway;
use crate::simulation::{new_rng, step_clamped_i64};

/// Log ring capacity; the oldest entries are dropped first.
pub const MAX_LOG_ENTRIES: usize = 100;

const UPTIME_INCREMENT: f64 = 0.001;

const INITIAL_LOGS: [&str; 4] = [
    "System initialized",
    "Prediction model loaded",
    "Weather API connected",
    "Sensor data synchronized",
];

const HEARTBEAT_MESSAGES: [&str; 10] = [
    "Data packet received",
    "Sensor calibration complete",
    "AI model prediction updated",
    "System health check passed",
    "Cache synchronized",
    "Anomaly detection scan complete",
    "Weather data refreshed",
    "Pipeline status updated",
    "Notification sent successfully",
    "Backup completed",
];

struct MonitorState {
    rng: StdRng,
    /// Newest first.
    logs: VecDeque<SystemLogEntry>,
    transmission: DataTransmission,
}

pub struct MonitoringAggregator {
    sensors: Arc<SensorGateway>,
    apis: Arc<ApiGateway>,
    ai: Arc<AiGateway>,
    settings: MonitoringSettings,
    retention: Duration,
    started_at: Instant,
    state: Mutex<MonitorState>,
}

impl MonitoringAggregator {
    pub fn new(
        sensors: Arc<SensorGateway>,
        apis: Arc<ApiGateway>,
        ai: Arc<AiGateway>,
        config: &MonitoringConfig,
    ) -> Self {
        Self::build(sensors, apis, ai, config, None)
    }

    /// Deterministic simulation for tests.
    pub fn with_seed(
        sensors: Arc<SensorGateway>,
        apis: Arc<ApiGateway>,
        ai: Arc<AiGateway>,
        config: &MonitoringConfig,
        seed: u64,
    ) -> Self {
        Self::build(sensors, apis, ai, config, Some(seed))
    }

    fn build(
        sensors: Arc<SensorGateway>,
        apis: Arc<ApiGateway>,
        ai: Arc<AiGateway>,
        config: &MonitoringConfig,
        seed: Option<u64>,
    ) -> Self {
        let aggregator = Self {
            sensors,
            apis,
            ai,
            settings: MonitoringSettings {
                data_stream_interval_ms: config.data_stream_interval_ms,
                heartbeat_interval_ms: config.heartbeat_interval_ms,
                health_check_interval_ms: config.health_check_interval_ms,
                notification_feed_interval_ms: config.notification_feed_interval_ms,
                log_retention_hours: config.log_retention_hours,
                enable_real_time_sync: config.enable_real_time_sync,
                enable_data_caching: config.enable_data_caching,
            },
            retention: Duration::from_secs(config.log_retention_hours.saturating_mul(3600)),
            started_at: Instant::now(),
            state: Mutex::new(MonitorState {
                rng: new_rng(seed),
                logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
                transmission: DataTransmission {
                    last_sync: now_millis(),
                    ..DataTransmission::default()
                },
            }),
        };
        for message in INITIAL_LOGS {
            aggregator.add_log(message, LogLevel::Info);
        }
        aggregator
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 100 per connected component, 95 per simulated one; overall is the plain mean.
    #[instrument(skip(self), fields(operation = "system_health"))]
    pub fn system_health(&self) -> SystemHealth {
        let sensors = self.sensors.connection_mode().health_score();
        let apis = ConnectionMode::from_configured(self.apis.all_connected()).health_score();
        let ai_engine = self.ai.connection_mode().health_score();
        let overall = (sensors + apis + ai_engine) / 3.0;
        debug!(overall, sensors, apis, ai_engine, "System health computed");
        SystemHealth {
            overall,
            components: ComponentHealth {
                sensors,
                apis,
                ai_engine,
            },
            computed_at: now_millis(),
        }
    }

    pub fn perform_health_check(&self) -> HealthCheck {
        HealthCheck::from_health(&self.system_health())
    }

    pub fn add_log(&self, message: impl Into<String>, level: LogLevel) {
        self.add_log_at(message.into(), level, Local::now());
    }

    fn add_log_at(&self, message: String, level: LogLevel, at: DateTime<Local>) {
        let recorded_at = at.timestamp_millis().max(0) as u64;
        let mut state = self.lock();
        state.logs.push_front(SystemLogEntry {
            timestamp: format!("[{}]", at.format("%H:%M:%S")),
            message,
            level,
            recorded_at,
        });
        state.logs.truncate(MAX_LOG_ENTRIES);
        evict_expired(&mut state.logs, now_millis(), self.retention);
    }

    /// Newest `limit` entries, newest first.
    pub fn logs(&self, limit: usize) -> Vec<SystemLogEntry> {
        let mut state = self.lock();
        evict_expired(&mut state.logs, now_millis(), self.retention);
        state.logs.iter().take(limit).cloned().collect()
    }

    pub fn log_count(&self) -> usize {
        self.lock().logs.len()
    }

    /// Append one of the canned heartbeat messages at info level.
    pub fn generate_random_log(&self) -> &'static str {
        let message = {
            let mut state = self.lock();
            HEARTBEAT_MESSAGES[state.rng.gen_range(0..HEARTBEAT_MESSAGES.len())]
        };
        self.add_log(message, LogLevel::Info);
        message
    }

    pub fn transmission(&self) -> DataTransmission {
        self.lock().transmission
    }

    /// Advance packets/s in [300, 400], signal in [85, 100], uptime toward 100; stamp the sync.
    pub fn tick_transmission(&self) -> DataTransmission {
        let mut guard = self.lock();
        let state = &mut *guard;
        let t = &mut state.transmission;
        t.packets_per_second = step_clamped_i64(&mut state.rng, t.packets_per_second, 20, 300, 400);
        let signal_change = (state.rng.r#gen::<f64>() - 0.5) * 2.0;
        t.signal_strength = (t.signal_strength + signal_change).clamp(85.0, 100.0);
        t.system_uptime = (t.system_uptime + UPTIME_INCREMENT).min(100.0);
        t.last_sync = now_millis();
        *t
    }

    /// Wall-clock time since the aggregator was built.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn uptime_percentage(&self) -> f64 {
        self.lock().transmission.system_uptime
    }

    pub fn settings(&self) -> MonitoringSettings {
        self.settings
    }
}

/// Drop entries recorded before `now - retention`, wherever they sit in the ring.
/// The wall clock can step backwards, so order is not assumed.
fn evict_expired(logs: &mut VecDeque<SystemLogEntry>, now: u64, retention: Duration) {
    let cutoff = now.saturating_sub(retention.as_millis() as u64);
    logs.retain(|e| e.recorded_at >= cutoff);
}
