// Aggregated health, log feed and transmission metrics

use serde::{Deserialize, Serialize};

use super::SensorReading;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub sensors: f64,
    pub apis: f64,
    pub ai_engine: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    /// Unweighted mean of the component scores, 0-100.
    pub overall: f64,
    pub components: ComponentHealth,
    pub computed_at: u64,
}

/// Pass/fail per component at the > 90 threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub sensors: bool,
    pub apis: bool,
    pub ai_engine: bool,
    pub overall: bool,
}

impl HealthCheck {
    pub const THRESHOLD: f64 = 90.0;

    pub fn from_health(health: &SystemHealth) -> Self {
        Self {
            sensors: health.components.sensors > Self::THRESHOLD,
            apis: health.components.apis > Self::THRESHOLD,
            ai_engine: health.components.ai_engine > Self::THRESHOLD,
            overall: health.overall > Self::THRESHOLD,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.sensors && self.apis && self.ai_engine && self.overall
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLogEntry {
    /// Local wall-clock time, "[HH:MM:SS]".
    pub timestamp: String,
    pub message: String,
    pub level: LogLevel,
    /// Unix ms when recorded; drives retention.
    #[serde(skip)]
    pub recorded_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransmission {
    pub packets_per_second: i64,
    /// Percent, 85-100.
    pub signal_strength: f64,
    /// Percent, non-decreasing, saturates at 100.
    pub system_uptime: f64,
    pub last_sync: u64,
}

impl Default for DataTransmission {
    fn default() -> Self {
        Self {
            packets_per_second: 342,
            signal_strength: 94.0,
            system_uptime: 99.8,
            last_sync: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSettings {
    pub data_stream_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub health_check_interval_ms: u64,
    pub notification_feed_interval_ms: u64,
    pub log_retention_hours: u64,
    pub enable_real_time_sync: bool,
    pub enable_data_caching: bool,
}

/// One data-stream tick as pushed to /ws/telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryFrame {
    pub timestamp: u64,
    pub sensors: Vec<SensorReading>,
    pub transmission: DataTransmission,
    pub health: SystemHealth,
}
