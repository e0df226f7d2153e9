// Domain models shared by the gateways, the aggregator and the HTTP surface

mod ai;
mod api;
mod mode;
mod monitoring;
mod sensor;

pub use ai::{
    AnomalyDetectionStatus, AnomalyRecord, ModelState, ModelStatus, PredictionPayload,
    PredictionResult, RiskAssessment, RiskLevel, Severity,
};
pub use api::{ApiStatus, Dependency, Forecast, UnknownDependency, WeatherReport};
pub use mode::{ConnectionMode, Sourced};
pub use monitoring::{
    ComponentHealth, DataTransmission, HealthCheck, LogLevel, MonitoringSettings, SystemHealth,
    SystemLogEntry, TelemetryFrame,
};
pub use sensor::{SensorChannel, SensorReading, SensorSnapshot};

/// Milliseconds since the Unix epoch; 0 if the system clock is before the epoch.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
