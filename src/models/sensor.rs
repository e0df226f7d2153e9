// Sensor channels and readings

use serde::{Deserialize, Serialize};

use super::ConnectionMode;

/// The four instrument channels the gateway always reports, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorChannel {
    Pressure,
    Flow,
    SoilMoisture,
    LeakDetection,
}

impl SensorChannel {
    pub const ALL: [SensorChannel; 4] = [
        SensorChannel::Pressure,
        SensorChannel::Flow,
        SensorChannel::SoilMoisture,
        SensorChannel::LeakDetection,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SensorChannel::Pressure => "sensor_pressure_01",
            SensorChannel::Flow => "sensor_flow_01",
            SensorChannel::SoilMoisture => "sensor_soil_01",
            SensorChannel::LeakDetection => "sensor_leak_01",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SensorChannel::Pressure => "Pressure Sensor",
            SensorChannel::Flow => "Flow Sensor",
            SensorChannel::SoilMoisture => "Soil Moisture Sensor",
            SensorChannel::LeakDetection => "Leak Detection Module",
        }
    }

    /// Nominal sampling rate shown on the dashboard.
    pub fn rate(self) -> &'static str {
        match self {
            SensorChannel::Pressure => "120 Hz",
            SensorChannel::Flow => "60 Hz",
            SensorChannel::SoilMoisture => "30 Hz",
            SensorChannel::LeakDetection => "240 Hz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub id: String,
    pub name: String,
    pub mode: ConnectionMode,
    pub rate: String,
    /// Display string such as "0.3s ago".
    pub last_update: String,
    pub value: f64,
    pub captured_at: u64,
}

/// Current simulated channel values, read without advancing the walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub pressure: f64,
    pub flow: f64,
    pub soil_moisture: f64,
    pub leak_detection: f64,
}
