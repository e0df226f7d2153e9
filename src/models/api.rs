// External dependency status and payload models

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::ConnectionMode;

/// External services the API gateway tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    Weather,
    Map,
    Prediction,
    Notification,
}

impl Dependency {
    pub const ALL: [Dependency; 4] = [
        Dependency::Weather,
        Dependency::Map,
        Dependency::Prediction,
        Dependency::Notification,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dependency::Weather => "weather",
            Dependency::Map => "map",
            Dependency::Prediction => "prediction",
            Dependency::Notification => "notification",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Dependency::Weather => "Weather API",
            Dependency::Map => "Map API",
            Dependency::Prediction => "Prediction Engine API",
            Dependency::Notification => "Notification API",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown API: {0}")]
pub struct UnknownDependency(pub String);

impl FromStr for Dependency {
    type Err = UnknownDependency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dependency::ALL
            .into_iter()
            .find(|d| d.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDependency(s.to_string()))
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    pub name: String,
    pub mode: ConnectionMode,
    pub response_time_ms: u64,
    pub syncing: bool,
    pub last_checked: u64,
    /// Consecutive failed health probes; telemetry only.
    #[serde(default)]
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Forecast {
    Sunny,
    Cloudy,
    Rainy,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Millimetres.
    #[serde(default)]
    pub precipitation: f64,
    pub forecast: Forecast,
}
