// Connected vs simulated provenance

use serde::{Deserialize, Serialize};

use crate::error::Degraded;

/// Serializes to "connected" / "simulated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    Connected,
    Simulated,
}

impl ConnectionMode {
    /// Mode implied by configuration alone.
    pub fn from_configured(configured: bool) -> Self {
        if configured {
            ConnectionMode::Connected
        } else {
            ConnectionMode::Simulated
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionMode::Connected
    }

    /// Component health score: simulated is "healthy but degraded".
    pub fn health_score(self) -> f64 {
        match self {
            ConnectionMode::Connected => 100.0,
            ConnectionMode::Simulated => 95.0,
        }
    }
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionMode::Connected => write!(f, "connected"),
            ConnectionMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// A value together with where it came from.
///
/// `degraded` is `Some` whenever `mode` is simulated, and says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sourced<T> {
    pub value: T,
    pub mode: ConnectionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<Degraded>,
}

impl<T> Sourced<T> {
    pub fn connected(value: T) -> Self {
        Self {
            value,
            mode: ConnectionMode::Connected,
            degraded: None,
        }
    }

    pub fn simulated(value: T, reason: Degraded) -> Self {
        Self {
            value,
            mode: ConnectionMode::Simulated,
            degraded: Some(reason),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.mode.is_connected()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
