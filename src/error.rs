// Why a gateway call was served from simulation instead of its upstream.

use serde::Serialize;
use thiserror::Error;

/// Reason an upstream result was replaced by simulated data.
///
/// Never returned to callers as a failure: gateways carry it inside
/// [`crate::models::Sourced`] next to the substituted value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum Degraded {
    /// No URL configured; simulation is the intended mode.
    #[error("endpoint not configured")]
    NotConfigured,

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection refused, DNS failure, TLS error and similar.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Body was not the JSON shape we expect.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl Degraded {
    /// Whether this represents a real failure (as opposed to simulation by configuration).
    pub fn is_failure(&self) -> bool {
        !matches!(self, Degraded::NotConfigured)
    }
}
