// AI engine models: predictions, anomalies, model status

use serde::{Deserialize, Serialize};

use super::ConnectionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `low` above 0.9, `medium` above 0.8, otherwise `high`.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.9 {
            RiskLevel::Low
        } else if confidence > 0.8 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub estimated_impact: f64,
    pub recommended_action: String,
    pub timeframe: String,
}

/// Simulated predictions are typed; a live engine's payload is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionPayload {
    Assessment(RiskAssessment),
    Upstream(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Always within [0, 1].
    pub confidence: f64,
    pub prediction: PredictionPayload,
    pub produced_at: u64,
    pub mode: ConnectionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    pub index: usize,
    pub severity: Severity,
    pub description: String,
    #[serde(default, alias = "timestamp")]
    pub detected_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetectionStatus {
    pub active: bool,
    pub anomalies_detected: usize,
    pub last_scan: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Loaded,
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub state: ModelState,
    pub version: String,
    pub last_update: u64,
    /// Provenance of the most recent load.
    pub mode: ConnectionMode,
}
