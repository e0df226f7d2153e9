// AI gateway: predictions, anomaly scans and model loading against an optional engine.

use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::AiEngineConfig;
use crate::error::Degraded;
use crate::models::{
    AnomalyDetectionStatus, AnomalyRecord, ConnectionMode, ModelState, ModelStatus,
    PredictionPayload, PredictionResult, RiskAssessment, RiskLevel, Severity, Sourced, now_millis,
};
use crate::simulation::{BoundedWalk, new_rng};
use crate::upstream::Upstream;

const MODEL_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
const SIMULATED_MODEL_LOAD_DELAY: Duration = Duration::from_secs(1);
/// Per-point probability that the simulated scan flags an anomaly.
const ANOMALY_PROBABILITY: f64 = 0.05;
const ANOMALY_DESCRIPTION: &str = "Unusual pattern detected";

#[derive(Debug, Deserialize)]
struct EnginePrediction {
    confidence: f64,
    #[serde(default)]
    prediction: Value,
}

#[derive(Debug, Deserialize)]
struct EngineAnomalies {
    anomalies: Vec<AnomalyRecord>,
}

struct AiState {
    rng: StdRng,
    model: ModelStatus,
    /// Dashboard confidence gauge, percent.
    confidence: BoundedWalk,
    anomaly: AnomalyDetectionStatus,
}

pub struct AiGateway {
    upstream: Upstream,
    model_version: String,
    confidence_threshold: f64,
    anomaly_detection_enabled: bool,
    state: Mutex<AiState>,
}

impl AiGateway {
    pub fn new(upstream: Upstream, config: &AiEngineConfig) -> Self {
        Self::build(upstream, config, None)
    }

    /// Deterministic simulation for tests.
    pub fn with_seed(upstream: Upstream, config: &AiEngineConfig, seed: u64) -> Self {
        Self::build(upstream, config, Some(seed))
    }

    fn build(upstream: Upstream, config: &AiEngineConfig, seed: Option<u64>) -> Self {
        let now = now_millis();
        let state = AiState {
            rng: new_rng(seed),
            model: ModelStatus {
                state: ModelState::Loaded,
                version: config.model_version.clone(),
                last_update: now,
                mode: upstream.mode(),
            },
            confidence: BoundedWalk::new(87.3, 80.0, 95.0, 2.0),
            anomaly: AnomalyDetectionStatus {
                active: config.anomaly_detection_enabled,
                anomalies_detected: 0,
                last_scan: now,
            },
        };
        Self {
            upstream,
            model_version: config.model_version.clone(),
            confidence_threshold: config.confidence_threshold,
            anomaly_detection_enabled: config.anomaly_detection_enabled,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.upstream.mode()
    }

    pub fn model_status(&self) -> ModelStatus {
        self.lock().model.clone()
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn anomaly_detection_enabled(&self) -> bool {
        self.anomaly_detection_enabled
    }

    /// Dashboard confidence gauge in percent, within [80, 95].
    pub fn confidence(&self) -> f64 {
        self.lock().confidence.value()
    }

    /// Nudge the gauge by up to one point either way; independent of predictions.
    pub fn update_confidence(&self) -> f64 {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.confidence.advance(&mut state.rng)
    }

    pub fn anomaly_status(&self) -> AnomalyDetectionStatus {
        self.lock().anomaly
    }

    #[instrument(skip(self, input), fields(gateway = "ai", operation = "run_prediction"))]
    pub async fn run_prediction(&self, input: &Value) -> Sourced<PredictionResult> {
        let result = self
            .upstream
            .post_json::<_, EnginePrediction>("/predict", input, None)
            .await
            .and_then(|p| {
                if (0.0..=1.0).contains(&p.confidence) {
                    Ok(p)
                } else {
                    Err(Degraded::Malformed(format!(
                        "confidence {} outside [0, 1]",
                        p.confidence
                    )))
                }
            });
        match result {
            Ok(p) => Sourced::connected(PredictionResult {
                confidence: p.confidence,
                prediction: PredictionPayload::Upstream(p.prediction),
                produced_at: now_millis(),
                mode: ConnectionMode::Connected,
            }),
            Err(reason) => {
                if reason.is_failure() {
                    warn!(error = %reason, "Prediction engine unavailable, using simulated prediction");
                }
                Sourced::simulated(self.simulated_prediction(), reason)
            }
        }
    }

    fn simulated_prediction(&self) -> PredictionResult {
        let mut state = self.lock();
        let rng = &mut state.rng;
        let confidence = rng.gen_range(0.80..0.95);
        PredictionResult {
            confidence,
            prediction: PredictionPayload::Assessment(RiskAssessment {
                risk_level: RiskLevel::from_confidence(confidence),
                estimated_impact: rng.gen_range(0.0..100.0),
                recommended_action: "Monitor and assess".into(),
                timeframe: "24-48 hours".into(),
            }),
            produced_at: now_millis(),
            mode: ConnectionMode::Simulated,
        }
    }

    /// Scan a batch. Updates the running anomaly count and last-scan time on either path.
    #[instrument(skip(self, points), fields(gateway = "ai", operation = "detect_anomalies", points = points.len()))]
    pub async fn detect_anomalies(&self, points: &[Value]) -> Sourced<Vec<AnomalyRecord>> {
        let result = self
            .upstream
            .post_json::<_, EngineAnomalies>("/anomaly-detection", &json!({ "data": points }), None)
            .await;
        let outcome = match result {
            Ok(found) => {
                let now = now_millis();
                let anomalies = found
                    .anomalies
                    .into_iter()
                    .map(|mut a| {
                        if a.detected_at == 0 {
                            a.detected_at = now;
                        }
                        a
                    })
                    .collect();
                Sourced::connected(anomalies)
            }
            Err(reason) => {
                if reason.is_failure() {
                    warn!(error = %reason, "Anomaly detection unavailable, using simulated detection");
                }
                Sourced::simulated(self.simulated_anomalies(points.len()), reason)
            }
        };

        let mut state = self.lock();
        state.anomaly.anomalies_detected = outcome.value.len();
        state.anomaly.last_scan = now_millis();
        debug!(anomalies = outcome.value.len(), "Anomaly scan complete");
        outcome
    }

    fn simulated_anomalies(&self, count: usize) -> Vec<AnomalyRecord> {
        let mut state = self.lock();
        let rng = &mut state.rng;
        let now = now_millis();
        let mut anomalies = Vec::new();
        for index in 0..count {
            if rng.gen_bool(ANOMALY_PROBABILITY) {
                anomalies.push(AnomalyRecord {
                    index,
                    severity: Severity::ALL[rng.gen_range(0..Severity::ALL.len())],
                    description: ANOMALY_DESCRIPTION.into(),
                    detected_at: now,
                });
            }
        }
        anomalies
    }

    /// Always reports `true`. A failed live load falls back to a simulated one; the
    /// `degraded` reason is the only trace of that failure.
    #[instrument(skip(self), fields(gateway = "ai", operation = "load_model", version = %self.model_version))]
    pub async fn load_model(&self) -> Sourced<bool> {
        self.lock().model.state = ModelState::Loading;

        let result = self
            .upstream
            .post_for_status(
                "/model/load",
                &json!({ "version": self.model_version }),
                Some(MODEL_LOAD_TIMEOUT),
            )
            .await
            .and_then(|status| {
                if status.is_success() {
                    Ok(())
                } else {
                    Err(Degraded::Status(status.as_u16()))
                }
            });

        let outcome = match result {
            Ok(()) => Sourced::connected(true),
            Err(reason) => {
                if reason.is_failure() {
                    warn!(error = %reason, "Model loading failed, using simulated model");
                }
                tokio::time::sleep(SIMULATED_MODEL_LOAD_DELAY).await;
                Sourced::simulated(true, reason)
            }
        };

        let mut state = self.lock();
        state.model.state = ModelState::Loaded;
        state.model.last_update = now_millis();
        state.model.mode = outcome.mode;
        info!(mode = %outcome.mode, "Model loaded");
        outcome
    }
}
