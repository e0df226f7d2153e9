// JSON handlers: thin adapters over the gateways and the aggregator

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::Ordering;

use super::AppState;
use crate::models::{
    AnomalyDetectionStatus, ConnectionMode, Dependency, ModelStatus, MonitoringSettings,
};
use crate::monitoring::MAX_LOG_ENTRIES;
use crate::notifications::{NewNotification, Notification};
use crate::version::{NAME, VERSION};

const DEFAULT_LOG_LIMIT: usize = 10;
const DEFAULT_WEATHER_LOCATION: &str = "local";

/// GET /version: service name and version from Cargo.toml at build time.
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

pub(super) async fn sensors_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.sensors.fetch_readings().await)
}

pub(super) async fn current_readings_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.sensors.current_readings())
}

pub(super) async fn api_statuses_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.apis.list_statuses())
}

/// POST /api/apis/{key}/health. Unknown keys get a 404.
pub(super) async fn api_health_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match key.parse::<Dependency>() {
        Ok(dep) => Json(state.services.apis.check_health(dep).await).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct WeatherQuery {
    location: Option<String>,
}

pub(super) async fn weather_handler(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> impl IntoResponse {
    let location = query
        .location
        .unwrap_or_else(|| DEFAULT_WEATHER_LOCATION.to_string());
    Json(state.services.apis.fetch_weather(&location).await)
}

#[derive(Debug, Deserialize)]
pub(super) struct NotificationRequest {
    message: String,
    #[serde(rename = "type", default = "default_notification_kind")]
    kind: String,
}

fn default_notification_kind() -> String {
    "info".into()
}

pub(super) async fn notification_handler(
    State(state): State<AppState>,
    Json(req): Json<NotificationRequest>,
) -> impl IntoResponse {
    Json(
        state
            .services
            .apis
            .send_notification(&req.message, &req.kind)
            .await,
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AiStatusResponse {
    mode: ConnectionMode,
    model: ModelStatus,
    /// Percent.
    confidence: f64,
    confidence_threshold: f64,
    anomaly_detection: AnomalyDetectionStatus,
}

pub(super) async fn ai_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ai = &state.services.ai;
    Json(AiStatusResponse {
        mode: ai.connection_mode(),
        model: ai.model_status(),
        confidence: ai.confidence(),
        confidence_threshold: ai.confidence_threshold(),
        anomaly_detection: ai.anomaly_status(),
    })
}

pub(super) async fn predict_handler(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> impl IntoResponse {
    Json(state.services.ai.run_prediction(&input).await)
}

#[derive(Debug, Deserialize)]
pub(super) struct AnomalyRequest {
    #[serde(default)]
    data: Vec<Value>,
}

pub(super) async fn anomalies_handler(
    State(state): State<AppState>,
    Json(req): Json<AnomalyRequest>,
) -> impl IntoResponse {
    Json(state.services.ai.detect_anomalies(&req.data).await)
}

pub(super) async fn load_model_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.ai.load_model().await)
}

pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.monitoring.system_health())
}

pub(super) async fn health_check_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.monitoring.perform_health_check())
}

#[derive(Debug, Deserialize)]
pub(super) struct LogsQuery {
    limit: Option<usize>,
}

pub(super) async fn logs_handler(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .min(MAX_LOG_ENTRIES);
    Json(state.services.monitoring.logs(limit))
}

pub(super) async fn transmission_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.monitoring.transmission())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsResponse {
    #[serde(flatten)]
    monitoring: MonitoringSettings,
    sensor_polling_interval_ms: u64,
    uptime_secs: u64,
    ws_clients: usize,
}

pub(super) async fn settings_handler(State(state): State<AppState>) -> impl IntoResponse {
    let services = &state.services;
    Json(SettingsResponse {
        monitoring: services.monitoring.settings(),
        sensor_polling_interval_ms: services.sensors.polling_interval().as_millis() as u64,
        uptime_secs: services.monitoring.uptime().as_secs(),
        ws_clients: state.ws_connections.load(Ordering::Relaxed),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InboxResponse {
    notifications: Vec<Notification>,
    unread_count: usize,
}

fn not_found(what: &str, id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("unknown {}: {}", what, id) })),
    )
        .into_response()
}

pub(super) async fn inbox_handler(State(state): State<AppState>) -> impl IntoResponse {
    let inbox = &state.services.notifications;
    Json(InboxResponse {
        notifications: inbox.list(),
        unread_count: inbox.unread_count(),
    })
}

pub(super) async fn add_inbox_handler(
    State(state): State<AppState>,
    Json(new): Json<NewNotification>,
) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(state.services.notifications.add(new)),
    )
}

/// POST /api/inbox/{id}/read. 404 if the id is not in the inbox.
pub(super) async fn mark_read_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.services.notifications.mark_as_read(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found("notification", &id)
    }
}

pub(super) async fn mark_all_read_handler(State(state): State<AppState>) -> impl IntoResponse {
    let updated = state.services.notifications.mark_all_as_read();
    Json(serde_json::json!({ "updated": updated }))
}

pub(super) async fn clear_notification_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.services.notifications.clear(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found("notification", &id)
    }
}

pub(super) async fn clear_inbox_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cleared = state.services.notifications.clear_all();
    Json(serde_json::json!({ "cleared": cleared }))
}
