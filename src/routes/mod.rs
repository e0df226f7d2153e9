// HTTP + WebSocket routes over the service layer

mod http;
mod ws;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::models::TelemetryFrame;
use crate::services::Services;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) services: Services,
    pub(crate) telemetry_tx: broadcast::Sender<TelemetryFrame>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    services: Services,
    telemetry_tx: broadcast::Sender<TelemetryFrame>,
    ws_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        services,
        telemetry_tx,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "AquaPercent operations backend" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/sensors", get(http::sensors_handler)) // GET /api/sensors
        .route("/api/sensors/current", get(http::current_readings_handler)) // GET /api/sensors/current
        .route("/api/apis", get(http::api_statuses_handler)) // GET /api/apis
        .route("/api/apis/{key}/health", post(http::api_health_handler)) // POST /api/apis/{key}/health
        .route("/api/weather", get(http::weather_handler)) // GET /api/weather?location=
        .route("/api/notifications", post(http::notification_handler)) // POST /api/notifications
        .route("/api/ai/status", get(http::ai_status_handler)) // GET /api/ai/status
        .route("/api/ai/predict", post(http::predict_handler)) // POST /api/ai/predict
        .route("/api/ai/anomalies", post(http::anomalies_handler)) // POST /api/ai/anomalies
        .route("/api/ai/model/load", post(http::load_model_handler)) // POST /api/ai/model/load
        .route("/api/health", get(http::health_handler)) // GET /api/health
        .route("/api/health/check", get(http::health_check_handler)) // GET /api/health/check
        .route("/api/logs", get(http::logs_handler)) // GET /api/logs?limit=
        .route("/api/transmission", get(http::transmission_handler)) // GET /api/transmission
        .route("/api/settings", get(http::settings_handler)) // GET /api/settings
        .route(
            "/api/inbox",
            get(http::inbox_handler)
                .post(http::add_inbox_handler)
                .delete(http::clear_inbox_handler),
        ) // GET, POST, DELETE /api/inbox
        .route("/api/inbox/read-all", post(http::mark_all_read_handler)) // POST /api/inbox/read-all
        .route("/api/inbox/{id}/read", post(http::mark_read_handler)) // POST /api/inbox/{id}/read
        .route("/api/inbox/{id}", delete(http::clear_notification_handler)) // DELETE /api/inbox/{id}
        .route("/ws/telemetry", get(ws::ws_telemetry)) // WS /ws/telemetry
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
