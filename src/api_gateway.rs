// External API gateway: health, weather and notifications for four dependencies, each live or simulated.

use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument, warn};

use crate::config::{ApiConfig, EndpointConfig};
use crate::error::Degraded;
use crate::models::{
    ApiStatus, ConnectionMode, Dependency, Forecast, Sourced, WeatherReport, now_millis,
};
use crate::simulation::new_rng;
use crate::upstream::Upstream;

/// Simulated latency range, ms.
const SIMULATED_LATENCY_MS: std::ops::Range<u64> = 20..80;
/// Floor and (simulated) ceiling for drifting latencies.
const MIN_LATENCY_MS: i64 = 10;
const MAX_SIMULATED_LATENCY_MS: i64 = 100;

#[derive(Serialize)]
struct NotificationBody<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

struct ApiState {
    rng: StdRng,
    statuses: BTreeMap<Dependency, ApiStatus>,
}

impl ApiState {
    fn random_latency(&mut self) -> u64 {
        self.rng.gen_range(SIMULATED_LATENCY_MS)
    }
}

pub struct ApiGateway {
    upstreams: BTreeMap<Dependency, Upstream>,
    max_retry_attempts: u32,
    state: Mutex<ApiState>,
}

impl ApiGateway {
    pub fn new(client: reqwest::Client, config: &ApiConfig, max_retry_attempts: u32) -> Self {
        Self::build(client, config, max_retry_attempts, None)
    }

    /// Deterministic simulation for tests.
    pub fn with_seed(
        client: reqwest::Client,
        config: &ApiConfig,
        max_retry_attempts: u32,
        seed: u64,
    ) -> Self {
        Self::build(client, config, max_retry_attempts, Some(seed))
    }

    fn build(
        client: reqwest::Client,
        config: &ApiConfig,
        max_retry_attempts: u32,
        seed: Option<u64>,
    ) -> Self {
        let upstreams: BTreeMap<Dependency, Upstream> = Dependency::ALL
            .into_iter()
            .map(|dep| {
                let endpoint = match dep {
                    Dependency::Weather => &config.weather,
                    Dependency::Map => &config.map,
                    Dependency::Prediction => &config.prediction,
                    Dependency::Notification => &config.notification,
                };
                let endpoint = EndpointConfig {
                    timeout_ms: if endpoint.timeout_ms == 0 {
                        config.timeout_ms
                    } else {
                        endpoint.timeout_ms
                    },
                    ..endpoint.clone()
                };
                (dep, Upstream::new(client.clone(), &endpoint))
            })
            .collect();

        let mut state = ApiState {
            rng: new_rng(seed),
            statuses: BTreeMap::new(),
        };
        let now = now_millis();
        for (dep, upstream) in &upstreams {
            let response_time_ms = state.random_latency();
            state.statuses.insert(
                *dep,
                ApiStatus {
                    name: dep.display_name().to_string(),
                    mode: upstream.mode(),
                    response_time_ms,
                    syncing: true,
                    last_checked: now,
                    retry_count: 0,
                },
            );
        }

        Self {
            upstreams,
            max_retry_attempts,
            state: Mutex::new(state),
        }
    }

    fn upstream(&self, dep: Dependency) -> &Upstream {
        // Every dependency is inserted in `build`.
        &self.upstreams[&dep]
    }

    fn lock(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe `{url}/health`. The retry counter only drives logging; it never changes the outcome.
    #[instrument(skip(self), fields(gateway = "api", operation = "check_health"))]
    pub async fn check_health(&self, dep: Dependency) -> Sourced<ApiStatus> {
        match self.upstream(dep).probe("/health").await {
            Ok(latency) => {
                let status = self.record(dep, |_, status| {
                    status.mode = ConnectionMode::Connected;
                    status.response_time_ms = latency.as_millis() as u64;
                    status.retry_count = 0;
                });
                debug!(latency_ms = status.response_time_ms, "Health probe succeeded");
                Sourced::connected(status)
            }
            Err(reason) => {
                let max_retry_attempts = self.max_retry_attempts;
                let status = self.record(dep, |state, status| {
                    status.mode = ConnectionMode::Simulated;
                    status.response_time_ms = state.random_latency();
                    if reason.is_failure() {
                        status.retry_count = status.retry_count.saturating_add(1);
                    }
                });
                if reason.is_failure() && status.retry_count >= max_retry_attempts {
                    warn!(
                        api = %dep,
                        attempts = status.retry_count,
                        error = %reason,
                        "API failed repeatedly, using simulation"
                    );
                }
                Sourced::simulated(status, reason)
            }
        }
    }

    fn record(
        &self,
        dep: Dependency,
        update: impl FnOnce(&mut ApiState, &mut ApiStatus),
    ) -> ApiStatus {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut status = state
            .statuses
            .get(&dep)
            .cloned()
            .unwrap_or_else(|| ApiStatus {
                name: dep.display_name().to_string(),
                mode: ConnectionMode::Simulated,
                response_time_ms: 0,
                syncing: true,
                last_checked: 0,
                retry_count: 0,
            });
        update(state, &mut status);
        status.last_checked = now_millis();
        state.statuses.insert(dep, status.clone());
        status
    }

    /// Cached statuses in fixed order; no network traffic.
    pub fn list_statuses(&self) -> Vec<ApiStatus> {
        self.lock().statuses.values().cloned().collect()
    }

    pub fn status(&self, dep: Dependency) -> Option<ApiStatus> {
        self.lock().statuses.get(&dep).cloned()
    }

    pub fn retry_count(&self, dep: Dependency) -> u32 {
        self.lock()
            .statuses
            .get(&dep)
            .map(|s| s.retry_count)
            .unwrap_or(0)
    }

    /// Whether every dependency's last known mode is connected.
    pub fn all_connected(&self) -> bool {
        self.lock()
            .statuses
            .values()
            .all(|s| s.mode.is_connected())
    }

    /// Random-walk each cached latency by [-10, 10) ms without touching the network.
    pub fn drift_response_times(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = now_millis();
        for status in state.statuses.values_mut() {
            let variation = state.rng.gen_range(-10..10);
            let mut next = (status.response_time_ms as i64 + variation).max(MIN_LATENCY_MS);
            if status.mode == ConnectionMode::Simulated {
                next = next.min(MAX_SIMULATED_LATENCY_MS);
            }
            status.response_time_ms = next as u64;
            status.last_checked = now;
        }
    }

    /// Live weather needs both URL and key; otherwise a bounded-random report.
    #[instrument(skip(self), fields(gateway = "api", operation = "fetch_weather"))]
    pub async fn fetch_weather(&self, location: &str) -> Sourced<WeatherReport> {
        let upstream = self.upstream(Dependency::Weather);
        let result = match upstream.api_key() {
            Some(key) => {
                upstream
                    .get_json::<WeatherReport>("", &[("location", location), ("key", key)])
                    .await
            }
            None => Err(Degraded::NotConfigured),
        };
        match result {
            Ok(report) => Sourced::connected(report),
            Err(reason) => {
                if reason.is_failure() {
                    warn!(error = %reason, "Weather API unavailable, using simulated data");
                }
                Sourced::simulated(self.simulated_weather(), reason)
            }
        }
    }

    fn simulated_weather(&self) -> WeatherReport {
        let mut state = self.lock();
        let rng = &mut state.rng;
        let precipitation = if rng.gen_bool(0.3) {
            rng.gen_range(0.0..10.0)
        } else {
            0.0
        };
        WeatherReport {
            temperature: rng.gen_range(22.0..30.0),
            humidity: rng.gen_range(60.0..80.0),
            precipitation,
            forecast: [Forecast::Sunny, Forecast::Cloudy, Forecast::Rainy][rng.gen_range(0..3)],
        }
    }

    /// Live delivery reports whether the upstream accepted it; simulated delivery always succeeds.
    #[instrument(skip(self, message), fields(gateway = "api", operation = "send_notification"))]
    pub async fn send_notification(&self, message: &str, kind: &str) -> Sourced<bool> {
        let body = NotificationBody { message, kind };
        match self
            .upstream(Dependency::Notification)
            .post_for_status("", &body, None)
            .await
        {
            Ok(status) => {
                if !status.is_success() {
                    warn!(status = status.as_u16(), "Notification rejected by upstream");
                }
                Sourced::connected(status.is_success())
            }
            Err(reason) => {
                if reason.is_failure() {
                    warn!(error = %reason, "Notification API unavailable, simulating send");
                }
                Sourced::simulated(true, reason)
            }
        }
    }
}
