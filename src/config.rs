// Configuration: optional TOML file, then AQUA_* environment overrides, resolved once at startup.

use serde::Deserialize;
use std::collections::HashMap;

/// Snapshot of the process environment taken once; lookups never re-read `std::env`.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs (tests, embedding).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Non-empty value for `key`, if any.
    pub fn resolve_opt(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn resolve_str(&self, key: &str, default: &str) -> String {
        self.resolve_opt(key).unwrap_or_else(|| default.to_string())
    }

    /// Malformed numbers fall back to `default`.
    pub fn resolve_u64(&self, key: &str, default: u64) -> u64 {
        self.resolve_opt(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn resolve_f64(&self, key: &str, default: f64) -> f64 {
        self.resolve_opt(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// Accepts true/false, 1/0, yes/no (any case); anything else yields `default`.
    pub fn resolve_bool(&self, key: &str, default: bool) -> bool {
        match self.resolve_opt(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("true" | "1" | "yes") => true,
            Some("false" | "0" | "no") => false,
            _ => default,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub sensor: SensorConfig,
    pub api: ApiConfig,
    pub ai_engine: AiEngineConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Max telemetry frames buffered for /ws/telemetry (slow clients may lag).
    pub broadcast_capacity: usize,
}

/// One optional upstream. `url` is the only switch between connected and simulated mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl EndpointConfig {
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub data_source_url: Option<String>,
    pub polling_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Default deadline applied to every endpoint that does not set its own.
    pub timeout_ms: u64,
    pub weather: EndpointConfig,
    pub map: EndpointConfig,
    pub prediction: EndpointConfig,
    pub notification: EndpointConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiEngineConfig {
    pub prediction_engine_url: Option<String>,
    pub model_version: String,
    pub confidence_threshold: f64,
    pub anomaly_detection_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub data_stream_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub health_check_interval_ms: u64,
    /// Simulated inbox feed cadence.
    pub notification_feed_interval_ms: u64,
    /// Log entries older than this are dropped from the ring.
    pub log_retention_hours: u64,
    pub enable_real_time_sync: bool,
    pub enable_data_caching: bool,
    pub max_retry_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "production".into(),
            server: ServerConfig::default(),
            sensor: SensorConfig::default(),
            api: ApiConfig::default(),
            ai_engine: AiEngineConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            host: "0.0.0.0".into(),
            broadcast_capacity: 60,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            data_source_url: None,
            polling_interval_ms: 2000,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
            weather: EndpointConfig::default(),
            map: EndpointConfig::default(),
            prediction: EndpointConfig::default(),
            notification: EndpointConfig::default(),
        }
    }
}

impl Default for AiEngineConfig {
    fn default() -> Self {
        Self {
            prediction_engine_url: None,
            model_version: "v2.4.1".into(),
            confidence_threshold: 0.85,
            anomaly_detection_enabled: true,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            data_stream_interval_ms: 2000,
            heartbeat_interval_ms: 3000,
            health_check_interval_ms: 5000,
            notification_feed_interval_ms: 20000,
            log_retention_hours: 24,
            enable_real_time_sync: true,
            enable_data_caching: true,
            max_retry_attempts: 3,
        }
    }
}

pub const DEFAULT_API_TIMEOUT_MS: u64 = 5000;

impl AppConfig {
    /// File from `CONFIG_FILE` (must exist when set) or `./config.toml` (optional), then env overrides.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with_env(&EnvSnapshot::from_process())
    }

    pub fn load_with_env(env: &EnvSnapshot) -> anyhow::Result<Self> {
        let base = match env.resolve_opt("CONFIG_FILE") {
            Some(path) => {
                let s = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("reading {}: {}", path, e))?;
                toml::from_str(&s)?
            }
            None => match std::fs::read_to_string("config.toml") {
                Ok(s) => toml::from_str(&s)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                Err(e) => return Err(e.into()),
            },
        };
        let config = base.with_env(env).normalized();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests). No env overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus env overrides only; the file layer is skipped.
    pub fn from_env(env: &EnvSnapshot) -> anyhow::Result<Self> {
        let config = AppConfig::default().with_env(env).normalized();
        config.validate()?;
        Ok(config)
    }

    fn with_env(mut self, env: &EnvSnapshot) -> Self {
        self.environment = env.resolve_str("AQUA_ENVIRONMENT", &self.environment);

        self.server.host = env.resolve_str("AQUA_HOST", &self.server.host);
        self.server.port = env
            .resolve_opt("AQUA_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.server.port);

        self.api.timeout_ms = env.resolve_u64("AQUA_API_TIMEOUT", self.api.timeout_ms);
        if env.resolve_opt("AQUA_API_TIMEOUT").is_some() {
            for endpoint in [
                &mut self.api.weather,
                &mut self.api.map,
                &mut self.api.prediction,
                &mut self.api.notification,
            ] {
                endpoint.timeout_ms = self.api.timeout_ms;
            }
        }

        if let Some(url) = env.resolve_opt("AQUA_SENSOR_DATA_SOURCE_URL") {
            self.sensor.data_source_url = Some(url);
        }
        self.sensor.polling_interval_ms =
            env.resolve_u64("AQUA_SENSOR_POLLING_INTERVAL", self.sensor.polling_interval_ms);

        override_endpoint(
            &mut self.api.weather,
            env,
            "AQUA_WEATHER_API_URL",
            Some("AQUA_WEATHER_API_KEY"),
        );
        override_endpoint(
            &mut self.api.map,
            env,
            "AQUA_MAP_SERVICE_URL",
            Some("AQUA_MAP_SERVICE_KEY"),
        );
        override_endpoint(
            &mut self.api.prediction,
            env,
            "AQUA_PREDICTION_ENGINE_URL",
            None,
        );
        override_endpoint(
            &mut self.api.notification,
            env,
            "AQUA_NOTIFICATION_SERVICE_URL",
            None,
        );

        if let Some(url) = env.resolve_opt("AQUA_PREDICTION_ENGINE_URL") {
            self.ai_engine.prediction_engine_url = Some(url);
        }
        self.ai_engine.model_version =
            env.resolve_str("AQUA_AI_MODEL_VERSION", &self.ai_engine.model_version);

        let m = &mut self.monitoring;
        m.data_stream_interval_ms =
            env.resolve_u64("AQUA_DATA_STREAM_INTERVAL", m.data_stream_interval_ms);
        m.heartbeat_interval_ms =
            env.resolve_u64("AQUA_SYSTEM_HEARTBEAT_INTERVAL", m.heartbeat_interval_ms);
        m.health_check_interval_ms =
            env.resolve_u64("AQUA_HEALTH_CHECK_INTERVAL", m.health_check_interval_ms);
        m.notification_feed_interval_ms = env.resolve_u64(
            "AQUA_NOTIFICATION_FEED_INTERVAL",
            m.notification_feed_interval_ms,
        );
        m.log_retention_hours = env.resolve_u64("AQUA_LOG_RETENTION_HOURS", m.log_retention_hours);
        m.enable_real_time_sync =
            env.resolve_bool("AQUA_ENABLE_REAL_TIME_SYNC", m.enable_real_time_sync);
        m.enable_data_caching = env.resolve_bool("AQUA_ENABLE_DATA_CACHING", m.enable_data_caching);
        m.max_retry_attempts = env
            .resolve_opt("AQUA_MAX_RETRY_ATTEMPTS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(m.max_retry_attempts);

        self
    }

    /// Empty URLs/keys become `None`; unset endpoint timeouts inherit `api.timeout_ms`.
    fn normalized(mut self) -> Self {
        let default_timeout = self.api.timeout_ms;
        for endpoint in [
            &mut self.api.weather,
            &mut self.api.map,
            &mut self.api.prediction,
            &mut self.api.notification,
        ] {
            endpoint.url = non_empty(endpoint.url.take());
            endpoint.api_key = non_empty(endpoint.api_key.take());
            if endpoint.timeout_ms == 0 {
                endpoint.timeout_ms = default_timeout;
            }
        }
        self.sensor.data_source_url = non_empty(self.sensor.data_source_url.take());
        self.ai_engine.prediction_engine_url =
            non_empty(self.ai_engine.prediction_engine_url.take());
        self
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.server.broadcast_capacity > 0,
            "server.broadcast_capacity must be > 0, got {}",
            self.server.broadcast_capacity
        );
        anyhow::ensure!(
            self.api.timeout_ms > 0,
            "api.timeout_ms must be > 0, got {}",
            self.api.timeout_ms
        );
        anyhow::ensure!(
            self.sensor.polling_interval_ms > 0,
            "sensor.polling_interval_ms must be > 0, got {}",
            self.sensor.polling_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.data_stream_interval_ms > 0,
            "monitoring.data_stream_interval_ms must be > 0, got {}",
            self.monitoring.data_stream_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.heartbeat_interval_ms > 0,
            "monitoring.heartbeat_interval_ms must be > 0, got {}",
            self.monitoring.heartbeat_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.health_check_interval_ms > 0,
            "monitoring.health_check_interval_ms must be > 0, got {}",
            self.monitoring.health_check_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.notification_feed_interval_ms > 0,
            "monitoring.notification_feed_interval_ms must be > 0, got {}",
            self.monitoring.notification_feed_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.log_retention_hours > 0,
            "monitoring.log_retention_hours must be > 0, got {}",
            self.monitoring.log_retention_hours
        );
        anyhow::ensure!(
            self.monitoring.max_retry_attempts > 0,
            "monitoring.max_retry_attempts must be > 0, got {}",
            self.monitoring.max_retry_attempts
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.ai_engine.confidence_threshold),
            "ai_engine.confidence_threshold must be within [0, 1], got {}",
            self.ai_engine.confidence_threshold
        );
        Ok(())
    }

    /// Endpoint the sensor gateway polls; shares the API deadline.
    pub fn sensor_endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            url: self.sensor.data_source_url.clone(),
            api_key: None,
            timeout_ms: self.api.timeout_ms,
        }
    }

    /// Endpoint the AI gateway posts to; shares the API deadline.
    pub fn ai_endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            url: self.ai_engine.prediction_engine_url.clone(),
            api_key: None,
            timeout_ms: self.api.timeout_ms,
        }
    }
}

fn override_endpoint(
    endpoint: &mut EndpointConfig,
    env: &EnvSnapshot,
    url_key: &str,
    api_key_key: Option<&str>,
) {
    if let Some(url) = env.resolve_opt(url_key) {
        endpoint.url = Some(url);
    }
    if let Some(key) = api_key_key.and_then(|k| env.resolve_opt(k)) {
        endpoint.api_key = Some(key);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
