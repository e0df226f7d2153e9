// Composition root: every gateway is built once per process and shared by handle.

use std::sync::Arc;
use tracing::info;

use crate::ai_gateway::AiGateway;
use crate::api_gateway::ApiGateway;
use crate::config::AppConfig;
use crate::models::Dependency;
use crate::monitoring::MonitoringAggregator;
use crate::notifications::NotificationInbox;
use crate::sensor_gateway::SensorGateway;
use crate::upstream::Upstream;
use crate::version;

#[derive(Clone)]
pub struct Services {
    pub sensors: Arc<SensorGateway>,
    pub apis: Arc<ApiGateway>,
    pub ai: Arc<AiGateway>,
    pub monitoring: Arc<MonitoringAggregator>,
    pub notifications: Arc<NotificationInbox>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(version::user_agent())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &AppConfig) -> Self {
        let sensors = Arc::new(SensorGateway::new(
            Upstream::new(client.clone(), &config.sensor_endpoint()),
            config.sensor.polling_interval_ms,
        ));
        let apis = Arc::new(ApiGateway::new(
            client.clone(),
            &config.api,
            config.monitoring.max_retry_attempts,
        ));
        let ai = Arc::new(AiGateway::new(
            Upstream::new(client, &config.ai_endpoint()),
            &config.ai_engine,
        ));
        let monitoring = Arc::new(MonitoringAggregator::new(
            sensors.clone(),
            apis.clone(),
            ai.clone(),
            &config.monitoring,
        ));

        let notifications = Arc::new(NotificationInbox::new());
        notifications.add_welcome();

        let services = Self {
            sensors,
            apis,
            ai,
            monitoring,
            notifications,
        };
        services.log_modes();
        services
    }

    fn log_modes(&self) {
        let api_modes: Vec<String> = Dependency::ALL
            .into_iter()
            .filter_map(|dep| self.apis.status(dep).map(|s| format!("{}={}", dep, s.mode)))
            .collect();
        info!(
            sensors = %self.sensors.connection_mode(),
            ai_engine = %self.ai.connection_mode(),
            apis = %api_modes.join(","),
            "Services initialized"
        );
    }
}
