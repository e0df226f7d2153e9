// Shared test helpers

#![allow(dead_code)]

use aquapercent::ai_gateway::AiGateway;
use aquapercent::api_gateway::ApiGateway;
use aquapercent::config::{AiEngineConfig, ApiConfig, AppConfig, EndpointConfig};
use aquapercent::sensor_gateway::SensorGateway;
use aquapercent::services::Services;
use aquapercent::upstream::Upstream;

pub const TEST_TIMEOUT_MS: u64 = 1_000;

pub fn unconfigured() -> EndpointConfig {
    EndpointConfig {
        url: None,
        api_key: None,
        timeout_ms: TEST_TIMEOUT_MS,
    }
}

pub fn endpoint(url: impl Into<String>) -> EndpointConfig {
    EndpointConfig {
        url: Some(url.into()),
        api_key: None,
        timeout_ms: TEST_TIMEOUT_MS,
    }
}

pub fn upstream(endpoint: &EndpointConfig) -> Upstream {
    Upstream::new(reqwest::Client::new(), endpoint)
}

pub fn offline_sensor_gateway(seed: u64) -> SensorGateway {
    SensorGateway::with_seed(upstream(&unconfigured()), 2000, seed)
}

pub fn api_config() -> ApiConfig {
    ApiConfig {
        timeout_ms: TEST_TIMEOUT_MS,
        weather: unconfigured(),
        map: unconfigured(),
        prediction: unconfigured(),
        notification: unconfigured(),
    }
}

pub fn offline_api_gateway(seed: u64) -> ApiGateway {
    ApiGateway::with_seed(reqwest::Client::new(), &api_config(), 3, seed)
}

pub fn offline_ai_gateway(seed: u64) -> AiGateway {
    AiGateway::with_seed(upstream(&unconfigured()), &AiEngineConfig::default(), seed)
}

/// Services with no upstream configured anywhere.
pub fn offline_services() -> Services {
    Services::with_client(reqwest::Client::new(), &AppConfig::default())
}
