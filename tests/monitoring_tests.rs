// Monitoring aggregator: health scoring, log ring and transmission metrics

mod common;

use aquapercent::ai_gateway::AiGateway;
use aquapercent::api_gateway::ApiGateway;
use aquapercent::config::{AiEngineConfig, ApiConfig, MonitoringConfig};
use aquapercent::models::{Dependency, LogLevel};
use aquapercent::monitoring::{MAX_LOG_ENTRIES, MonitoringAggregator};
use aquapercent::sensor_gateway::SensorGateway;
use std::sync::Arc;

const DEAD_URL: &str = "http://127.0.0.1:1";

struct Fixture {
    apis: Arc<ApiGateway>,
    monitor: MonitoringAggregator,
}

fn fixture(sensors_live: bool, ai_live: bool, apis: ApiConfig) -> Fixture {
    let sensor_ep = if sensors_live {
        common::endpoint(DEAD_URL)
    } else {
        common::unconfigured()
    };
    let ai_ep = if ai_live {
        common::endpoint(DEAD_URL)
    } else {
        common::unconfigured()
    };
    let sensors = Arc::new(SensorGateway::with_seed(common::upstream(&sensor_ep), 2000, 1));
    let apis = Arc::new(ApiGateway::with_seed(reqwest::Client::new(), &apis, 3, 2));
    let ai = Arc::new(AiGateway::with_seed(
        common::upstream(&ai_ep),
        &AiEngineConfig::default(),
        3,
    ));
    let monitor = MonitoringAggregator::with_seed(
        sensors,
        apis.clone(),
        ai,
        &MonitoringConfig::default(),
        4,
    );
    Fixture { apis, monitor }
}

fn all_apis_configured() -> ApiConfig {
    ApiConfig {
        weather: common::endpoint(DEAD_URL),
        map: common::endpoint(DEAD_URL),
        prediction: common::endpoint(DEAD_URL),
        notification: common::endpoint(DEAD_URL),
        ..common::api_config()
    }
}

#[test]
fn fully_simulated_system_is_healthy_but_degraded() {
    let f = fixture(false, false, common::api_config());
    let health = f.monitor.system_health();
    assert_eq!(health.components.sensors, 95.0);
    assert_eq!(health.components.apis, 95.0);
    assert_eq!(health.components.ai_engine, 95.0);
    assert_eq!(health.overall, 95.0);

    let check = f.monitor.perform_health_check();
    assert!(check.all_passed());
}

#[test]
fn fully_configured_system_scores_100() {
    let f = fixture(true, true, all_apis_configured());
    let health = f.monitor.system_health();
    assert_eq!(health.overall, 100.0);
    assert!(health.computed_at > 0);
}

#[test]
fn one_simulated_api_drags_the_api_score() {
    let apis = ApiConfig {
        weather: common::unconfigured(),
        ..all_apis_configured()
    };
    let f = fixture(true, true, apis);
    let health = f.monitor.system_health();
    assert_eq!(health.components.apis, 95.0);
    assert_eq!(health.components.sensors, 100.0);
    assert!((health.overall - (100.0 + 95.0 + 100.0) / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn failed_health_check_is_reflected_in_health() {
    let f = fixture(true, true, all_apis_configured());
    assert_eq!(f.monitor.system_health().components.apis, 100.0);

    let status = f.apis.check_health(Dependency::Map).await;
    assert!(!status.is_connected());
    assert_eq!(f.monitor.system_health().components.apis, 95.0);
}

#[test]
fn initial_logs_are_present() {
    let f = fixture(false, false, common::api_config());
    let logs = f.monitor.logs(10);
    assert_eq!(logs.len(), 4);
    // Newest first.
    assert_eq!(logs[0].message, "Sensor data synchronized");
    assert_eq!(logs[3].message, "System initialized");
    assert!(logs.iter().all(|e| e.level == LogLevel::Info));
}

#[test]
fn log_ring_keeps_the_newest_hundred() {
    let f = fixture(false, false, common::api_config());
    for i in 0..150 {
        f.monitor.add_log(format!("entry {i}"), LogLevel::Warning);
    }
    assert_eq!(f.monitor.log_count(), MAX_LOG_ENTRIES);

    let logs = f.monitor.logs(usize::MAX);
    assert_eq!(logs.len(), MAX_LOG_ENTRIES);
    assert_eq!(logs[0].message, "entry 149");
    assert_eq!(logs[MAX_LOG_ENTRIES - 1].message, "entry 50");

    assert_eq!(f.monitor.logs(5).len(), 5);
}

#[test]
fn random_logs_come_from_the_heartbeat_set() {
    let f = fixture(false, false, common::api_config());
    for _ in 0..50 {
        let message = f.monitor.generate_random_log();
        assert!(!message.is_empty());
        assert_eq!(f.monitor.logs(1)[0].message, message);
    }
}

#[test]
fn transmission_metrics_stay_bounded() {
    let f = fixture(false, false, common::api_config());
    let initial = f.monitor.transmission();
    assert_eq!(initial.packets_per_second, 342);
    assert_eq!(initial.signal_strength, 94.0);
    assert_eq!(initial.system_uptime, 99.8);

    let mut last_uptime = initial.system_uptime;
    for _ in 0..10_000 {
        let t = f.monitor.tick_transmission();
        assert!((300..=400).contains(&t.packets_per_second));
        assert!((85.0..=100.0).contains(&t.signal_strength));
        assert!(t.system_uptime >= last_uptime);
        assert!(t.system_uptime <= 100.0);
        last_uptime = t.system_uptime;
    }
    // 0.2 of headroom at 0.001 per tick saturates well before 10k ticks.
    assert_eq!(f.monitor.uptime_percentage(), 100.0);
}

#[test]
fn settings_mirror_configuration() {
    let f = fixture(false, false, common::api_config());
    let settings = f.monitor.settings();
    let defaults = MonitoringConfig::default();
    assert_eq!(settings.data_stream_interval_ms, defaults.data_stream_interval_ms);
    assert_eq!(settings.heartbeat_interval_ms, defaults.heartbeat_interval_ms);
    assert_eq!(settings.health_check_interval_ms, defaults.health_check_interval_ms);
    assert_eq!(settings.log_retention_hours, 24);
    assert!(settings.enable_real_time_sync);
}
