// Worker tests: spawn the ticker, receive telemetry, shut down; individual ticks in isolation

mod common;

use aquapercent::config::AppConfig;
use aquapercent::models::{ConnectionMode, Dependency, LogLevel};
use aquapercent::services::Services;
use aquapercent::worker::{
    WorkerConfig, WorkerDeps, data_stream_tick, health_check_tick, heartbeat_tick,
    notification_feed_tick, spawn,
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, timeout};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(real_time_sync: bool) -> WorkerConfig {
    WorkerConfig {
        data_stream_interval_ms: 20,
        heartbeat_interval_ms: 30,
        health_check_interval_ms: 40,
        notification_feed_interval_ms: 25,
        real_time_sync,
    }
}

#[tokio::test]
async fn worker_publishes_frames_and_stops_on_shutdown() {
    let services = common::offline_services();
    let (tx, mut rx) = broadcast::channel(16);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = spawn(
        WorkerDeps {
            services: services.clone(),
            tx,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_rx,
        },
        fast_config(true),
    );

    let frame = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("frame within deadline")
        .expect("channel open");
    assert_eq!(frame.sensors.len(), 4);
    assert_eq!(frame.health.overall, 95.0);
    assert!((300..=400).contains(&frame.transmission.packets_per_second));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let _ = shutdown_tx.send(());
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker stops")
        .unwrap();

    // Heartbeats appended log lines on top of the four initial ones.
    assert!(services.monitoring.log_count() > 4);
}

#[tokio::test]
async fn worker_without_real_time_sync_publishes_nothing() {
    let services = common::offline_services();
    let (tx, mut rx) = broadcast::channel(16);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = spawn(
        WorkerDeps {
            services: services.clone(),
            tx,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_rx,
        },
        fast_config(false),
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    let _ = shutdown_tx.send(());
    handle.await.unwrap();

    assert!(rx.try_recv().is_err());
    // Gauges still advanced.
    assert!(services.monitoring.transmission().last_sync > 0);
}

#[test]
fn worker_config_follows_monitoring_settings() {
    let config = AppConfig::load_from_str(
        r#"
[monitoring]
data_stream_interval_ms = 1000
heartbeat_interval_ms = 1500
health_check_interval_ms = 7000
notification_feed_interval_ms = 20000
enable_real_time_sync = false
"#,
    )
    .unwrap();
    let worker = WorkerConfig::from_app_config(&config);
    assert_eq!(worker.data_stream_interval_ms, 1000);
    assert_eq!(worker.heartbeat_interval_ms, 1500);
    assert_eq!(worker.health_check_interval_ms, 7000);
    assert_eq!(worker.notification_feed_interval_ms, 20000);
    assert!(!worker.real_time_sync);
}

#[tokio::test]
async fn data_stream_tick_builds_a_full_frame() {
    let services = common::offline_services();
    let frame = data_stream_tick(&services).await;
    assert_eq!(frame.sensors.len(), 4);
    assert!(frame.timestamp > 0);
    assert!(frame.transmission.last_sync > 0);
    assert_eq!(frame.health.components.sensors, 95.0);
}

#[tokio::test]
async fn heartbeat_tick_adds_one_log_line() {
    let services = common::offline_services();
    let before = services.monitoring.log_count();
    heartbeat_tick(&services);
    assert_eq!(services.monitoring.log_count(), before + 1);
    let confidence = services.ai.confidence();
    assert!((80.0..=95.0).contains(&confidence));
}

#[tokio::test]
async fn health_check_tick_checks_every_dependency() {
    let services = common::offline_services();
    let check = health_check_tick(&services).await;
    assert!(check.all_passed());
    for dep in Dependency::ALL {
        let status = services.apis.status(dep).unwrap();
        assert!((20..=80).contains(&status.response_time_ms));
    }
    assert!(
        services
            .monitoring
            .logs(100)
            .iter()
            .all(|e| e.level == LogLevel::Info)
    );
}

/// Services whose four API dependencies answer /health only after `delay`.
async fn services_with_slow_health(delay: Duration) -> (MockServer, Services) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .mount(&server)
        .await;
    let mut config = AppConfig::default();
    config.api.weather = common::endpoint(server.uri());
    config.api.map = common::endpoint(server.uri());
    config.api.prediction = common::endpoint(server.uri());
    config.api.notification = common::endpoint(server.uri());
    let services = Services::with_client(reqwest::Client::new(), &config);
    (server, services)
}

#[tokio::test]
async fn health_check_tick_checks_dependencies_concurrently() {
    let (_server, services) = services_with_slow_health(Duration::from_millis(400)).await;

    let started = Instant::now();
    let check = health_check_tick(&services).await;
    let elapsed = started.elapsed();

    // Four sequential calls would take at least 1600 ms.
    assert!(elapsed < Duration::from_millis(1000), "took {elapsed:?}");
    assert!(check.all_passed());
    for dep in Dependency::ALL {
        let status = services.apis.status(dep).unwrap();
        assert_eq!(status.mode, ConnectionMode::Connected);
        assert!(status.response_time_ms >= 400);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_health_endpoints_do_not_stall_telemetry() {
    let (_server, services) = services_with_slow_health(Duration::from_millis(400)).await;
    let (tx, mut rx) = broadcast::channel(64);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = spawn(
        WorkerDeps {
            services: services.clone(),
            tx,
            ws_connections: Arc::new(AtomicUsize::new(1)),
            shutdown_rx,
        },
        WorkerConfig {
            data_stream_interval_ms: 50,
            heartbeat_interval_ms: 1000,
            health_check_interval_ms: 100,
            notification_feed_interval_ms: 20_000,
            real_time_sync: true,
        },
    );

    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("first frame")
        .unwrap();
    let mut last = Instant::now();
    let mut max_gap = Duration::ZERO;
    let mut frames = 0;
    let window = Instant::now();
    while window.elapsed() < Duration::from_millis(1200) {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("frame within deadline")
            .unwrap();
        max_gap = max_gap.max(last.elapsed());
        last = Instant::now();
        frames += 1;
    }

    let _ = shutdown_tx.send(());
    timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker stops")
        .unwrap();

    assert!(max_gap < Duration::from_millis(300), "max gap {max_gap:?}");
    assert!(frames >= 15, "only {frames} frames");
    // At least one slow health check finished in the background.
    assert_eq!(
        services.apis.status(Dependency::Weather).unwrap().mode,
        ConnectionMode::Connected
    );
}

#[tokio::test]
async fn notification_feed_tick_only_ever_adds() {
    let services = common::offline_services();
    let before = services.notifications.len();
    for _ in 0..40 {
        notification_feed_tick(&services);
    }
    let after = services.notifications.len();
    assert!(after >= before);
    assert_eq!(services.notifications.unread_count(), after);
}

#[tokio::test]
async fn worker_feed_fills_the_inbox() {
    let services = common::offline_services();
    services.notifications.clear_all();
    let (tx, _rx) = broadcast::channel(16);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = spawn(
        WorkerDeps {
            services: services.clone(),
            tx,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_rx,
        },
        WorkerConfig {
            notification_feed_interval_ms: 5,
            ..fast_config(false)
        },
    );

    // 60 ticks at even odds: an empty inbox after that is vanishingly unlikely.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let _ = shutdown_tx.send(());
    handle.await.unwrap();

    assert!(!services.notifications.is_empty());
}
