// Sensor gateway: four instrument channels from a live data source or a bounded random walk.

use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::Degraded;
use crate::models::{
    ConnectionMode, SensorChannel, SensorReading, SensorSnapshot, Sourced, now_millis,
};
use crate::simulation::{BoundedWalk, last_update_label, new_rng};
use crate::upstream::Upstream;

/// Probability that a simulated tick reports a leak.
const LEAK_PROBABILITY: f64 = 0.05;

#[derive(Debug, Deserialize)]
struct SensorFeed {
    #[serde(default)]
    sensors: Vec<FeedSensor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedSensor {
    id: String,
    name: String,
    #[serde(default)]
    rate: String,
    #[serde(default)]
    last_update: String,
    value: f64,
}

struct SimState {
    rng: StdRng,
    pressure: BoundedWalk,
    flow: BoundedWalk,
    soil_moisture: BoundedWalk,
    leak_detection: f64,
}

impl SimState {
    fn new(seed: Option<u64>) -> Self {
        Self {
            rng: new_rng(seed),
            pressure: BoundedWalk::new(2.4, 2.0, 3.0, 0.1),
            flow: BoundedWalk::new(342.5, 300.0, 400.0, 10.0),
            soil_moisture: BoundedWalk::new(68.3, 60.0, 75.0, 2.0),
            leak_detection: 0.0,
        }
    }

    fn advance(&mut self) {
        self.pressure.advance(&mut self.rng);
        self.flow.advance(&mut self.rng);
        self.soil_moisture.advance(&mut self.rng);
        self.leak_detection = if self.rng.gen_bool(LEAK_PROBABILITY) {
            1.0
        } else {
            0.0
        };
    }

    fn value(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::Pressure => self.pressure.value(),
            SensorChannel::Flow => self.flow.value(),
            SensorChannel::SoilMoisture => self.soil_moisture.value(),
            SensorChannel::LeakDetection => self.leak_detection,
        }
    }
}

pub struct SensorGateway {
    upstream: Upstream,
    polling_interval: Duration,
    state: Mutex<SimState>,
}

impl SensorGateway {
    pub fn new(upstream: Upstream, polling_interval_ms: u64) -> Self {
        Self::build(upstream, polling_interval_ms, None)
    }

    /// Deterministic simulation for tests.
    pub fn with_seed(upstream: Upstream, polling_interval_ms: u64, seed: u64) -> Self {
        Self::build(upstream, polling_interval_ms, Some(seed))
    }

    fn build(upstream: Upstream, polling_interval_ms: u64, seed: Option<u64>) -> Self {
        Self {
            upstream,
            polling_interval: Duration::from_millis(polling_interval_ms),
            state: Mutex::new(SimState::new(seed)),
        }
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.upstream.mode()
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Always four readings, one per channel. Never fails: upstream trouble yields simulated data.
    #[instrument(skip(self), fields(gateway = "sensor", operation = "fetch_readings"))]
    pub async fn fetch_readings(&self) -> Sourced<Vec<SensorReading>> {
        match self.fetch_connected().await {
            Ok(readings) => Sourced::connected(readings),
            Err(reason) => {
                if reason.is_failure() {
                    warn!(error = %reason, "Sensor endpoint unavailable, falling back to simulation");
                }
                Sourced::simulated(self.simulate(), reason)
            }
        }
    }

    async fn fetch_connected(&self) -> Result<Vec<SensorReading>, Degraded> {
        let feed: SensorFeed = self.upstream.get_json("", &[]).await?;
        if feed.sensors.len() != SensorChannel::ALL.len() {
            return Err(Degraded::Malformed(format!(
                "expected {} sensors, got {}",
                SensorChannel::ALL.len(),
                feed.sensors.len()
            )));
        }
        let captured_at = now_millis();
        debug!(sensors = feed.sensors.len(), "Sensor feed received");
        Ok(feed
            .sensors
            .into_iter()
            .map(|s| SensorReading {
                id: s.id,
                name: s.name,
                mode: ConnectionMode::Connected,
                rate: s.rate,
                last_update: s.last_update,
                value: s.value,
                captured_at,
            })
            .collect())
    }

    fn simulate(&self) -> Vec<SensorReading> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.advance();
        let captured_at = now_millis();
        SensorChannel::ALL
            .into_iter()
            .map(|channel| SensorReading {
                id: channel.id().to_string(),
                name: channel.display_name().to_string(),
                mode: ConnectionMode::Simulated,
                rate: channel.rate().to_string(),
                last_update: last_update_label(&mut state.rng),
                value: state.value(channel),
                captured_at,
            })
            .collect()
    }

    /// Current simulated values without advancing them.
    pub fn current_readings(&self) -> SensorSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        SensorSnapshot {
            pressure: state.value(SensorChannel::Pressure),
            flow: state.value(SensorChannel::Flow),
            soil_moisture: state.value(SensorChannel::SoilMoisture),
            leak_detection: state.value(SensorChannel::LeakDetection),
        }
    }
}
