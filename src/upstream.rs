// Timeout-guarded JSON calls to an optional upstream. Every failure becomes a `Degraded`.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::config::EndpointConfig;
use crate::error::Degraded;
use crate::models::ConnectionMode;

/// One configured (or absent) HTTP endpoint.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl Upstream {
    pub fn new(client: reqwest::Client, endpoint: &EndpointConfig) -> Self {
        Self {
            client,
            base_url: endpoint
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(|u| u.trim_end_matches('/').to_string()),
            api_key: endpoint.api_key.clone(),
            timeout: Duration::from_millis(endpoint.timeout_ms),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Mode implied by configuration; individual calls may still fall back.
    pub fn mode(&self) -> ConnectionMode {
        ConnectionMode::from_configured(self.is_configured())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn url(&self, path: &str) -> Result<String, Degraded> {
        let base = self.base_url.as_deref().ok_or(Degraded::NotConfigured)?;
        Ok(format!("{}{}", base, path))
    }

    /// GET `{base}{path}` and decode a 2xx JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Degraded> {
        let url = self.url(path)?;
        let request = self.client.get(&url).query(query);
        guarded(self.timeout, async move {
            let resp = request.send().await.map_err(map_reqwest)?;
            decode(ensure_success(resp)?).await
        })
        .await
    }

    /// POST a JSON body and decode a 2xx JSON response. `deadline` overrides the endpoint timeout.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        deadline: Option<Duration>,
    ) -> Result<T, Degraded>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let request = self.client.post(&url).json(body);
        guarded(deadline.unwrap_or(self.timeout), async move {
            let resp = request.send().await.map_err(map_reqwest)?;
            decode(ensure_success(resp)?).await
        })
        .await
    }

    /// POST a JSON body and report the status code, without treating non-2xx as a failure.
    pub async fn post_for_status<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        deadline: Option<Duration>,
    ) -> Result<StatusCode, Degraded> {
        let url = self.url(path)?;
        let request = self.client.post(&url).json(body);
        guarded(deadline.unwrap_or(self.timeout), async move {
            let resp = request.send().await.map_err(map_reqwest)?;
            Ok(resp.status())
        })
        .await
    }

    /// GET `{base}{path}` expecting 2xx; returns the round-trip latency.
    pub async fn probe(&self, path: &str) -> Result<Duration, Degraded> {
        let url = self.url(path)?;
        let request = self.client.get(&url);
        let started = Instant::now();
        guarded(self.timeout, async move {
            let resp = request.send().await.map_err(map_reqwest)?;
            ensure_success(resp)?;
            Ok(started.elapsed())
        })
        .await
    }
}

async fn guarded<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, Degraded>>,
) -> Result<T, Degraded> {
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Degraded::Timeout {
            timeout_ms: deadline.as_millis() as u64,
        }),
    }
}

fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, Degraded> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(Degraded::Status(status.as_u16()))
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Degraded> {
    let bytes = resp.bytes().await.map_err(map_reqwest)?;
    serde_json::from_slice(&bytes).map_err(|e| Degraded::Malformed(e.to_string()))
}

/// Deadlines are enforced by `guarded`; a timeout raised inside the client is reported as transport.
fn map_reqwest(e: reqwest::Error) -> Degraded {
    if e.is_decode() {
        Degraded::Malformed(e.to_string())
    } else {
        Degraded::Transport(e.to_string())
    }
}
