use std::collections::HashMap;
use std::time::Duration;

use axum::http::HeaderMap;
use tokio::sync::RwLock;

use madura_client::MaduraClient;
use madura_common::{Config, Lote, ViewState};

use crate::health::{BackendStatus, HealthMonitor};
use crate::settings::api_base_override;

pub struct AppState {
    pub http: reqwest::Client,
    pub default_api_base: String,
    /// Last loaded lists, one entry per backend base URL.
    pub cache: RwLock<HashMap<String, ViewState>>,
    pub health: HealthMonitor,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_timeout(&config.api_base, config.request_timeout)
    }

    pub fn with_timeout(api_base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            default_api_base: madura_common::config::normalize_base(api_base),
            cache: RwLock::new(HashMap::new()),
            health: HealthMonitor::default(),
        })
    }

    pub fn default_client(&self) -> MaduraClient {
        MaduraClient::with_http(self.http.clone(), &self.default_api_base)
    }

    /// Client for this request: the `api_base` cookie wins over the configured base.
    pub fn client(&self, headers: &HeaderMap) -> MaduraClient {
        match api_base_override(headers) {
            Some(base) => MaduraClient::with_http(self.http.clone(), &base),
            None => self.default_client(),
        }
    }

    /// Status for the page header. The poller only watches the default base, so an
    /// overridden base is checked live.
    pub async fn status_for(&self, client: &MaduraClient) -> BackendStatus {
        if client.base_url() == self.default_api_base {
            self.health.current().await
        } else {
            BackendStatus::from_result(&client.health().await)
        }
    }

    pub async fn remember_lotes(&self, base: &str, lotes: Vec<Lote>) {
        self.cache
            .write()
            .await
            .entry(base.to_string())
            .or_default()
            .replace_lotes(lotes);
    }

    /// Batches last loaded from `base`; empty when none were.
    pub async fn cached_lotes(&self, base: &str) -> Vec<Lote> {
        self.cache
            .read()
            .await
            .get(base)
            .map(|view| view.lotes.clone())
            .unwrap_or_default()
    }
}
