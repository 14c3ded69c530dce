use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use madura_client::MaduraClient;

use crate::state::AppState;

/// Last known reachability of the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Up(String),
    Down,
}

impl BackendStatus {
    pub fn from_result<E>(result: &Result<String, E>) -> Self {
        match result {
            Ok(status) => BackendStatus::Up(status.clone()),
            Err(_) => BackendStatus::Down,
        }
    }

    pub fn label(&self) -> String {
        match self {
            BackendStatus::Unknown => "Backend: checking...".to_string(),
            BackendStatus::Up(status) => format!("Backend: {status}"),
            BackendStatus::Down => "Backend: disconnected".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct HealthMonitor {
    status: RwLock<BackendStatus>,
}

impl HealthMonitor {
    pub async fn current(&self) -> BackendStatus {
        self.status.read().await.clone()
    }

    pub async fn record(&self, status: BackendStatus) {
        let mut current = self.status.write().await;
        if *current != status {
            match &status {
                BackendStatus::Down => warn!("Backend became unreachable"),
                other => info!(status = %other.label(), "Backend status changed"),
            }
        }
        *current = status;
    }

    /// Run one check and record its outcome.
    pub async fn check(&self, client: &MaduraClient) -> BackendStatus {
        let result = client.health().await;
        if let Err(e) = &result {
            tracing::debug!(error = %e, base = client.base_url(), "Health check failed");
        }
        let status = BackendStatus::from_result(&result);
        self.record(status.clone()).await;
        status
    }
}

/// Check the default backend every `interval`, starting immediately.
pub fn spawn_poller(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let client = state.default_client();
            state.health.check(&client).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(BackendStatus::Up("ok".into()).label(), "Backend: ok");
        assert_eq!(BackendStatus::Down.label(), "Backend: disconnected");
    }

    #[test]
    fn status_from_result() {
        let ok: Result<String, ()> = Ok("ok".into());
        let err: Result<String, ()> = Err(());
        assert_eq!(BackendStatus::from_result(&ok), BackendStatus::Up("ok".into()));
        assert_eq!(BackendStatus::from_result(&err), BackendStatus::Down);
    }

    #[tokio::test]
    async fn unreachable_backend_is_recorded_as_down() {
        let monitor = HealthMonitor::default();
        assert_eq!(monitor.current().await, BackendStatus::Unknown);

        let client = MaduraClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        assert_eq!(monitor.check(&client).await, BackendStatus::Down);
        assert_eq!(monitor.current().await, BackendStatus::Down);
    }
}
