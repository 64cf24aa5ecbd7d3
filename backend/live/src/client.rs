use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use pulsedrive_core::{ErrorCallback, EventCallback, LiveConnection, LiveSource, PulseError};

use crate::stream::event_stream;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize)]
struct TriggerRequest<'a> {
    workflow_id: &'a str,
    vehicle_id: Option<&'a str>,
}

/// The Pulse Drive backend over HTTP (trigger, health) and WebSocket (events).
pub struct HttpLiveSource {
    client: Client,
    base_url: String,
}

impl HttpLiveSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PulseError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(PulseError::ConfigError(format!(
                "backend URL must start with http:// or https://: {base_url}"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::ConfigError(format!("HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn trigger_url(&self) -> String {
        format!("{}/api/agents/trigger", self.base_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// WebSocket URL of the agent event stream (`http` → `ws`, `https` → `wss`).
    pub fn events_url(&self) -> String {
        let ws_base = match self.base_url.strip_prefix("https://") {
            Some(rest) => format!("wss://{rest}"),
            None => match self.base_url.strip_prefix("http://") {
                Some(rest) => format!("ws://{rest}"),
                None => self.base_url.clone(),
            },
        };
        format!("{ws_base}/api/agents/events")
    }
}

#[async_trait]
impl LiveSource for HttpLiveSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn connect(&self, on_event: EventCallback, on_error: ErrorCallback) -> LiveConnection {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let url = self.events_url();
        debug!(url = %url, "Opening live event stream");
        tokio::spawn(event_stream(url, on_event, on_error, shutdown_rx));
        LiveConnection::new(move || {
            let _ = shutdown_tx.send(());
        })
    }

    async fn trigger(&self, scenario_id: &str) -> Result<(), PulseError> {
        let body = TriggerRequest {
            workflow_id: scenario_id,
            vehicle_id: None,
        };
        let response = self
            .client
            .post(self.trigger_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(scenario = %scenario_id, error = %e, "Trigger request failed");
                PulseError::TriggerRejected(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(scenario = %scenario_id, status = %status, "Backend rejected trigger");
            return Err(PulseError::TriggerRejected(format!("{status}: {text}")));
        }

        info!(scenario = %scenario_id, "Workflow triggered on backend");
        Ok(())
    }

    async fn health(&self) -> bool {
        match self.client.get(self.health_url()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn offline_source() -> HttpLiveSource {
        // Port 9 (discard) is closed on test hosts.
        HttpLiveSource::new("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_urls_derived_from_base() {
        let src = HttpLiveSource::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(src.base_url(), "http://localhost:8000");
        assert_eq!(src.trigger_url(), "http://localhost:8000/api/agents/trigger");
        assert_eq!(src.health_url(), "http://localhost:8000/health");
        assert_eq!(src.events_url(), "ws://localhost:8000/api/agents/events");

        let tls = HttpLiveSource::new("https://pulse.example.com", Duration::from_secs(5)).unwrap();
        assert_eq!(tls.events_url(), "wss://pulse.example.com/api/agents/events");
    }

    #[test]
    fn test_rejects_non_http_base() {
        let err = HttpLiveSource::new("ftp://x", Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, PulseError::ConfigError(_)));
    }

    #[test]
    fn test_trigger_body_shape() {
        let body = TriggerRequest {
            workflow_id: "predictive-flow",
            vehicle_id: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["workflow_id"], "predictive-flow");
        assert!(value["vehicle_id"].is_null());
    }

    #[tokio::test]
    async fn test_trigger_unreachable_is_fallback_error() {
        let err = offline_source().trigger("predictive-flow").await.unwrap_err();
        assert!(err.is_fallback_trigger());
    }

    #[tokio::test]
    async fn test_health_unreachable_is_false() {
        assert!(!offline_source().health().await);
    }

    #[tokio::test]
    async fn test_connect_unreachable_reports_error_once() {
        let events = Arc::new(AtomicUsize::new(0));
        let (err_tx, err_rx) = oneshot::channel();

        let e = Arc::clone(&events);
        let conn = offline_source().connect(
            Arc::new(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(move |err| {
                let _ = err_tx.send(err);
            }),
        );

        let err = tokio::time::timeout(Duration::from_secs(5), err_rx)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(err, PulseError::LiveUnavailable(_)));
        assert_eq!(events.load(Ordering::SeqCst), 0);
        conn.dispose();
    }
}
