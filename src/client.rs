//! HTTP submission of captured selections.

use crate::relay::NotificationRelay;
use crate::settings::SettingsStore;
use crate::types::{CaptureError, CaptureResult, CapturedItem};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Success envelope returned by the capture endpoint
#[derive(Debug, Deserialize)]
struct CaptureEnvelope {
    data: CaptureResult,
}

/// Client for the remote capture endpoint
#[derive(Debug, Clone)]
pub struct CaptureClient {
    http: reqwest::Client,
    settings: Arc<SettingsStore>,
    relay: NotificationRelay,
}

impl CaptureClient {
    pub fn new(settings: Arc<SettingsStore>, relay: NotificationRelay) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            relay,
        }
    }

    /// Submit a captured item to `{apiUrl}/capture`
    ///
    /// A non-2xx status or an unparseable success body is a failure; a
    /// parsed success is published through the relay before returning.
    /// There is no retry and no cancellation.
    pub async fn submit(&self, item: &CapturedItem) -> Result<CaptureResult, CaptureError> {
        let api_url = self.settings.api_url().await;
        let endpoint = capture_endpoint(&api_url);
        debug!("submitting {} chars to {}", item.text.len(), endpoint);

        let response = self.http.post(&endpoint).json(item).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptureError::HttpStatus(status.as_u16()));
        }

        let envelope: CaptureEnvelope =
            response.json().await.map_err(CaptureError::Malformed)?;

        self.relay.publish(envelope.data.clone());
        Ok(envelope.data)
    }
}

fn capture_endpoint(api_url: &str) -> String {
    format!("{}/capture", api_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_API_URL;

    #[test]
    fn test_capture_endpoint_join() {
        assert_eq!(
            capture_endpoint("https://api.example.com"),
            "https://api.example.com/capture"
        );
    }

    #[test]
    fn test_default_endpoint_targets_localhost() {
        assert_eq!(
            capture_endpoint(DEFAULT_API_URL),
            "http://localhost:8000/capture"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_store_submits_to_default() {
        let settings = Arc::new(SettingsStore::in_memory());
        assert_eq!(
            capture_endpoint(&settings.api_url().await),
            "http://localhost:8000/capture"
        );
    }
}
