//! Settings form and capture counter surface.

use crate::settings::{SettingsError, SettingsStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How long saved/error status messages stay visible
pub const STATUS_DISMISS_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Inline status line shown under the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
}

/// Rejected form input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter an API URL")]
    Empty,
    #[error("Invalid URL format")]
    InvalidUrl,
}

/// Check that the input is a syntactically valid absolute URL
pub fn validate_api_url(input: &str) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::Empty);
    }
    Url::parse(input).map_err(|_| ValidationError::InvalidUrl)?;
    Ok(())
}

/// The settings form over the store, plus the displayed capture count
pub struct SettingsPanel {
    store: Arc<SettingsStore>,
    api_url_field: String,
    capture_count: u64,
    status: Option<StatusMessage>,
}

impl SettingsPanel {
    /// Open the panel: load current settings into the form
    pub async fn open(store: Arc<SettingsStore>) -> Self {
        let api_url_field = store.raw_api_url().await.unwrap_or_default();
        let capture_count = store.capture_count().await;

        Self {
            store,
            api_url_field,
            capture_count,
            status: None,
        }
    }

    pub fn api_url_field(&self) -> &str {
        &self.api_url_field
    }

    pub fn capture_count(&self) -> u64 {
        self.capture_count
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Validate the form input and persist it
    ///
    /// Validation failures become an inline error status and leave the
    /// store untouched; a successful write shows a success status. The
    /// caller owns the dismiss timer for either outcome.
    pub async fn save(&mut self, input: &str) -> Result<(), SettingsError> {
        let trimmed = input.trim();

        if let Err(e) = validate_api_url(trimmed) {
            self.status = Some(StatusMessage {
                kind: StatusKind::Error,
                message: e.to_string(),
            });
            return Ok(());
        }

        self.store.set_api_url(trimmed.to_string()).await?;
        self.api_url_field = trimmed.to_string();
        self.status = Some(StatusMessage {
            kind: StatusKind::Success,
            message: "Settings saved successfully!".to_string(),
        });
        Ok(())
    }

    /// Count another capture: read the stored count, increment, write back
    ///
    /// The read-increment-write is intentionally not atomic across
    /// surfaces; see DESIGN.md.
    pub async fn record_capture(&mut self) -> Result<u64, SettingsError> {
        let count = self.store.capture_count().await + 1;
        self.store.set_capture_count(count).await?;
        self.capture_count = count;
        Ok(count)
    }

    pub fn dismiss_status(&mut self) {
        self.status = None;
    }
}
