//! Cross-surface capture notifications.
//!
//! Successful captures are broadcast to every currently subscribed surface
//! (notification logger, settings panel). Delivery is at-most-once and
//! fire-and-forget: a notice published while nothing is subscribed is lost.

use crate::types::CaptureResult;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 100;

/// A successful capture, as delivered to subscribed surfaces
#[derive(Debug, Clone)]
pub struct CaptureNotice {
    pub result: CaptureResult,
    pub captured_at: DateTime<Utc>,
}

/// Broadcast handle shared by publishers and subscribers
#[derive(Debug, Clone)]
pub struct NotificationRelay {
    tx: broadcast::Sender<CaptureNotice>,
}

impl NotificationRelay {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a capture success to whoever is listening right now
    pub fn publish(&self, result: CaptureResult) {
        let notice = CaptureNotice {
            result,
            captured_at: Utc::now(),
        };

        match self.tx.send(notice) {
            Ok(receivers) => debug!("capture notice delivered to {} surface(s)", receivers),
            Err(_) => debug!("capture notice dropped, no surface subscribed"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureNotice> {
        self.tx.subscribe()
    }

    /// Number of currently subscribed surfaces
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationRelay {
    fn default() -> Self {
        Self::new()
    }
}
