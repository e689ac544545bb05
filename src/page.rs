//! Per-page capture workflow loop.
//!
//! One `PageIntegration` exists per attached page. It owns the selection
//! detector, the button controller, and a capture client, and consumes
//! page events one at a time. Timed resets and submissions are spawned
//! tasks that feed their outcome back into the same loop, so handlers
//! never overlap. Pending timers are not cleared on teardown; they fire
//! into a closed channel and are dropped.

use crate::button::{ButtonVisual, CaptureButton, ERROR_RESET_DELAY, SUCCESS_RESET_DELAY};
use crate::client::CaptureClient;
use crate::selection::{SelectionDecision, SelectionDetector, SELECTION_SETTLE_DELAY};
use crate::types::{CaptureError, CaptureResult, CapturedItem, PageContext, SelectionSnapshot};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events consumed by the page loop
#[derive(Debug)]
pub enum PageEvent {
    /// The user released the mouse; the snapshot is inspected after the
    /// settle delay
    MouseReleased { snapshot: SelectionSnapshot },
    /// Settle delay elapsed for this snapshot
    SelectionSettled { snapshot: SelectionSnapshot },
    /// The page selection changed
    SelectionChanged { collapsed: bool },
    /// A pointer-down somewhere on the page
    PointerDown {
        inside_button: bool,
        selection_collapsed: bool,
    },
    /// The capture button was clicked
    ButtonClicked,
    /// The spawned submission finished
    SubmissionFinished(Result<CaptureResult, CaptureError>),
    /// The success appearance has been up long enough
    SuccessShownElapsed,
    /// The error appearance has been up long enough
    ErrorShownElapsed,
}

/// Owns the capture workflow for one page
pub struct PageIntegration {
    context: PageContext,
    detector: SelectionDetector,
    button: CaptureButton,
    client: CaptureClient,
    /// Self-sender used by timers and submissions; weak so the loop ends
    /// once the host-facing senders are gone
    events: mpsc::WeakSender<PageEvent>,
    /// Visual updates for the host to render
    visuals: mpsc::Sender<ButtonVisual>,
}

impl PageIntegration {
    pub fn new(
        context: PageContext,
        client: CaptureClient,
        events: mpsc::Sender<PageEvent>,
        visuals: mpsc::Sender<ButtonVisual>,
    ) -> Self {
        Self {
            context,
            detector: SelectionDetector::new(),
            button: CaptureButton::new(),
            client,
            events: events.downgrade(),
            visuals,
        }
    }

    /// Consume events until the channel closes (page teardown)
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!("page session ended: {}", self.context.url);
    }

    async fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::MouseReleased { snapshot } => {
                self.schedule(
                    SELECTION_SETTLE_DELAY,
                    PageEvent::SelectionSettled { snapshot },
                );
            }

            PageEvent::SelectionSettled { snapshot } => {
                let applied = match self.detector.inspect(&snapshot) {
                    SelectionDecision::Show { rect, scroll } => self.button.show(&rect, &scroll),
                    SelectionDecision::Hide => self.button.hide(),
                };
                if applied {
                    self.push_visual().await;
                }
            }

            PageEvent::SelectionChanged { collapsed } => {
                if collapsed && self.button.hide() {
                    self.push_visual().await;
                }
            }

            PageEvent::PointerDown {
                inside_button,
                selection_collapsed,
            } => {
                if !inside_button && selection_collapsed && self.button.hide() {
                    self.push_visual().await;
                }
            }

            PageEvent::ButtonClicked => self.begin_capture().await,

            PageEvent::SubmissionFinished(Ok(result)) => {
                info!("captured to topic {}", result.topic);
                if self.button.submission_succeeded() {
                    self.push_visual().await;
                    self.schedule(SUCCESS_RESET_DELAY, PageEvent::SuccessShownElapsed);
                }
            }

            PageEvent::SubmissionFinished(Err(e)) => {
                warn!("capture failed: {}", e);
                if self.button.submission_failed() {
                    self.push_visual().await;
                    self.schedule(ERROR_RESET_DELAY, PageEvent::ErrorShownElapsed);
                }
            }

            PageEvent::SuccessShownElapsed => {
                if self.button.reset_after_success() {
                    self.push_visual().await;
                }
            }

            PageEvent::ErrorShownElapsed => {
                if self.button.reset_after_error() {
                    self.push_visual().await;
                }
            }
        }
    }

    /// Start a submission for the pending capture text, if any
    async fn begin_capture(&mut self) {
        let Some(text) = self.detector.pending_text() else {
            return;
        };

        if !self.button.begin_submission() {
            return;
        }
        self.push_visual().await;

        let item = CapturedItem {
            text: text.to_string(),
            url: self.context.url.clone(),
            page_title: self.context.title.clone(),
        };

        let Some(events) = self.events.upgrade() else {
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.submit(&item).await;
            let _ = events.send(PageEvent::SubmissionFinished(result)).await;
        });
    }

    fn schedule(&self, delay: Duration, event: PageEvent) {
        let Some(events) = self.events.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event).await;
        });
    }

    async fn push_visual(&self) {
        // the host may already be gone; nothing to do then
        let _ = self.visuals.send(self.button.visual()).await;
    }
}
