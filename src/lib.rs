//! Selection Capture Agent
//!
//! Drives the selection-to-capture workflow: a host page reports text
//! selections over the bridge, the agent shows a floating capture button,
//! submits the captured text to a remote endpoint, and fans successful
//! captures out to subscribed surfaces.

pub mod bridge;
pub mod button;
pub mod client;
pub mod page;
pub mod panel;
pub mod relay;
pub mod selection;
pub mod settings;
pub mod types;

pub use bridge::{BridgeConfig, HostBridge};
pub use button::CaptureButton;
pub use client::CaptureClient;
pub use page::{PageEvent, PageIntegration};
pub use panel::SettingsPanel;
pub use relay::{CaptureNotice, NotificationRelay};
pub use selection::SelectionDetector;
pub use settings::SettingsStore;
pub use types::{ButtonState, CaptureError, CaptureResult, CapturedItem};
