//! Core types for the capture workflow.
//!
//! This module defines the data structures shared between the selection
//! detector, the button controller, and the capture client.

use serde::{Deserialize, Serialize};

/// Viewport-relative bounding rectangle of a text selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Page scroll offsets at the moment a selection was measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// A live text selection as reported by the host page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected text, exactly as the host read it
    pub text: String,
    /// Bounding rectangle of the selection range (viewport coordinates)
    pub rect: SelectionRect,
}

/// Selection state captured at a single instant
///
/// `selection` is `None` when the selection is collapsed or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub selection: Option<Selection>,
    #[serde(default)]
    pub scroll: ScrollOffset,
}

/// Identity of the page a session is attached to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub title: String,
}

/// Payload POSTed to the capture endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedItem {
    /// The captured selection text
    pub text: String,
    /// URL of the page the text was selected on
    pub url: String,
    /// Title of that page
    pub page_title: String,
}

/// Server-assigned result of a capture
///
/// `topic` is the only field the agent interprets; everything else the
/// endpoint returns is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub topic: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Visual states of the floating capture button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    Hidden,
    Idle,
    Loading,
    Success,
    Error,
}

impl ButtonState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonState::Hidden => "hidden",
            ButtonState::Idle => "idle",
            ButtonState::Loading => "loading",
            ButtonState::Success => "success",
            ButtonState::Error => "error",
        }
    }
}

/// Errors that can occur during a capture submission
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("capture endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("capture endpoint returned an unparseable body: {0}")]
    Malformed(#[source] reqwest::Error),
}
