//! Floating capture button state machine.
//!
//! One controller exists per page session. Transitions are strictly
//! sequential; a trigger that is not listed for the current state is
//! ignored. Every applied transition yields a fresh visual for the host.

use crate::types::{ButtonState, ScrollOffset, SelectionRect};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How long the success appearance stays up before the button hides
pub const SUCCESS_RESET_DELAY: Duration = Duration::from_millis(1500);

/// How long the error appearance stays up before returning to idle
pub const ERROR_RESET_DELAY: Duration = Duration::from_millis(2000);

/// Vertical rise above the selection, in page pixels
const ANCHOR_RISE: f64 = 40.0;

/// Half the button width, used to center it over the selection
const ANCHOR_HALF_WIDTH: f64 = 50.0;

/// Button placement in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonPosition {
    pub top: f64,
    pub left: f64,
}

/// Place the button above the horizontal middle of the selection,
/// converting the viewport rectangle to page coordinates
pub fn anchor_position(rect: &SelectionRect, scroll: &ScrollOffset) -> ButtonPosition {
    ButtonPosition {
        top: rect.top + scroll.y - ANCHOR_RISE,
        left: rect.left + scroll.x + rect.width / 2.0 - ANCHOR_HALF_WIDTH,
    }
}

/// Visual update pushed to the host after every applied transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonVisual {
    pub state: ButtonState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<ButtonPosition>,
}

/// The capture button controller
#[derive(Debug)]
pub struct CaptureButton {
    state: ButtonState,
    position: Option<ButtonPosition>,
}

impl CaptureButton {
    pub fn new() -> Self {
        Self {
            state: ButtonState::Hidden,
            position: None,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn position(&self) -> Option<ButtonPosition> {
        self.position
    }

    pub fn visual(&self) -> ButtonVisual {
        ButtonVisual {
            state: self.state,
            position: self.position,
        }
    }

    /// Show request from the selection detector
    ///
    /// Reveals a hidden button, or repositions one that is already idle.
    pub fn show(&mut self, rect: &SelectionRect, scroll: &ScrollOffset) -> bool {
        match self.state {
            ButtonState::Hidden | ButtonState::Idle => {
                self.position = Some(anchor_position(rect, scroll));
                self.state = ButtonState::Idle;
                true
            }
            _ => self.ignore("show"),
        }
    }

    /// Hide request (collapsed selection, or an outside pointer-down)
    pub fn hide(&mut self) -> bool {
        match self.state {
            ButtonState::Idle => {
                self.state = ButtonState::Hidden;
                self.position = None;
                true
            }
            _ => self.ignore("hide"),
        }
    }

    /// A click on the idle button starts a submission
    pub fn begin_submission(&mut self) -> bool {
        match self.state {
            ButtonState::Idle => {
                self.state = ButtonState::Loading;
                true
            }
            _ => self.ignore("click"),
        }
    }

    pub fn submission_succeeded(&mut self) -> bool {
        match self.state {
            ButtonState::Loading => {
                self.state = ButtonState::Success;
                true
            }
            _ => self.ignore("success"),
        }
    }

    pub fn submission_failed(&mut self) -> bool {
        match self.state {
            ButtonState::Loading => {
                self.state = ButtonState::Error;
                true
            }
            _ => self.ignore("failure"),
        }
    }

    /// Timed reset after the success appearance: back to hidden
    pub fn reset_after_success(&mut self) -> bool {
        match self.state {
            ButtonState::Success => {
                self.state = ButtonState::Hidden;
                self.position = None;
                true
            }
            _ => self.ignore("success reset"),
        }
    }

    /// Timed reset after the error appearance: back to idle, still visible
    pub fn reset_after_error(&mut self) -> bool {
        match self.state {
            ButtonState::Error => {
                self.state = ButtonState::Idle;
                true
            }
            _ => self.ignore("error reset"),
        }
    }

    fn ignore(&self, trigger: &str) -> bool {
        debug!("{} ignored in {} state", trigger, self.state.as_str());
        false
    }
}

impl Default for CaptureButton {
    fn default() -> Self {
        Self::new()
    }
}
