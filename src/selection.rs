//! Selection inspection and capture-affordance decisions.

use crate::types::{ScrollOffset, SelectionRect, SelectionSnapshot};
use std::time::Duration;

/// Trimmed selections must be strictly longer than this to qualify
pub const MIN_CAPTURE_LEN: usize = 10;

/// Delay between mouse release and selection inspection, letting the host
/// finalize the selection range before it is measured
pub const SELECTION_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Outcome of inspecting a selection snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionDecision {
    /// Show the capture button anchored to the selection
    Show {
        rect: SelectionRect,
        scroll: ScrollOffset,
    },
    /// Hide the capture button
    Hide,
}

/// Watches selection snapshots and remembers the pending capture text
#[derive(Debug, Default)]
pub struct SelectionDetector {
    pending_text: Option<String>,
}

impl SelectionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect a snapshot taken after mouse release
    ///
    /// A qualifying selection records its trimmed text as the pending
    /// capture text and requests the button; anything else requests a hide.
    /// The pending text survives a hide, so a still-valid earlier selection
    /// can be captured until it is replaced.
    pub fn inspect(&mut self, snapshot: &SelectionSnapshot) -> SelectionDecision {
        let Some(selection) = &snapshot.selection else {
            return SelectionDecision::Hide;
        };

        let trimmed = selection.text.trim();
        if trimmed.chars().count() > MIN_CAPTURE_LEN {
            self.pending_text = Some(trimmed.to_string());
            SelectionDecision::Show {
                rect: selection.rect,
                scroll: snapshot.scroll,
            }
        } else {
            SelectionDecision::Hide
        }
    }

    /// Text that a button click would submit, if any selection qualified yet
    pub fn pending_text(&self) -> Option<&str> {
        self.pending_text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Selection;

    fn snapshot(text: &str) -> SelectionSnapshot {
        SelectionSnapshot {
            selection: Some(Selection {
                text: text.to_string(),
                rect: SelectionRect::new(120.0, 40.0, 200.0, 18.0),
            }),
            scroll: ScrollOffset { x: 0.0, y: 300.0 },
        }
    }

    #[test]
    fn test_short_selection_never_shows() {
        let mut detector = SelectionDetector::new();

        assert_eq!(detector.inspect(&snapshot("")), SelectionDecision::Hide);
        assert_eq!(detector.inspect(&snapshot("short")), SelectionDecision::Hide);
        // exactly 10 trimmed chars is still too short
        assert_eq!(
            detector.inspect(&snapshot("abcdefghij")),
            SelectionDecision::Hide
        );
        assert_eq!(detector.pending_text(), None);
    }

    #[test]
    fn test_whitespace_padding_does_not_qualify() {
        let mut detector = SelectionDetector::new();

        let decision = detector.inspect(&snapshot("   tiny      \n\t   "));
        assert_eq!(decision, SelectionDecision::Hide);
        assert_eq!(detector.pending_text(), None);
    }

    #[test]
    fn test_qualifying_selection_shows_anchored_to_rect() {
        let mut detector = SelectionDetector::new();

        let decision = detector.inspect(&snapshot("a dozen chars"));
        assert_eq!(
            decision,
            SelectionDecision::Show {
                rect: SelectionRect::new(120.0, 40.0, 200.0, 18.0),
                scroll: ScrollOffset { x: 0.0, y: 300.0 },
            }
        );
        assert_eq!(detector.pending_text(), Some("a dozen chars"));
    }

    #[test]
    fn test_pending_text_is_trimmed() {
        let mut detector = SelectionDetector::new();

        detector.inspect(&snapshot("  padded selection text  "));
        assert_eq!(detector.pending_text(), Some("padded selection text"));
    }

    #[test]
    fn test_collapsed_selection_hides() {
        let mut detector = SelectionDetector::new();
        detector.inspect(&snapshot("a qualifying selection"));

        let collapsed = SelectionSnapshot {
            selection: None,
            scroll: ScrollOffset::default(),
        };
        assert_eq!(detector.inspect(&collapsed), SelectionDecision::Hide);
        // the earlier capture text is kept until replaced
        assert_eq!(detector.pending_text(), Some("a qualifying selection"));
    }
}
