//! Suspends the simulation while the canvas is off screen.

use crate::field::ParticleField;
use tracing::debug;

/// Tracks viewport visibility and decides whether a frame should advance.
///
/// While hidden, frames are skipped entirely. The first frame after becoming
/// visible again re-baselines the field's clock so the flow does not jump by
/// the time spent hidden.
#[derive(Debug, Clone, Default)]
pub struct VisibilityGate {
    visible: bool,
    resumed: bool,
}

impl VisibilityGate {
    /// A gate that starts hidden, as a canvas does before its first
    /// intersection report.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Records a visibility report. Returns true on a hidden → visible edge.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        let became_visible = visible && !self.visible;
        if became_visible {
            self.resumed = true;
        }
        if visible != self.visible {
            debug!(visible, "particle field visibility changed");
        }
        self.visible = visible;
        became_visible
    }

    /// Advances `field` to `timestamp_ms` if visible. Returns whether the
    /// frame ran.
    pub fn advance(&mut self, field: &mut ParticleField, timestamp_ms: f64) -> bool {
        if !self.visible {
            return false;
        }
        if std::mem::take(&mut self.resumed) {
            field.rebaseline();
        }
        field.advance_frame(timestamp_ms);
        true
    }
}
