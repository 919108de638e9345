//! Frame timing monitor that classifies rendering performance into tiers.
//!
//! A `FrameMonitor` is an ordinary value: whoever owns the animation loop
//! constructs it, calls [`FrameMonitor::start`] / [`FrameMonitor::stop`]
//! around the loop, and feeds it frame timestamps. It never touches the
//! document; consumers decide what a [`QualityTier`] change means for them.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Frame gaps longer than this are treated as a pause (tab hidden, debugger)
/// rather than a slow frame.
const MAX_FRAME_GAP_MS: f64 = 1000.0;

/// Coarse rendering budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Minimal,
    Reduced,
    Full,
}

impl QualityTier {
    /// Fraction of the configured particle count to keep.
    pub fn particle_scale(self) -> f64 {
        match self {
            QualityTier::Full => 1.0,
            QualityTier::Reduced => 0.6,
            QualityTier::Minimal => 0.3,
        }
    }

    /// Fraction of the configured per-particle connection cap to keep.
    pub fn connection_scale(self) -> f64 {
        match self {
            QualityTier::Full => 1.0,
            QualityTier::Reduced => 0.5,
            QualityTier::Minimal => 0.0,
        }
    }

    pub fn glow_enabled(self) -> bool {
        self == QualityTier::Full
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::Full => "full",
            QualityTier::Reduced => "reduced",
            QualityTier::Minimal => "minimal",
        }
    }
}

/// Thresholds for tier changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Number of frame intervals averaged per decision.
    pub window: usize,
    /// Average FPS below which the tier drops to `Reduced`.
    pub reduced_below_fps: f64,
    /// Average FPS below which the tier drops to `Minimal`.
    pub minimal_below_fps: f64,
    /// Average FPS at or above which the tier returns to `Full`.
    pub recover_above_fps: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window: 60,
            reduced_below_fps: 45.0,
            minimal_below_fps: 25.0,
            recover_above_fps: 55.0,
        }
    }
}

/// Rolling frame-interval monitor.
#[derive(Debug, Clone)]
pub struct FrameMonitor {
    config: MonitorConfig,
    running: bool,
    last_timestamp: Option<f64>,
    intervals: VecDeque<f64>,
    tier: QualityTier,
}

impl FrameMonitor {
    /// Creates a stopped monitor at `QualityTier::Full`.
    pub fn new(config: MonitorConfig) -> Self {
        let window = config.window.max(1);
        Self {
            config: MonitorConfig { window, ..config },
            running: false,
            last_timestamp: None,
            intervals: VecDeque::with_capacity(window),
            tier: QualityTier::Full,
        }
    }

    /// Begins sampling. Any previous samples are discarded; the tier is kept.
    pub fn start(&mut self) {
        self.running = true;
        self.last_timestamp = None;
        self.intervals.clear();
    }

    /// Stops sampling. `record` is a no-op until the next `start`.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_timestamp = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Number of intervals currently in the window.
    pub fn sample_count(&self) -> usize {
        self.intervals.len()
    }

    /// Average FPS over the current window, if any intervals were recorded.
    pub fn average_fps(&self) -> Option<f64> {
        if self.intervals.is_empty() {
            return None;
        }
        let mean = self.intervals.iter().sum::<f64>() / self.intervals.len() as f64;
        (mean > 0.0).then(|| 1000.0 / mean)
    }

    /// Records a frame timestamp in milliseconds.
    ///
    /// Returns the new tier when this sample completes a window that changes
    /// it. The window restarts after every change so each decision is made
    /// on fresh frames.
    pub fn record(&mut self, timestamp_ms: f64) -> Option<QualityTier> {
        if !self.running || !timestamp_ms.is_finite() {
            return None;
        }
        let previous = self.last_timestamp.replace(timestamp_ms);
        let interval = timestamp_ms - previous?;
        if interval <= 0.0 || interval > MAX_FRAME_GAP_MS {
            return None;
        }
        if self.intervals.len() == self.config.window {
            self.intervals.pop_front();
        }
        self.intervals.push_back(interval);
        if self.intervals.len() < self.config.window {
            return None;
        }

        let fps = self.average_fps()?;
        let next = self.classify(fps);
        if next == self.tier {
            return None;
        }
        self.tier = next;
        self.intervals.clear();
        Some(next)
    }

    fn classify(&self, fps: f64) -> QualityTier {
        let c = &self.config;
        if fps < c.minimal_below_fps {
            QualityTier::Minimal
        } else if fps < c.reduced_below_fps {
            QualityTier::Reduced
        } else if fps >= c.recover_above_fps {
            QualityTier::Full
        } else if self.tier == QualityTier::Minimal {
            QualityTier::Reduced
        } else {
            self.tier
        }
    }
}

impl Default for FrameMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}
