//! Per-row progress reporting.
//!
//! The batch drivers emit a [`ProgressInfo`] after every processed video.
//! The binary turns these into an `indicatif` progress bar; library users can
//! plug in any [`ProgressCallback`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use aspectscan::{PipelineConfig, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} {}", info.current, info.total, info.video);
//!     }
//! }
//!
//! let config = PipelineConfig::new("/data/HACS/training", "/work/stimulus_select")
//!     .with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which driver is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Measuring every qualifying video.
    FirstPass,
    /// Re-measuring videos named in the failure log.
    RepairPass,
}

/// A snapshot of driver progress, delivered after each video.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which driver is running.
    pub operation: OperationType,
    /// Videos processed so far (one-based).
    pub current: u64,
    /// Videos in this pass.
    pub total: u64,
    /// Completion percentage, from 0.0 to 100.0.
    pub percentage: f32,
    /// Wall-clock time since the pass started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Name of the video just processed.
    pub video: String,
    /// Whether the estimator succeeded for it.
    pub succeeded: bool,
}

/// Receives progress updates from the drivers.
///
/// Callbacks observe only; they cannot stop a pass.
pub trait ProgressCallback: Send + Sync {
    /// Called once per processed video.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Default callback that discards all notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one pass and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: u64,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one processed video and notify the callback.
    pub(crate) fn advance(&mut self, video: &str, succeeded: bool) -> ProgressInfo {
        self.current += 1;
        let elapsed = self.start_time.elapsed();

        let percentage = if self.total > 0 {
            (self.current as f32 / self.total as f32) * 100.0
        } else {
            100.0
        };

        let remaining = self.total.saturating_sub(self.current);
        let estimated_remaining = (remaining > 0)
            .then(|| elapsed.mul_f64(remaining as f64 / self.current as f64));

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            video: video.to_string(),
            succeeded,
        };

        self.callback.on_progress(&info);
        info
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct Recording(Mutex<Vec<ProgressInfo>>);

    impl ProgressCallback for Recording {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn tracker_counts_and_finishes_at_full_percentage() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let mut tracker = ProgressTracker::new(recording.clone(), OperationType::FirstPass, 2);

        tracker.advance("v_a.mp4", true);
        let last = tracker.advance("v_b.mp4", false);

        assert_eq!(last.current, 2);
        assert!((last.percentage - 100.0).abs() < f32::EPSILON);
        assert!(last.estimated_remaining.is_none());

        let seen = recording.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].video, "v_a.mp4");
        assert!(!seen[1].succeeded);
    }
}
