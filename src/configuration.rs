//! Pipeline configuration.
//!
//! [`PipelineConfig`] is a builder carrying the dataset root, the working
//! directory and its file names, the qualification criteria, and the
//! progress callback through the drivers.
//!
//! # Example
//!
//! ```no_run
//! use aspectscan::{PipelineConfig, QualificationCriteria};
//!
//! let config = PipelineConfig::new("/data/HACS/training", "/work/stimulus_select")
//!     .with_dataset_file("dataset_v2.csv")
//!     .with_criteria(QualificationCriteria::default().with_duration_window(0.9, 1.1));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Which rows of the duration table are measured.
///
/// A row qualifies when `min_duration < duration < max_duration`, its subset
/// equals `subset`, and its label truncated to an integer equals `label`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualificationCriteria {
    /// Exclusive lower duration bound in seconds.
    pub min_duration: f64,
    /// Exclusive upper duration bound in seconds.
    pub max_duration: f64,
    /// Required `subset` value.
    pub subset: String,
    /// Required integer label.
    pub label: i64,
}

impl Default for QualificationCriteria {
    fn default() -> Self {
        Self {
            min_duration: 1.95,
            max_duration: 2.05,
            subset: "training".to_string(),
            label: 1,
        }
    }
}

impl QualificationCriteria {
    /// Set the exclusive duration window.
    #[must_use]
    pub fn with_duration_window(mut self, min_duration: f64, max_duration: f64) -> Self {
        self.min_duration = min_duration;
        self.max_duration = max_duration;
        self
    }

    /// Set the required subset name.
    #[must_use]
    pub fn with_subset(mut self, subset: impl Into<String>) -> Self {
        self.subset = subset.into();
        self
    }

    /// Set the required label.
    #[must_use]
    pub fn with_label(mut self, label: i64) -> Self {
        self.label = label;
        self
    }

    /// Duration and subset checks, without the label.
    pub(crate) fn matches_clip(&self, duration: f64, subset: &str) -> bool {
        duration > self.min_duration && duration < self.max_duration && subset == self.subset
    }
}

/// Configuration shared by the first pass, the repair pass and the filter.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Root of the `{class}/{video}` tree.
    pub(crate) dataset_root: PathBuf,
    /// Directory holding the tables and the failure log.
    pub(crate) working_dir: PathBuf,
    pub(crate) duration_file: String,
    pub(crate) dataset_file: String,
    pub(crate) failure_log_file: String,
    pub(crate) filtered_file: String,
    pub(crate) criteria: QualificationCriteria,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for PipelineConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineConfig")
            .field("dataset_root", &self.dataset_root)
            .field("working_dir", &self.working_dir)
            .field("duration_file", &self.duration_file)
            .field("dataset_file", &self.dataset_file)
            .field("failure_log_file", &self.failure_log_file)
            .field("filtered_file", &self.filtered_file)
            .field("criteria", &self.criteria)
            .finish_non_exhaustive()
    }
}

impl PipelineConfig {
    /// Create a configuration with the default file names:
    /// `duration.csv`, `dataset.csv`, `frame_ratio.txt`, `filtered.csv`.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(dataset_root: P, working_dir: Q) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            working_dir: working_dir.into(),
            duration_file: "duration.csv".to_string(),
            dataset_file: "dataset.csv".to_string(),
            failure_log_file: "frame_ratio.txt".to_string(),
            filtered_file: "filtered.csv".to_string(),
            criteria: QualificationCriteria::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set the qualification criteria.
    #[must_use]
    pub fn with_criteria(mut self, criteria: QualificationCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Name of the duration table inside the working directory.
    #[must_use]
    pub fn with_duration_file(mut self, name: impl Into<String>) -> Self {
        self.duration_file = name.into();
        self
    }

    /// Name of the dataset table inside the working directory.
    #[must_use]
    pub fn with_dataset_file(mut self, name: impl Into<String>) -> Self {
        self.dataset_file = name.into();
        self
    }

    /// Name of the failure log inside the working directory.
    #[must_use]
    pub fn with_failure_log_file(mut self, name: impl Into<String>) -> Self {
        self.failure_log_file = name.into();
        self
    }

    /// Name of the filtered table inside the working directory.
    #[must_use]
    pub fn with_filtered_file(mut self, name: impl Into<String>) -> Self {
        self.filtered_file = name.into();
        self
    }

    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn criteria(&self) -> &QualificationCriteria {
        &self.criteria
    }

    pub fn duration_path(&self) -> PathBuf {
        self.working_dir.join(&self.duration_file)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.working_dir.join(&self.dataset_file)
    }

    pub fn failure_log_path(&self) -> PathBuf {
        self.working_dir.join(&self.failure_log_file)
    }

    pub fn filtered_path(&self) -> PathBuf {
        self.working_dir.join(&self.filtered_file)
    }

    /// Location of a raw video: `{dataset_root}/{class}/{video}`.
    pub fn video_path(&self, class: &str, video: &str) -> PathBuf {
        self.dataset_root.join(class).join(video)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn default_criteria_window_is_exclusive() {
        let criteria = QualificationCriteria::default();
        assert!(criteria.matches_clip(2.0, "training"));
        assert!(criteria.matches_clip(2.049, "training"));
        assert!(!criteria.matches_clip(1.95, "training"));
        assert!(!criteria.matches_clip(2.05, "training"));
        assert!(!criteria.matches_clip(2.0, "validation"));
    }

    #[test]
    fn paths_are_joined_under_configured_roots() {
        let config = PipelineConfig::new("/data/HACS/training", "/work")
            .with_failure_log_file("failures.txt");
        assert_eq!(
            config.video_path("Archery", "v_Archery_x1.mp4"),
            PathBuf::from("/data/HACS/training/Archery/v_Archery_x1.mp4")
        );
        assert_eq!(config.failure_log_path(), PathBuf::from("/work/failures.txt"));
        assert_eq!(config.dataset_path(), PathBuf::from("/work/dataset.csv"));
    }
}
