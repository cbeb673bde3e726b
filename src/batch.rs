//! First-pass and repair-pass drivers.
//!
//! [`run_first_pass`] measures every qualifying video of the duration table
//! and writes the dataset table, logging failures instead of stopping.
//! [`run_repair_pass`] re-measures the videos named in the failure log and
//! patches their rows; any failure there aborts the pass.
//!
//! # Example
//!
//! ```no_run
//! use aspectscan::{FfmpegEstimator, PipelineConfig, batch};
//!
//! let config = PipelineConfig::new("/data/HACS/training", "/work/stimulus_select");
//! let mut estimator = FfmpegEstimator::new();
//!
//! let summary = batch::run_first_pass(&config, &mut estimator)?;
//! println!("{} of {} videos measured", summary.succeeded, summary.processed);
//!
//! batch::run_repair_pass(&config, &mut estimator)?;
//! # Ok::<(), aspectscan::AspectError>(())
//! ```

use crate::{
    configuration::PipelineConfig,
    dataset::Dataset,
    error::AspectError,
    failure_log::{FailureLogWriter, read_failed_videos},
    progress::{OperationType, ProgressTracker},
    ratio::{RatioEstimator, RatioPair},
};

/// Counts reported by a driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Videos the estimator was invoked for.
    pub processed: usize,
    /// Videos measured successfully.
    pub succeeded: usize,
    /// Videos whose measurement failed.
    pub failed: usize,
    /// Dataset rows whose ratios were written.
    pub rows_updated: usize,
}

/// Measure every qualifying video and write the dataset table.
///
/// Loads the duration table, keeps the qualifying rows, and visits them in
/// table order. A failing video gets a failure log line and keeps the unset
/// ratios. The table is written once, after the full pass.
///
/// # Errors
///
/// Only table and failure-log I/O errors are returned; estimator errors are
/// logged.
pub fn run_first_pass<E: RatioEstimator>(
    config: &PipelineConfig,
    estimator: &mut E,
) -> Result<PassSummary, AspectError> {
    let mut dataset = Dataset::load_qualified(config.duration_path(), config.criteria())?;
    let mut failure_log = FailureLogWriter::open(config.failure_log_path())?;
    let mut tracker = ProgressTracker::new(
        config.progress.clone(),
        OperationType::FirstPass,
        dataset.len() as u64,
    );
    let mut summary = PassSummary::default();

    for record in dataset.records_mut() {
        let video_path = config.video_path(&record.class, &record.video);
        summary.processed += 1;

        let succeeded = match estimator.estimate(&video_path) {
            Ok(estimate) => {
                record.ratios = estimate.ratios;
                summary.succeeded += 1;
                summary.rows_updated += 1;
                true
            }
            Err(error) => {
                log::warn!("Error processing {}: {error}", record.video);
                failure_log.record(&record.video, &error)?;
                record.ratios = RatioPair::UNSET;
                summary.failed += 1;
                false
            }
        };

        let info = tracker.advance(&record.video, succeeded);
        log::info!(
            "Finish computing frame size: {}/{}. Time spent {:.2}s",
            info.current,
            info.total,
            info.elapsed.as_secs_f64()
        );
    }

    dataset.write(config.dataset_path())?;
    log::info!(
        "First pass done: {} measured, {} failed, table written to {}",
        summary.succeeded,
        summary.failed,
        config.dataset_path().display()
    );
    Ok(summary)
}

/// Re-measure the videos named in the failure log and patch the table.
///
/// Every row whose `video` matches a logged name gets the new ratios. The
/// table is only rewritten when every logged video succeeds, so running the
/// pass again on the same inputs yields the same table.
///
/// # Errors
///
/// Returns the first estimator error, a malformed failure log entry, or a
/// table I/O error.
pub fn run_repair_pass<E: RatioEstimator>(
    config: &PipelineConfig,
    estimator: &mut E,
) -> Result<PassSummary, AspectError> {
    let mut dataset = Dataset::read(config.dataset_path())?;
    let failed_videos = read_failed_videos(config.failure_log_path())?;
    let mut tracker = ProgressTracker::new(
        config.progress.clone(),
        OperationType::RepairPass,
        failed_videos.len() as u64,
    );
    let mut summary = PassSummary::default();

    for failed in &failed_videos {
        let video_path = config.video_path(&failed.class, &failed.video);
        summary.processed += 1;

        let estimate = estimator.estimate(&video_path)?;
        let updated = dataset.update_ratios(&failed.video, estimate.ratios);
        if updated == 0 {
            log::warn!("Video {} is not in the dataset table", failed.video);
        }
        summary.succeeded += 1;
        summary.rows_updated += updated;

        log::info!(
            "Video {}: frame ratio {}; crop ratio: {}",
            failed.video,
            estimate.ratios.frame_ratio,
            estimate.ratios.crop_ratio
        );
        tracker.advance(&failed.video, true);
    }

    dataset.write(config.dataset_path())?;
    log::info!(
        "Repair pass done: {} videos re-measured, {} rows updated",
        summary.succeeded,
        summary.rows_updated
    );
    Ok(summary)
}
