//! Filter stage.
//!
//! Keeps the videos whose frame ratio is statistically normal (inside
//! `mean ± 3·std` of all frame ratios, bounds included) and whose content
//! fills the frame (`frame_ratio == crop_ratio` to two decimals).
//!
//! # Example
//!
//! ```no_run
//! use aspectscan::{Dataset, filter::filter_dataset};
//!
//! let dataset = Dataset::read("/work/stimulus_select/dataset.csv")?;
//! let outcome = filter_dataset(&dataset)?;
//! println!(
//!     "kept {} of {} (window {:.3}..={:.3})",
//!     outcome.selected.len(),
//!     dataset.len(),
//!     outcome.window.lower,
//!     outcome.window.upper
//! );
//! # Ok::<(), aspectscan::AspectError>(())
//! ```

use std::path::PathBuf;

use crate::{
    configuration::PipelineConfig,
    dataset::Dataset,
    error::AspectError,
    histogram::{DEFAULT_BINS, Histogram},
};

/// Width of the inclusion window in standard deviations.
pub const OUTLIER_SIGMAS: f64 = 3.0;

/// Inclusion window derived from the frame ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioWindow {
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator); `0` for one value.
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
}

impl RatioWindow {
    /// Derive the window from a set of ratios.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::EmptyDataset`] when `values` is empty.
    pub fn from_values(values: &[f64]) -> Result<Self, AspectError> {
        if values.is_empty() {
            return Err(AspectError::EmptyDataset);
        }
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let std_dev = if values.len() > 1 {
            let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (count - 1.0)).sqrt()
        } else {
            0.0
        };
        Ok(Self {
            mean,
            std_dev,
            lower: mean - OUTLIER_SIGMAS * std_dev,
            upper: mean + OUTLIER_SIGMAS * std_dev,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Result of filtering a dataset.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub window: RatioWindow,
    /// Rows that passed both checks, in table order.
    pub selected: Dataset,
    /// Rows whose frame ratio fell outside the window.
    pub outliers: usize,
    /// In-window rows whose crop ratio differs from the frame ratio.
    pub mismatched: usize,
}

/// Select the rows with a normal frame ratio and no black border.
///
/// # Errors
///
/// Returns [`AspectError::EmptyDataset`] for a table without rows.
pub fn filter_dataset(dataset: &Dataset) -> Result<FilterOutcome, AspectError> {
    let frame_ratios: Vec<f64> = dataset
        .records()
        .iter()
        .map(|record| record.ratios.frame_ratio.value())
        .collect();
    let window = RatioWindow::from_values(&frame_ratios)?;

    let mut outliers = 0;
    let mut mismatched = 0;
    let selected = dataset.select(|record| {
        if !window.contains(record.ratios.frame_ratio.value()) {
            outliers += 1;
            false
        } else if !record.ratios.is_consistent() {
            mismatched += 1;
            false
        } else {
            true
        }
    });

    log::info!(
        "Frame ratio window {:.4}..={:.4} (mean {:.4}, std {:.4}): kept {}, {} outliers, {} with black borders",
        window.lower,
        window.upper,
        window.mean,
        window.std_dev,
        selected.len(),
        outliers,
        mismatched
    );

    Ok(FilterOutcome {
        window,
        selected,
        outliers,
        mismatched,
    })
}

/// Options for [`run_filter`].
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Number of histogram bins.
    pub bins: usize,
    /// Where to save `frame_ratio_hist.png` and `crop_ratio_hist.png`.
    pub histogram_dir: Option<PathBuf>,
    /// Destination of the selected rows; `None` uses the configured
    /// filtered table.
    pub output: Option<PathBuf>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            histogram_dir: None,
            output: None,
        }
    }
}

/// Everything the filter stage produces.
#[derive(Debug, Clone)]
pub struct FilterReport {
    pub outcome: FilterOutcome,
    pub frame_histogram: Histogram,
    pub crop_histogram: Histogram,
    /// Path the selected rows were written to.
    pub output: PathBuf,
}

/// Read the dataset table, filter it, write the selection and build the
/// histograms.
pub fn run_filter(
    config: &PipelineConfig,
    options: &FilterOptions,
) -> Result<FilterReport, AspectError> {
    let dataset = Dataset::read(config.dataset_path())?;

    let (frame_ratios, crop_ratios): (Vec<f64>, Vec<f64>) = dataset
        .records()
        .iter()
        .map(|record| {
            (
                record.ratios.frame_ratio.value(),
                record.ratios.crop_ratio.value(),
            )
        })
        .unzip();
    let frame_histogram = Histogram::from_values("frame_ratio", &frame_ratios, options.bins)?;
    let crop_histogram = Histogram::from_values("crop_ratio", &crop_ratios, options.bins)?;

    if let Some(directory) = &options.histogram_dir {
        std::fs::create_dir_all(directory)?;
        frame_histogram.save(directory.join("frame_ratio_hist.png"))?;
        crop_histogram.save(directory.join("crop_ratio_hist.png"))?;
    }

    let outcome = filter_dataset(&dataset)?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| config.filtered_path());
    outcome.selected.write(&output)?;

    Ok(FilterReport {
        outcome,
        frame_histogram,
        crop_histogram,
        output,
    })
}
