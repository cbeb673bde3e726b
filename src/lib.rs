//! # aspectscan
//!
//! Measure the aspect ratio of short video clips and select the ones whose
//! content fills the frame.
//!
//! For every video, `aspectscan` computes two ratios rounded to two decimals:
//!
//! - the **frame ratio**, width over height of the declared frame;
//! - the **crop ratio**, width over height of the tight bounding box around
//!   the pixels brighter than a fixed threshold in the first frame that has
//!   any.
//!
//! A video with a black border (letterbox, pillarbox) has differing ratios.
//! Decoding is done with FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ### Measure One Video
//!
//! ```no_run
//! let estimate = aspectscan::estimate_ratios("v_Archery_abc.mp4")?;
//! println!(
//!     "frame {} crop {}",
//!     estimate.ratios.frame_ratio, estimate.ratios.crop_ratio
//! );
//! # Ok::<(), aspectscan::AspectError>(())
//! ```
//!
//! ### Run the Pipeline
//!
//! ```no_run
//! use aspectscan::{FfmpegEstimator, FilterOptions, PipelineConfig, batch, filter};
//!
//! let config = PipelineConfig::new("/data/HACS/training", "/work/stimulus_select");
//! let mut estimator = FfmpegEstimator::new();
//!
//! batch::run_first_pass(&config, &mut estimator)?;
//! batch::run_repair_pass(&config, &mut estimator)?;
//! let report = filter::run_filter(&config, &FilterOptions::default())?;
//! println!("{} videos selected", report.outcome.selected.len());
//! # Ok::<(), aspectscan::AspectError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. **First pass** ([`batch::run_first_pass`]): qualify rows of the
//!    duration table, measure each video, log failures to the failure log
//!    ([`failure_log`]), write the dataset table.
//! 2. **Repair pass** ([`batch::run_repair_pass`]): re-measure the logged
//!    videos and patch their rows.
//! 3. **Filter** ([`filter::run_filter`]): keep rows whose frame ratio lies
//!    within `mean ± 3·std` and whose crop ratio equals it, and build
//!    [`Histogram`]s of both ratios.
//!
//! The content box itself comes from [`crop::content_bounds`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
pub mod configuration;
pub mod crop;
pub mod dataset;
pub mod error;
pub mod failure_log;
pub mod ffmpeg;
pub mod filter;
pub mod histogram;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod ratio;
mod utilities;
pub mod video;

pub use batch::{PassSummary, run_first_pass, run_repair_pass};
pub use configuration::{PipelineConfig, QualificationCriteria};
pub use crop::BoundingBox;
pub use dataset::{Dataset, VideoRecord};
pub use error::AspectError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use filter::{FilterOptions, FilterOutcome, FilterReport, RatioWindow, filter_dataset, run_filter};
pub use histogram::Histogram;
pub use media::VideoFile;
pub use metadata::VideoMetadata;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use ratio::{
    AspectRatio, ContentSearch, FfmpegEstimator, RatioEstimate, RatioEstimator, RatioPair,
    estimate_ratios,
};
pub use video::{FrameReader, FrameSelection};
