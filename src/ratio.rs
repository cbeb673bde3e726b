//! Aspect ratios and the frame-ratio estimator.
//!
//! [`AspectRatio`] is a width/height ratio rounded to two decimal places and
//! stored as whole hundredths, so `frame_ratio == crop_ratio` is an exact
//! comparison. [`FfmpegEstimator`] measures both ratios of a video file:
//! the frame ratio from the stream's declared dimensions, the crop ratio from
//! the first candidate frame that has visible content.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::ControlFlow,
    path::Path,
    str::FromStr,
};

use image::RgbImage;

use crate::{
    crop::{BRIGHTNESS_THRESHOLD, BoundingBox, content_bounds},
    error::AspectError,
    media::VideoFile,
    video::FrameSelection,
};

/// A width/height ratio rounded to two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AspectRatio {
    hundredths: u32,
}

impl AspectRatio {
    /// Sentinel for a ratio that has not been computed yet.
    pub const UNSET: AspectRatio = AspectRatio { hundredths: 0 };

    /// Round `width / height` to two decimals, ties to even.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::InvalidDimensions`] if either side is zero.
    pub fn from_dimensions(width: u32, height: u32) -> Result<Self, AspectError> {
        if width == 0 || height == 0 {
            return Err(AspectError::InvalidDimensions { width, height });
        }
        Ok(Self::from_f64(width as f64 / height as f64))
    }

    /// Round an arbitrary non-negative value to two decimals.
    ///
    /// Rounding works on the exact binary value, ties to even: `7.0 / 40.0`
    /// is stored just below `0.175` and becomes `0.17`. Scaling by 100 first
    /// would round that product up to `17.5` and give `0.18`.
    ///
    /// Negative and non-finite inputs, and values too large to hold, collapse
    /// to [`AspectRatio::UNSET`].
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::UNSET;
        }
        // Float formatting rounds the exact decimal expansion.
        let digits: String = format!("{value:.2}").chars().filter(|&c| c != '.').collect();
        digits
            .parse()
            .map_or(Self::UNSET, |hundredths| Self { hundredths })
    }

    /// The ratio as a float (`1.78`).
    pub fn value(self) -> f64 {
        self.hundredths as f64 / 100.0
    }

    /// The ratio in whole hundredths (`178`).
    pub fn hundredths(self) -> u32 {
        self.hundredths
    }

    /// Returns `true` for the not-yet-computed sentinel.
    pub fn is_unset(self) -> bool {
        self.hundredths == 0
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|error| format!("invalid ratio '{value}': {error}"))?;
        if parsed < 0.0 || !parsed.is_finite() {
            return Err(format!("invalid ratio '{value}'"));
        }
        Ok(Self::from_f64(parsed))
    }
}

/// Raw-frame and content ratios of one video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatioPair {
    /// Ratio of the declared frame dimensions.
    pub frame_ratio: AspectRatio,
    /// Ratio of the visible-content bounding box.
    pub crop_ratio: AspectRatio,
}

impl RatioPair {
    /// Both ratios at the not-yet-computed sentinel.
    pub const UNSET: RatioPair = RatioPair {
        frame_ratio: AspectRatio::UNSET,
        crop_ratio: AspectRatio::UNSET,
    };

    /// Returns `true` when the content fills the frame (no black border).
    pub fn is_consistent(&self) -> bool {
        self.frame_ratio == self.crop_ratio
    }
}

/// Result of a successful estimation.
#[derive(Debug, Clone)]
pub struct RatioEstimate {
    /// The two rounded ratios.
    pub ratios: RatioPair,
    /// Zero-based number of the frame the crop box came from.
    pub frame_index: u64,
    /// Declared frame dimensions `(width, height)`.
    pub frame_size: (u32, u32),
    /// Visible-content bounds in that frame.
    pub crop: BoundingBox,
}

/// Anything that can turn a video path into a [`RatioEstimate`].
///
/// The batch and repair drivers are generic over this trait.
pub trait RatioEstimator {
    /// Measure the frame and crop ratios of the video at `path`.
    fn estimate(&mut self, path: &Path) -> Result<RatioEstimate, AspectError>;
}

/// Estimator that decodes the video with FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEstimator {
    selection: FrameSelection,
}

impl FfmpegEstimator {
    /// Estimator that tries every frame, starting from frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the candidate frames.
    pub fn with_selection(mut self, selection: FrameSelection) -> Self {
        self.selection = selection;
        self
    }

    /// The candidate frames each estimate walks.
    pub fn selection(&self) -> FrameSelection {
        self.selection
    }
}

/// Scan state for the first frame with visible content.
///
/// Feed decoded frames in order to [`ContentSearch::inspect`]; it breaks as
/// soon as one has a content box. Frames without one are skipped.
///
/// # Example
///
/// ```
/// use std::path::Path;
///
/// use aspectscan::ratio::ContentSearch;
/// use image::{Rgb, RgbImage};
///
/// let mut search = ContentSearch::new();
/// assert!(search.inspect(0, &RgbImage::new(16, 9)).is_continue());
/// assert!(search.inspect(1, &RgbImage::from_pixel(16, 9, Rgb([200, 200, 200]))).is_break());
///
/// let (frame_index, bounds) = search.finish(Path::new("clip.mp4")).unwrap();
/// assert_eq!((frame_index, bounds.width()), (1, 16));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentSearch {
    frames_tried: u64,
    found: Option<(u64, BoundingBox)>,
}

impl ContentSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look at one decoded frame. Breaks once a content box is found.
    pub fn inspect(&mut self, frame_number: u64, frame: &RgbImage) -> ControlFlow<()> {
        if self.found.is_some() {
            return ControlFlow::Break(());
        }
        self.frames_tried += 1;
        match content_bounds(frame, BRIGHTNESS_THRESHOLD) {
            Some(bounds) => {
                self.found = Some((frame_number, bounds));
                ControlFlow::Break(())
            }
            None => {
                log::debug!("Frame {frame_number} has no visible content");
                ControlFlow::Continue(())
            }
        }
    }

    /// Number of frames inspected so far.
    pub fn frames_tried(&self) -> u64 {
        self.frames_tried
    }

    /// The frame number and content box of the first frame that had one.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::NoValidFrame`] when no inspected frame had
    /// visible content.
    pub fn finish(self, path: &Path) -> Result<(u64, BoundingBox), AspectError> {
        self.found.ok_or_else(|| AspectError::NoValidFrame {
            path: path.to_path_buf(),
            frames_tried: self.frames_tried,
        })
    }
}

impl RatioEstimator for FfmpegEstimator {
    fn estimate(&mut self, path: &Path) -> Result<RatioEstimate, AspectError> {
        let mut video = VideoFile::open(path)?;
        let (width, height) = (video.metadata().width, video.metadata().height);
        let frame_ratio = video.metadata().frame_ratio()?;

        let mut search = ContentSearch::new();
        video
            .frames()
            .for_each_frame(&self.selection, |frame_number, image| {
                search.inspect(frame_number, &image)
            })?;
        let (frame_index, crop) = search.finish(path)?;

        log::info!(
            "Successfully computed ratio in frame {} of {}",
            frame_index + 1,
            path.display()
        );

        Ok(RatioEstimate {
            ratios: RatioPair {
                frame_ratio,
                crop_ratio: crop.ratio()?,
            },
            frame_index,
            frame_size: (width, height),
            crop,
        })
    }
}

/// Estimate the ratios of one video, trying every frame.
///
/// # Example
///
/// ```no_run
/// let estimate = aspectscan::estimate_ratios("v_Archery_abc.mp4")?;
/// println!(
///     "frame {} crop {}",
///     estimate.ratios.frame_ratio, estimate.ratios.crop_ratio
/// );
/// # Ok::<(), aspectscan::AspectError>(())
/// ```
pub fn estimate_ratios<P: AsRef<Path>>(path: P) -> Result<RatioEstimate, AspectError> {
    FfmpegEstimator::new().estimate(path.as_ref())
}
