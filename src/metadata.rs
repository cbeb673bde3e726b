//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened. Its declared dimensions are the source of the frame ratio.

use std::time::Duration;

use crate::{error::AspectError, ratio::AspectRatio};

/// Metadata for the best video stream of a file.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Declared frame width in pixels.
    pub width: u32,
    /// Declared frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Number of frames, from the container when it records one, otherwise
    /// estimated from duration and frame rate.
    pub frame_count: u64,
    /// Container-level duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}

impl VideoMetadata {
    /// Width over height of the declared frame, rounded to two decimals.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::InvalidDimensions`] if either dimension is zero.
    pub fn frame_ratio(&self) -> Result<AspectRatio, AspectError> {
        AspectRatio::from_dimensions(self.width, self.height)
    }
}
