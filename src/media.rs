//! Core [`VideoFile`] implementation.
//!
//! `VideoFile` opens a container, picks the best video stream, caches its
//! [`VideoMetadata`], and hands out a [`FrameReader`] for decoding.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{error::AspectError, metadata::VideoMetadata, utilities, video::FrameReader};

/// An opened video file.
///
/// # Example
///
/// ```no_run
/// use aspectscan::{AspectError, VideoFile};
///
/// let video = VideoFile::open("v_ApplyEyeMakeup_g01.mp4")?;
/// let metadata = video.metadata();
/// println!("{}x{}, {} frames", metadata.width, metadata.height, metadata.frame_count);
/// # Ok::<(), AspectError>(())
/// ```
pub struct VideoFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Cached metadata of the best video stream.
    pub(crate) metadata: VideoMetadata,
    pub(crate) file_path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, and reads the
    /// dimensions, frame rate and frame count of its best video stream.
    ///
    /// # Errors
    ///
    /// - [`AspectError::FileOpen`] if the file cannot be opened or its codec
    ///   parameters cannot be read.
    /// - [`AspectError::NoVideoStream`] if the container has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AspectError> {
        let file_path = path.as_ref().to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| AspectError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| AspectError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(AspectError::NoVideoStream)?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| AspectError::FileOpen {
                path: file_path.clone(),
                reason: format!(
                    "Failed to read video codec parameters for stream {stream_index}: {error}"
                ),
            },
        )?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| AspectError::FileOpen {
                    path: file_path.clone(),
                    reason: format!(
                        "Failed to create video decoder for stream {stream_index}: {error}"
                    ),
                })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frames_per_second = utilities::rational_to_f64(stream.avg_frame_rate())
            .or_else(|| utilities::rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        // Prefer the container's own count; fall back to duration × fps.
        let declared_frames = stream.frames();
        let frame_count = if declared_frames > 0 {
            declared_frames as u64
        } else {
            utilities::estimate_frame_count(duration, frames_per_second)
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: video_decoder.width(),
            height: video_decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
            stream_index,
        };

        log::debug!(
            "Video stream {}: {}x{}, {:.2} fps, codec={}, {} frames",
            metadata.stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
            metadata.frame_count,
        );

        Ok(Self {
            input_context,
            metadata,
            file_path,
        })
    }

    /// Get a reference to the cached video metadata.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Obtain a [`FrameReader`] for decoding frames.
    pub fn frames(&mut self) -> FrameReader<'_> {
        FrameReader { video: self }
    }
}
