//! Error types for the `aspectscan` crate.
//!
//! This module defines [`AspectError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the file path, row
//! number, or frame count that failed so the first pass can write a useful
//! line to the failure log.

use std::{io::Error as IoError, path::PathBuf};

use csv::Error as CsvError;
use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `aspectscan` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AspectError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The stream header declares a zero width or height.
    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Declared frame width.
        width: u32,
        /// Declared frame height.
        height: u32,
    },

    /// No candidate frame contained a pixel above the brightness threshold.
    #[error("No valid frame found in {path} ({frames_tried} frames tried)")]
    NoValidFrame {
        /// Video that was scanned.
        path: PathBuf,
        /// Number of decoded frames that were examined.
        frames_tried: u64,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while building or saving images.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A table could not be read or written.
    #[error("CSV error: {0}")]
    CsvError(#[from] CsvError),

    /// A required column is missing from a table header.
    #[error("Column '{column}' not found in {path}")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
        /// Table that was read.
        path: PathBuf,
    },

    /// A table cell could not be parsed.
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidField {
        /// One-based data row (header excluded).
        row: usize,
        /// Column name.
        column: String,
        /// Raw cell contents.
        value: String,
    },

    /// A failure log line does not contain a `v_….mp4` video name.
    #[error("Malformed failure log entry at line {line_number}: {line}")]
    MalformedFailureEntry {
        /// One-based line number.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// The filter stage was given a table without rows.
    #[error("Dataset contains no rows")]
    EmptyDataset,

    /// A histogram was requested with zero bins.
    #[error("Histogram bin count must be greater than zero")]
    InvalidBinCount,
}

impl From<FfmpegError> for AspectError {
    fn from(error: FfmpegError) -> Self {
        AspectError::FfmpegError(error.to_string())
    }
}
