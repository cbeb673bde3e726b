//! Internal utility functions.
//!
//! Pixel-data copying and the timestamp/frame-number conversions shared by
//! [`VideoFile`](crate::VideoFile) and the frame reader.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg pads rows (stride > width × bytes per pixel); the padding is
/// stripped so the result can be handed to [`image::RgbImage::from_raw`].
pub fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame number. Negative timestamps map to frame 0.
pub fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` with no stream index expects AV_TIME_BASE units.
pub fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Estimate a frame count from a duration and frame rate.
pub fn estimate_frame_count(duration: Duration, frames_per_second: f64) -> u64 {
    if frames_per_second > 0.0 {
        (duration.as_secs_f64() * frames_per_second).round() as u64
    } else {
        0
    }
}

/// Convert an FFmpeg rational to a float, `None` when the denominator is zero.
pub fn rational_to_f64(rational: Rational) -> Option<f64> {
    if rational.denominator() == 0 || rational.numerator() == 0 {
        None
    } else {
        Some(rational.numerator() as f64 / rational.denominator() as f64)
    }
}
