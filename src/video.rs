//! Video frame decoding.
//!
//! [`FrameReader`] walks an explicit [`FrameSelection`] of candidate frame
//! numbers and hands each decoded frame to a handler as an
//! [`image::RgbImage`]. The handler decides when to stop, which is how the
//! ratio estimator implements "try frames until one works".

use std::ops::ControlFlow;

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{error::AspectError, media::VideoFile, utilities};

/// Candidate frame numbers (0-indexed) to visit, always in ascending order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub enum FrameSelection {
    /// Every frame from 0 to `frame_count - 1`.
    #[default]
    All,
    /// Frames from start to end (inclusive).
    Range(u64, u64),
}

impl FrameSelection {
    /// The first `count` frames. A zero count is an inverted range and fails
    /// to resolve.
    pub fn first(count: u64) -> Self {
        match count {
            0 => FrameSelection::Range(1, 0),
            count => FrameSelection::Range(0, count - 1),
        }
    }

    /// Resolve to the ascending list of frame numbers below `frame_count`.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::VideoDecodeError`] for an inverted range.
    pub fn resolve(&self, frame_count: u64) -> Result<Vec<u64>, AspectError> {
        Ok(match self {
            FrameSelection::All => (0..frame_count).collect(),
            FrameSelection::Range(start, end) => {
                if start > end {
                    return Err(AspectError::VideoDecodeError(format!(
                        "invalid frame range {start}..={end}"
                    )));
                }
                (*start..=(*end).min(frame_count.saturating_sub(1)))
                    .filter(|&number| number < frame_count)
                    .collect()
            }
        })
    }
}

/// Frame decoding over a [`VideoFile`].
///
/// Obtained via [`VideoFile::frames`]. Each scan creates a fresh decoder,
/// seeks to the first candidate and decodes forward.
pub struct FrameReader<'a> {
    pub(crate) video: &'a mut VideoFile,
}

impl FrameReader<'_> {
    /// Decode the selected frames in order, passing each to `handler`.
    ///
    /// Packets that fail to decode and frames that cannot be converted to
    /// RGB are skipped. The scan ends when the handler returns
    /// [`ControlFlow::Break`] or the candidates are exhausted. Returns the
    /// number of frames handed to the handler.
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::NoVideoStream`] if the stream disappeared, or
    /// an FFmpeg error if the decoder, scaler or seek cannot be set up.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::ops::ControlFlow;
    ///
    /// use aspectscan::{AspectError, FrameSelection, VideoFile};
    ///
    /// let mut video = VideoFile::open("input.mp4")?;
    /// video.frames().for_each_frame(&FrameSelection::Range(0, 9), |number, image| {
    ///     println!("frame {number}: {}x{}", image.width(), image.height());
    ///     ControlFlow::Continue(())
    /// })?;
    /// # Ok::<(), AspectError>(())
    /// ```
    pub fn for_each_frame<F>(
        &mut self,
        selection: &FrameSelection,
        mut handler: F,
    ) -> Result<u64, AspectError>
    where
        F: FnMut(u64, RgbImage) -> ControlFlow<()>,
    {
        let metadata = self.video.metadata.clone();
        let targets = selection.resolve(metadata.frame_count)?;
        if targets.is_empty() {
            return Ok(0);
        }

        let stream = self
            .video
            .input_context
            .stream(metadata.stream_index)
            .ok_or(AspectError::NoVideoStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            ScalingFlags::BILINEAR,
        )?;

        if targets[0] > 0 {
            let seek_timestamp =
                utilities::frame_number_to_seek_timestamp(targets[0], metadata.frames_per_second);
            self.video
                .input_context
                .seek(seek_timestamp, ..seek_timestamp)?;
        }

        let mut cursor = TargetCursor::new(&targets);
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();
        let mut decoded_count: u64 = 0;
        let mut handed = 0;

        let mut deliver = |decoded_frame: &VideoFrame,
                           rgb_frame: &mut VideoFrame,
                           decoded_count: &mut u64,
                           cursor: &mut TargetCursor|
         -> ControlFlow<()> {
            let current_frame_number = decoded_frame
                .pts()
                .map(|pts| {
                    utilities::pts_to_frame_number(pts, time_base, metadata.frames_per_second)
                })
                .unwrap_or(*decoded_count);
            *decoded_count += 1;

            if !cursor.accept(current_frame_number) {
                return if cursor.is_done() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                };
            }

            if let Err(error) = scaler.run(decoded_frame, rgb_frame) {
                log::debug!("Skipping frame {current_frame_number}: {error}");
                return ControlFlow::Continue(());
            }
            match convert_frame_to_image(rgb_frame, metadata.width, metadata.height) {
                Ok(image) => {
                    handed += 1;
                    if handler(current_frame_number, image).is_break() {
                        return ControlFlow::Break(());
                    }
                }
                Err(error) => log::debug!("Skipping frame {current_frame_number}: {error}"),
            }
            if cursor.is_done() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };

        for (stream, packet) in self.video.input_context.packets() {
            if stream.index() != metadata.stream_index {
                continue;
            }

            if let Err(error) = decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {error}");
                continue;
            }

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if deliver(
                    &decoded_frame,
                    &mut rgb_frame,
                    &mut decoded_count,
                    &mut cursor,
                )
                .is_break()
                {
                    return Ok(handed);
                }
            }
        }

        // Flush frames still buffered in the decoder.
        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if deliver(
                &decoded_frame,
                &mut rgb_frame,
                &mut decoded_count,
                &mut cursor,
            )
            .is_break()
            {
                break;
            }
        }

        Ok(handed)
    }
}

/// Walks the sorted candidate list alongside the decoded frame numbers.
struct TargetCursor<'a> {
    targets: &'a [u64],
    position: usize,
}

impl<'a> TargetCursor<'a> {
    fn new(targets: &'a [u64]) -> Self {
        Self {
            targets,
            position: 0,
        }
    }

    /// Returns `true` when `frame_number` is the next candidate. Candidates
    /// the decoder has already passed are dropped.
    fn accept(&mut self, frame_number: u64) -> bool {
        while self.position < self.targets.len() && self.targets[self.position] < frame_number {
            self.position += 1;
        }
        if self.position < self.targets.len() && self.targets[self.position] == frame_number {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn is_done(&self) -> bool {
        self.position >= self.targets.len()
    }
}

/// Convert a scaled RGB24 video frame to an [`image::RgbImage`].
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<RgbImage, AspectError> {
    let buffer = utilities::frame_to_buffer(rgb_frame, width, height, 3);
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        AspectError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{FrameSelection, TargetCursor};

    #[test]
    fn all_frames_resolve_to_full_range() {
        assert_eq!(FrameSelection::All.resolve(4).unwrap(), vec![0, 1, 2, 3]);
        assert!(FrameSelection::All.resolve(0).unwrap().is_empty());
    }

    #[test]
    fn range_is_clamped_to_frame_count() {
        assert_eq!(FrameSelection::Range(3, 100).resolve(6).unwrap(), vec![3, 4, 5]);
        assert!(FrameSelection::Range(5, 2).resolve(10).is_err());
    }

    #[test]
    fn first_frames_select_a_prefix() {
        assert_eq!(FrameSelection::first(3).resolve(10).unwrap(), vec![0, 1, 2]);
        assert_eq!(FrameSelection::first(30).resolve(4).unwrap(), vec![0, 1, 2, 3]);
        assert!(FrameSelection::first(0).resolve(10).is_err());
    }

    #[test]
    fn cursor_skips_passed_targets() {
        let targets = [1, 3, 5];
        let mut cursor = TargetCursor::new(&targets);
        assert!(!cursor.accept(0));
        assert!(cursor.accept(1));
        assert!(!cursor.accept(4));
        assert!(cursor.accept(5));
        assert!(cursor.is_done());
    }
}
