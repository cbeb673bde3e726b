//! Visible-content bounding boxes.
//!
//! A pixel counts as content when any of its colour channels is strictly
//! brighter than [`BRIGHTNESS_THRESHOLD`]. The tight box around all content
//! pixels is what remains once black letterbox or pillarbox borders are
//! cropped away.

use image::RgbImage;

use crate::{error::AspectError, ratio::AspectRatio};

/// Channel value a pixel must exceed to count as visible content.
pub const BRIGHTNESS_THRESHOLD: u8 = 10;

/// Inclusive pixel bounds of the visible content of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Leftmost content column.
    pub left: u32,
    /// Topmost content row.
    pub top: u32,
    /// Rightmost content column.
    pub right: u32,
    /// Bottommost content row.
    pub bottom: u32,
}

impl BoundingBox {
    /// Width in pixels, counting both edge columns.
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    /// Height in pixels, counting both edge rows.
    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Width over height, rounded to two decimals.
    pub fn ratio(&self) -> Result<AspectRatio, AspectError> {
        AspectRatio::from_dimensions(self.width(), self.height())
    }
}

/// Find the bounding box of pixels brighter than `threshold`.
///
/// Returns `None` when no pixel qualifies (a black or near-black frame).
///
/// # Example
///
/// ```
/// use aspectscan::crop::{BRIGHTNESS_THRESHOLD, content_bounds};
/// use image::{Rgb, RgbImage};
///
/// let mut frame = RgbImage::new(8, 6);
/// frame.put_pixel(2, 1, Rgb([200, 200, 200]));
/// frame.put_pixel(5, 4, Rgb([0, 0, 90]));
///
/// let bounds = content_bounds(&frame, BRIGHTNESS_THRESHOLD).unwrap();
/// assert_eq!((bounds.width(), bounds.height()), (4, 4));
/// ```
pub fn content_bounds(frame: &RgbImage, threshold: u8) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;

    for (x, y, pixel) in frame.enumerate_pixels() {
        if !pixel.0.iter().any(|&channel| channel > threshold) {
            continue;
        }
        bounds = Some(match bounds {
            None => BoundingBox {
                left: x,
                top: y,
                right: x,
                bottom: y,
            },
            Some(current) => BoundingBox {
                left: current.left.min(x),
                top: current.top.min(y),
                right: current.right.max(x),
                bottom: current.bottom.max(y),
            },
        });
    }

    bounds
}
