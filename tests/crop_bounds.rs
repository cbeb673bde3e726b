//! Content bounding-box integration tests.

use aspectscan::crop::{BRIGHTNESS_THRESHOLD, BoundingBox, content_bounds};
use image::{Rgb, RgbImage};

fn letterboxed(width: u32, height: u32, bar: u32) -> RgbImage {
    let mut frame = RgbImage::new(width, height);
    for y in bar..(height - bar) {
        for x in 0..width {
            frame.put_pixel(x, y, Rgb([180, 90, 40]));
        }
    }
    frame
}

#[test]
fn black_frame_has_no_content() {
    let frame = RgbImage::new(64, 48);
    assert_eq!(content_bounds(&frame, BRIGHTNESS_THRESHOLD), None);
}

#[test]
fn threshold_is_strict() {
    let mut frame = RgbImage::new(16, 16);
    frame.put_pixel(3, 3, Rgb([10, 10, 10]));
    assert_eq!(content_bounds(&frame, BRIGHTNESS_THRESHOLD), None);

    frame.put_pixel(7, 9, Rgb([0, 11, 0]));
    assert_eq!(
        content_bounds(&frame, BRIGHTNESS_THRESHOLD),
        Some(BoundingBox {
            left: 7,
            top: 9,
            right: 7,
            bottom: 9,
        })
    );
}

#[test]
fn full_frame_content_spans_the_frame() {
    let frame = RgbImage::from_pixel(320, 180, Rgb([255, 255, 255]));
    let bounds = content_bounds(&frame, BRIGHTNESS_THRESHOLD).expect("content expected");
    assert_eq!((bounds.width(), bounds.height()), (320, 180));
    assert_eq!(bounds.ratio().unwrap().to_string(), "1.78");
}

#[test]
fn letterbox_bars_are_cropped() {
    let frame = letterboxed(1920, 1080, 140);
    let bounds = content_bounds(&frame, BRIGHTNESS_THRESHOLD).expect("content expected");
    assert_eq!(bounds.top, 140);
    assert_eq!(bounds.bottom, 939);
    assert_eq!((bounds.width(), bounds.height()), (1920, 800));
    assert_eq!(bounds.ratio().unwrap().to_string(), "2.40");
}

#[test]
fn scattered_pixels_extend_the_box() {
    let mut frame = RgbImage::new(100, 100);
    frame.put_pixel(10, 50, Rgb([0, 0, 200]));
    frame.put_pixel(90, 20, Rgb([200, 0, 0]));
    frame.put_pixel(40, 80, Rgb([0, 200, 0]));

    let bounds = content_bounds(&frame, BRIGHTNESS_THRESHOLD).expect("content expected");
    assert_eq!(
        bounds,
        BoundingBox {
            left: 10,
            top: 20,
            right: 90,
            bottom: 80,
        }
    );
}
