//! Erode and Dilate preview.
//!
//! Mirrors `Imgproc.getStructuringElement` followed by `Imgproc.erode` /
//! `Imgproc.dilate`: a `(2 * size + 1)` square kernel anchored at its
//! center, applied `iterations` times to every channel.

use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

use crate::frame::Frame;
use crate::stage::{MorphParams, StructuringShape};

/// Whether the kernel cell at offset `(dx, dy)` from the anchor is set.
///
/// Ellipse rows follow `getStructuringElement`: row `dy` spans
/// `round(sqrt(r^2 - dy^2))` cells either side of the anchor.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn in_shape(shape: StructuringShape, dx: i64, dy: i64, radius: i64) -> bool {
    match shape {
        StructuringShape::Rect => true,
        StructuringShape::Cross => dx == 0 || dy == 0,
        StructuringShape::Ellipse => {
            let half_width = ((radius * radius - dy * dy) as f64).sqrt().round() as i64;
            dx.abs() <= half_width
        }
    }
}

/// Build the structuring element for `params`.
#[must_use]
pub fn structuring_element(params: &MorphParams) -> Mask {
    let radius = u8::try_from(params.size).unwrap_or(u8::MAX);
    let extent = 2 * u32::from(radius) + 1;
    let r = i64::from(radius);
    let kernel = GrayImage::from_fn(extent, extent, |x, y| {
        let set = in_shape(params.shape, i64::from(x) - r, i64::from(y) - r, r);
        Luma([if set { 255 } else { 0 }])
    });
    Mask::from_image(&kernel, radius, radius)
}

fn repeat(plane: &GrayImage, iterations: u32, op: impl Fn(&GrayImage) -> GrayImage) -> GrayImage {
    let mut out = plane.clone();
    for _ in 0..iterations {
        out = op(&out);
    }
    out
}

/// Apply an Erode stage.
#[must_use = "returns the eroded frame"]
pub fn erode(frame: &Frame, params: &MorphParams) -> Frame {
    let mask = structuring_element(params);
    frame.map_channels(|plane| repeat(plane, params.iterations, |p| grayscale_erode(p, &mask)))
}

/// Apply a Dilate stage.
#[must_use = "returns the dilated frame"]
pub fn dilate(frame: &Frame, params: &MorphParams) -> Frame {
    let mask = structuring_element(params);
    frame.map_channels(|plane| repeat(plane, params.iterations, |p| grayscale_dilate(p, &mask)))
}
