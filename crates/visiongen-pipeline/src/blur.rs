//! Gaussian blur preview.
//!
//! The generated code calls `Imgproc.GaussianBlur` with a fixed 11x11
//! kernel and the stage amount as sigma. OpenCV derives sigma from the
//! kernel size when the amount is zero, so the preview blurs with
//! [`BlurParams::sigma`] rather than the raw amount. The blur itself is
//! [`imageproc::filter::gaussian_blur_f32`], which sizes its own kernel
//! from sigma.

use image::GrayImage;

use crate::frame::Frame;
use crate::stage::BlurParams;

/// Blur a single channel.
///
/// Non-positive sigma returns the image unchanged; `imageproc` panics
/// on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Apply a Blur stage to a chain value, channel by channel.
#[must_use = "returns the blurred frame"]
pub fn blur(frame: &Frame, params: &BlurParams) -> Frame {
    #[allow(clippy::cast_possible_truncation)] // sigma is at most 20.0
    let sigma = params.sigma() as f32;
    frame.map_channels(|plane| gaussian_blur(plane, sigma))
}
