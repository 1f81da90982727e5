//! HSV threshold preview.
//!
//! Converts each RGB pixel to HSV using OpenCV's 8-bit convention
//! (hue halved into `0..=180`, saturation and value in `0..=255`) and
//! keeps the pixels whose three channels all fall inside the stage's
//! inclusive ranges, like `Core.inRange`.

use image::{GrayImage, Luma};

use crate::stage::ThresholdParams;
use crate::types::RgbaImage;

/// Convert one RGB pixel to 8-bit OpenCV HSV.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let sat = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };

    [
        (hue / 2.0).round().min(180.0) as u8,
        sat.round() as u8,
        max as u8,
    ]
}

/// Build the binary mask for a Threshold stage: 255 where the pixel is
/// in range (or out of range when inverted), 0 elsewhere.
#[must_use = "returns the threshold mask"]
pub fn hsv_threshold(image: &RgbaImage, params: &ThresholdParams) -> GrayImage {
    let ranges = [params.hue, params.sat, params.val];
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        let hsv = rgb_to_hsv([r, g, b]);
        let inside = ranges.iter().zip(hsv).all(|(range, v)| range.contains(v));
        Luma([if inside != params.invert { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::ChannelRange;

    fn params(invert: bool) -> ThresholdParams {
        ThresholdParams {
            hue: ChannelRange::new(50, 70),
            sat: ChannelRange::new(100, 255),
            val: ChannelRange::new(100, 255),
            invert,
        }
    }

    #[test]
    fn primaries_follow_opencv_hue_scale() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn magenta_wraps_to_upper_hue() {
        assert_eq!(rgb_to_hsv([255, 0, 255]), [150, 255, 255]);
    }

    #[test]
    fn green_pixels_pass_and_red_pixels_do_not() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([0, 255, 0, 255])
            } else {
                image::Rgba([255, 0, 0, 255])
            }
        });
        let mask = hsv_threshold(&img, &params(false));
        assert_eq!(mask.get_pixel(0, 0).0[0], 255);
        assert_eq!(mask.get_pixel(1, 0).0[0], 0);

        let inverted = hsv_threshold(&img, &params(true));
        assert_eq!(inverted.get_pixel(0, 0).0[0], 0);
        assert_eq!(inverted.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([0, 100, 100, 255]));
        let p = ThresholdParams {
            hue: ChannelRange::new(60, 60),
            sat: ChannelRange::new(255, 255),
            val: ChannelRange::new(100, 100),
            invert: false,
        };
        assert_eq!(hsv_threshold(&img, &p).get_pixel(0, 0).0[0], 255);
    }
}
