//! Crop preview.

use crate::stage::CropRect;
use crate::types::RgbaImage;

/// Region actually taken from a `width` x `height` source.
///
/// The rectangle is clamped so at least one pixel survives; the
/// generated Java would throw on an out-of-bounds `Rect` instead.
#[must_use]
pub fn clamp_rect(rect: &CropRect, width: u32, height: u32) -> CropRect {
    let left = rect.left.min(width.saturating_sub(1));
    let top = rect.top.min(height.saturating_sub(1));
    CropRect {
        left,
        top,
        width: rect.width.min(width - left).max(1),
        height: rect.height.min(height - top).max(1),
    }
}

/// Cut the clamped region out of `source`.
#[must_use = "returns the cropped image"]
pub fn crop(source: &RgbaImage, rect: &CropRect) -> RgbaImage {
    let r = clamp_rect(rect, source.width(), source.height());
    image::imageops::crop_imm(source, r.left, r.top, r.width, r.height).to_image()
}
