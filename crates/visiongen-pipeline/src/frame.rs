//! The value threaded between preview stages.

use image::{DynamicImage, GrayImage, Luma, Rgba};

use crate::types::RgbaImage;

/// Chain value flowing from one preview stage to the next.
///
/// Stages before Threshold carry color; Threshold and everything after
/// it carry a single-channel mask, just like the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Color(RgbaImage),
    Mask(GrayImage),
}

impl Frame {
    /// Width and height in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Color(img) => img.dimensions(),
            Self::Mask(img) => img.dimensions(),
        }
    }

    /// Displayable RGBA copy (masks become opaque gray).
    #[must_use]
    pub fn to_rgba(&self) -> RgbaImage {
        match self {
            Self::Color(img) => img.clone(),
            Self::Mask(mask) => RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
                let Luma([v]) = *mask.get_pixel(x, y);
                Rgba([v, v, v, 255])
            }),
        }
    }

    /// Single-channel view: masks as is, color frames by luminance.
    #[must_use]
    pub fn to_mask(&self) -> GrayImage {
        match self {
            Self::Color(img) => DynamicImage::ImageRgba8(img.clone()).to_luma8(),
            Self::Mask(mask) => mask.clone(),
        }
    }

    /// Apply a single-channel operation to every channel independently.
    #[must_use]
    pub fn map_channels(&self, op: impl Fn(&GrayImage) -> GrayImage) -> Self {
        match self {
            Self::Mask(mask) => Self::Mask(op(mask)),
            Self::Color(img) => Self::Color(map_rgba_channels(img, op)),
        }
    }
}

/// Split an RGBA image into four planes, apply `op` to each, and
/// reassemble.
pub(crate) fn map_rgba_channels(
    image: &RgbaImage,
    op: impl Fn(&GrayImage) -> GrayImage,
) -> RgbaImage {
    let (w, h) = image.dimensions();
    let planes: [GrayImage; 4] = std::array::from_fn(|c| {
        op(&GrayImage::from_fn(w, h, |x, y| {
            Luma([image.get_pixel(x, y).0[c]])
        }))
    });
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba(std::array::from_fn(|c| planes[c].get_pixel(x, y).0[0]))
    })
}
