//! Stage kinds and their typed, fully bound parameters.
//!
//! A [`StageInstance`] is what the rest of the system works with once a
//! user-supplied [`StageConfig`](crate::StageConfig) has been checked
//! against the catalog schema. Every field here already satisfies its
//! domain; see [`crate::catalog`] for the ranges.
//!
//! Symbolic parameters ([`StructuringShape`], [`ApproxMethod`]) are parsed
//! through explicit lookup tables. An unrecognized symbol is an
//! [`UnknownSymbol`] error, never a silent fallback.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the fixed catalog of pipeline stages.
///
/// Crop is always first and sits outside the user-reorderable sequence.
/// The remaining kinds can be arranged freely, subject to the catalog's
/// ordering constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageKind {
    /// Rectangular region of interest taken from the untouched source.
    Crop,
    /// Gaussian smoothing.
    Blur,
    /// Morphological erosion.
    Erode,
    /// Morphological dilation.
    Dilate,
    /// HSV range threshold producing a single-channel mask.
    Threshold,
    /// External contour extraction, drawn onto the original frame.
    Contours,
}

impl StageKind {
    /// All stage kinds in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Crop,
        Self::Blur,
        Self::Erode,
        Self::Dilate,
        Self::Threshold,
        Self::Contours,
    ];

    /// Name used in configuration files and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Crop => "Crop",
            Self::Blur => "Blur",
            Self::Erode => "Erode",
            Self::Dilate => "Dilate",
            Self::Threshold => "Threshold",
            Self::Contours => "Contours",
        }
    }

    /// Caption shown under the preview image for this stage.
    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Threshold => "HSV Threshold",
            other => other.label(),
        }
    }

    /// Whether the stage has a fixed position at the head of the pipeline.
    #[must_use]
    pub const fn is_fixed_first(self) -> bool {
        matches!(self, Self::Crop)
    }

    /// Whether the stage's output feeds the next stage.
    ///
    /// Contours annotates the original frame instead; the stage after it
    /// (if any) keeps consuming the contours stage's own input.
    #[must_use]
    pub const fn produces_chain_output(self) -> bool {
        !matches!(self, Self::Contours)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A symbol outside a fixed lookup table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown symbol {0:?}")]
pub struct UnknownSymbol(pub String);

/// A closed set of parameter values that are chosen by name.
///
/// Implementors parse with [`FromStr`] through an explicit table and
/// report [`UnknownSymbol`] for anything outside it.
pub trait Symbolic: Copy + FromStr<Err = UnknownSymbol> {
    /// Every legal symbol, in display order.
    const SYMBOLS: &'static [&'static str];

    /// The symbol this value parses from.
    fn symbol(self) -> &'static str;
}

/// Structuring-element shape for erosion and dilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuringShape {
    /// Full square neighborhood.
    Rect,
    /// Ellipse inscribed in the square neighborhood.
    Ellipse,
    /// Center row and center column only.
    Cross,
}

impl Symbolic for StructuringShape {
    const SYMBOLS: &'static [&'static str] = &["RECT", "ELLIPSE", "CROSS"];

    fn symbol(self) -> &'static str {
        match self {
            Self::Rect => "RECT",
            Self::Ellipse => "ELLIPSE",
            Self::Cross => "CROSS",
        }
    }
}

impl FromStr for StructuringShape {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECT" => Ok(Self::Rect),
            "ELLIPSE" => Ok(Self::Ellipse),
            "CROSS" => Ok(Self::Cross),
            other => Err(UnknownSymbol(other.to_owned())),
        }
    }
}

/// Contour chain-approximation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApproxMethod {
    /// Keep every boundary point (`CHAIN NONE`).
    All,
    /// Compress horizontal, vertical and diagonal runs to their end points.
    Simple,
    /// Teh-Chin curve approximation, L1 variant.
    Tc89L1,
    /// Teh-Chin curve approximation, k-cosine variant.
    Tc89Kcos,
}

impl Symbolic for ApproxMethod {
    const SYMBOLS: &'static [&'static str] = &[
        "CHAIN NONE",
        "CHAIN SIMPLE",
        "CHAIN TC89 L1",
        "CHAIN TC89 KCOS",
    ];

    fn symbol(self) -> &'static str {
        match self {
            Self::All => "CHAIN NONE",
            Self::Simple => "CHAIN SIMPLE",
            Self::Tc89L1 => "CHAIN TC89 L1",
            Self::Tc89Kcos => "CHAIN TC89 KCOS",
        }
    }
}

impl FromStr for ApproxMethod {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHAIN NONE" => Ok(Self::All),
            "CHAIN SIMPLE" => Ok(Self::Simple),
            "CHAIN TC89 L1" => Ok(Self::Tc89L1),
            "CHAIN TC89 KCOS" => Ok(Self::Tc89Kcos),
            other => Err(UnknownSymbol(other.to_owned())),
        }
    }
}

/// Crop rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Gaussian blur parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    /// Smoothing amount, used as the Gaussian sigma.
    pub amount: f64,
}

impl BlurParams {
    /// Fixed side length of the blur neighborhood.
    pub const KERNEL_SIZE: u32 = 11;

    /// Sigma OpenCV derives from [`Self::KERNEL_SIZE`] when the requested
    /// sigma is not positive: `0.3 * ((k - 1) * 0.5 - 1) + 0.8`.
    pub const KERNEL_SIGMA: f64 = 2.0;

    /// Sigma `Imgproc.GaussianBlur` actually applies for this amount.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        if self.amount > 0.0 {
            self.amount
        } else {
            Self::KERNEL_SIGMA
        }
    }
}

/// Erosion or dilation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorphParams {
    pub shape: StructuringShape,
    /// Neighborhood radius. The structuring element is
    /// `2 * size + 1` pixels square, anchored at `(size, size)`.
    pub size: u32,
    pub iterations: u32,
}

impl MorphParams {
    /// Side length of the square structuring element.
    #[must_use]
    pub const fn kernel_extent(&self) -> u32 {
        2 * self.size + 1
    }

    /// Anchor offset inside the structuring element (same on both axes).
    #[must_use]
    pub const fn anchor(&self) -> u32 {
        self.size
    }
}

/// Inclusive `[low, high]` bound on one 8-bit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub low: u8,
    pub high: u8,
}

impl ChannelRange {
    #[must_use]
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// Whether `value` lies within the bounds (both ends inclusive).
    #[must_use]
    pub const fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }
}

/// HSV threshold parameters.
///
/// Hue uses the OpenCV 8-bit convention (0 to 180); saturation and
/// value span 0 to 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdParams {
    pub hue: ChannelRange,
    pub sat: ChannelRange,
    pub val: ChannelRange,
    /// Invert the mask after thresholding.
    pub invert: bool,
}

impl ThresholdParams {
    /// Lower `(h, s, v)` bound.
    #[must_use]
    pub const fn lower(&self) -> [u8; 3] {
        [self.hue.low, self.sat.low, self.val.low]
    }

    /// Upper `(h, s, v)` bound.
    #[must_use]
    pub const fn upper(&self) -> [u8; 3] {
        [self.hue.high, self.sat.high, self.val.high]
    }
}

/// Contour extraction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourParams {
    pub method: ApproxMethod,
}

/// A stage kind together with its bound parameter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageInstance {
    Crop(CropRect),
    Blur(BlurParams),
    Erode(MorphParams),
    Dilate(MorphParams),
    Threshold(ThresholdParams),
    Contours(ContourParams),
}

impl StageInstance {
    /// The kind of this stage.
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        match self {
            Self::Crop(_) => StageKind::Crop,
            Self::Blur(_) => StageKind::Blur,
            Self::Erode(_) => StageKind::Erode,
            Self::Dilate(_) => StageKind::Dilate,
            Self::Threshold(_) => StageKind::Threshold,
            Self::Contours(_) => StageKind::Contours,
        }
    }
}
