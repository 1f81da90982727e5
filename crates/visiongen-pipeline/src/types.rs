//! Shared types for visiongen: raw configuration, the validated
//! pipeline, and the error type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stage::{
    ChannelRange, ContourParams, CropRect, MorphParams, StageInstance, StageKind, Symbolic,
    ThresholdParams,
};

/// Re-export `GrayImage` so downstream crates can reference mask
/// buffers without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference preview
/// frames without depending on `image` directly.
pub use image::RgbaImage;

/// A raw, not yet validated parameter value.
///
/// Deserialized untagged, so JSON `true`, `3`, `2.5`, `[61, 126]` and
/// `"RECT"` map to the variants in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Range([i64; 2]),
    Symbol(String),
}

impl ParamValue {
    /// Short name of the value's shape, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Flag(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "number",
            Self::Range(_) => "integer pair",
            Self::Symbol(_) => "symbol",
        }
    }
}

impl From<ChannelRange> for ParamValue {
    fn from(range: ChannelRange) -> Self {
        Self::Range([i64::from(range.low), i64::from(range.high)])
    }
}

/// One user-selected stage with its raw parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub kind: StageKind,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl StageConfig {
    /// A stage with no parameters bound yet.
    #[must_use]
    pub const fn new(kind: StageKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Bind `name` to `value`, replacing any previous binding.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_owned(), value.into());
        self
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<[i64; 2]> for ParamValue {
    fn from(value: [i64; 2]) -> Self {
        Self::Range(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Symbol(value.to_owned())
    }
}

impl From<StageInstance> for StageConfig {
    fn from(stage: StageInstance) -> Self {
        let config = Self::new(stage.kind());
        match stage {
            StageInstance::Crop(CropRect {
                left,
                top,
                width,
                height,
            }) => config
                .with("left", left)
                .with("top", top)
                .with("width", width)
                .with("height", height),
            StageInstance::Blur(params) => config.with("amount", params.amount),
            StageInstance::Erode(params) | StageInstance::Dilate(params) => {
                morph_config(config, params)
            }
            StageInstance::Threshold(ThresholdParams {
                hue,
                sat,
                val,
                invert,
            }) => config
                .with("hue", hue)
                .with("sat", sat)
                .with("val", val)
                .with("invert", invert),
            StageInstance::Contours(ContourParams { method }) => {
                config.with("method", method.symbol())
            }
        }
    }
}

fn morph_config(config: StageConfig, params: MorphParams) -> StageConfig {
    config
        .with("shape", params.shape.symbol())
        .with("size", params.size)
        .with("iterations", params.iterations)
}

/// The compiler's sole input: an ordered list of stages with raw
/// parameter values.
///
/// Constructed fresh from each user interaction and never mutated by the
/// compiler. Run it through [`validate`](crate::validate) to obtain a
/// [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    /// Build a configuration from already typed stages.
    pub fn from_instances(stages: impl IntoIterator<Item = StageInstance>) -> Self {
        Self {
            stages: stages.into_iter().map(StageConfig::from).collect(),
        }
    }
}

impl Default for PipelineConfig {
    /// Threshold, Erode, Dilate, Contours with the catalog defaults.
    fn default() -> Self {
        Self::from_instances(
            [
                StageKind::Threshold,
                StageKind::Erode,
                StageKind::Dilate,
                StageKind::Contours,
            ]
            .map(crate::catalog::default_instance),
        )
    }
}

/// A validated pipeline: every stage is fully bound and the order
/// satisfies the catalog constraints.
///
/// Only [`validate`](crate::validate) constructs this type, so anything
/// holding a `Pipeline` (the code emitter, the preview executor) never
/// sees an invalid configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    stages: Vec<StageInstance>,
}

impl Pipeline {
    pub(crate) const fn new(stages: Vec<StageInstance>) -> Self {
        Self { stages }
    }

    /// Stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageInstance] {
        &self.stages
    }

    /// Number of stages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if no stage is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage kinds in execution order.
    pub fn kinds(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.stages.iter().map(StageInstance::kind)
    }

    /// The crop rectangle, if a Crop stage is selected.
    #[must_use]
    pub fn crop(&self) -> Option<&CropRect> {
        self.stages.iter().find_map(|stage| match stage {
            StageInstance::Crop(rect) => Some(rect),
            _ => None,
        })
    }
}

/// Errors raised while validating a configuration or running a preview.
///
/// Every validation error names the offending stage and the rule it
/// breaks, so the `Display` output can be shown to the user as is.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Two stages appear in an order the catalog forbids.
    #[error("{stage} conflicts with {other}: {reason}")]
    OrderingViolation {
        stage: StageKind,
        other: StageKind,
        reason: String,
    },

    /// A stage kind was selected more than once.
    #[error("{0} is selected more than once; each stage may appear only once")]
    DuplicateStage(StageKind),

    /// A symbolic parameter is outside its lookup table.
    #[error("{stage}: unknown {parameter} {symbol:?} (expected one of {expected})")]
    UnknownSymbol {
        stage: StageKind,
        parameter: &'static str,
        symbol: String,
        expected: String,
    },

    /// A parameter required by the stage schema is absent.
    #[error("{stage}: missing required parameter `{parameter}`")]
    MissingParameter {
        stage: StageKind,
        parameter: &'static str,
    },

    /// A parameter name that the stage schema does not define.
    #[error("{stage}: unknown parameter `{parameter}`")]
    UnknownParameter { stage: StageKind, parameter: String },

    /// A parameter value has the wrong shape (e.g. a symbol where an
    /// integer is expected).
    #[error("{stage}: parameter `{parameter}` must be {expected}, found {found}")]
    ParameterType {
        stage: StageKind,
        parameter: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A parameter value lies outside its legal domain.
    #[error("{stage}: parameter `{parameter}` = {value} is out of range (expected {expected})")]
    OutOfRange {
        stage: StageKind,
        parameter: &'static str,
        value: String,
        expected: String,
    },

    /// Failed to decode the preview image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The preview image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,
}
