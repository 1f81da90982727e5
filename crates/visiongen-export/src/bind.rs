//! Dataflow binding.
//!
//! Assigns every stage of a validated [`Pipeline`] a stable Java field
//! name, a private method name, and the identifier it consumes. The
//! chain is seeded by the `processFrame` parameter; each stage consumes
//! the previous stage's chain output.

use visiongen_pipeline::{Pipeline, StageKind};

/// Name of the `processFrame` parameter that seeds the chain.
pub const SOURCE_IDENT: &str = "input";

/// Field that keeps the untouched camera frame for drawing.
pub const FRAME_FIELD: &str = "cameraIn";

/// Identifiers bound to one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageBinding {
    pub kind: StageKind,
    /// Private method implementing the stage.
    pub method: String,
    /// Class field the stage writes.
    pub field: String,
    /// Identifier passed to the stage method.
    pub input: String,
    /// Identifier the next stage consumes. Equals `input` for stages
    /// that do not produce a chain output (Contours).
    pub output: String,
    /// Frame the stage draws on, if any.
    pub original_frame: Option<&'static str>,
}

impl StageBinding {
    /// Prefix for method-local identifiers: the field name without its
    /// `Out` suffix (`erodeOut2` -> `erode2`).
    #[must_use]
    pub fn local_prefix(&self) -> &str {
        self.field.strip_suffix("Out").unwrap_or(&self.field)
    }
}

/// The full binding of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Binding {
    pub stages: Vec<StageBinding>,
    /// Top-left corner of the Crop rectangle, when the pipeline crops.
    /// Contours found in cropped coordinates are shifted by it.
    pub origin: Option<(u32, u32)>,
}

impl Binding {
    /// Identifier holding the final chain value.
    #[must_use]
    pub fn chain_output(&self) -> &str {
        self.stages.last().map_or(SOURCE_IDENT, |s| s.output.as_str())
    }
}

const fn names(kind: StageKind) -> (&'static str, &'static str) {
    match kind {
        StageKind::Crop => ("cropOut", "applyCrop"),
        StageKind::Blur => ("blurOut", "applyBlur"),
        StageKind::Erode => ("erodeOut", "applyErode"),
        StageKind::Dilate => ("dilateOut", "applyDilate"),
        StageKind::Threshold => ("thresholdOut", "applyThreshold"),
        StageKind::Contours => ("contours", "findContours"),
    }
}

/// Bind a validated pipeline.
#[must_use]
pub fn bind(pipeline: &Pipeline) -> Binding {
    let kinds: Vec<StageKind> = pipeline.kinds().collect();
    Binding {
        stages: bind_kinds(&kinds),
        origin: pipeline.crop().map(|rect| (rect.left, rect.top)),
    }
}

/// Bind a bare kind sequence. Repeated kinds get a numeric suffix
/// starting at `2` so no identifier is ever reused.
pub(crate) fn bind_kinds(kinds: &[StageKind]) -> Vec<StageBinding> {
    let mut chain = SOURCE_IDENT.to_owned();
    let mut out = Vec::with_capacity(kinds.len());

    for (index, &kind) in kinds.iter().enumerate() {
        let occurrence = kinds[..index].iter().filter(|&&k| k == kind).count() + 1;
        let suffix = if occurrence > 1 {
            occurrence.to_string()
        } else {
            String::new()
        };
        let (field, method) = names(kind);
        let field = format!("{field}{suffix}");

        let output = if kind.produces_chain_output() {
            field.clone()
        } else {
            chain.clone()
        };

        out.push(StageBinding {
            kind,
            method: format!("{method}{suffix}"),
            field,
            input: std::mem::replace(&mut chain, output.clone()),
            output,
            original_frame: (kind == StageKind::Contours).then_some(FRAME_FIELD),
        });
    }

    out
}
