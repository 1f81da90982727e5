//! Stage-by-stage preview on a sample frame.
//!
//! Runs a validated [`Pipeline`] over a still image with the same
//! dataflow as the generated code: every stage consumes the previous
//! stage's output, Contours passes its input through unchanged and draws
//! onto the uncropped source frame.

use tracing::debug;

use crate::blur::blur;
use crate::contour::{ContourTracer, draw_contours};
use crate::crop::{clamp_rect, crop};
use crate::decode::decode_rgba;
use crate::frame::Frame;
use crate::morphology::{dilate, erode};
use crate::stage::{StageInstance, StageKind};
use crate::threshold::hsv_threshold;
use crate::types::{Pipeline, PipelineError, RgbaImage};

/// One captioned image produced by the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    /// "Input" for the source frame, otherwise the stage caption.
    pub caption: &'static str,
    /// `None` for the source frame.
    pub stage: Option<StageKind>,
    pub image: RgbaImage,
}

/// Run every stage of `pipeline` over `source`.
///
/// The first frame is the untouched source, followed by one frame per
/// stage in pipeline order. The Contours frame shows the source with
/// the traced contours drawn on it.
#[must_use]
pub fn preview(pipeline: &Pipeline, source: &RgbaImage) -> Vec<PreviewFrame> {
    let mut frames = Vec::with_capacity(pipeline.len() + 1);
    frames.push(PreviewFrame {
        caption: "Input",
        stage: None,
        image: source.clone(),
    });

    let mut chain = Frame::Color(source.clone());
    let mut origin = (0, 0);

    for stage in pipeline.stages() {
        let shown = match stage {
            StageInstance::Crop(rect) => {
                let clamped = clamp_rect(rect, source.width(), source.height());
                origin = (clamped.left, clamped.top);
                chain = Frame::Color(crop(source, &clamped));
                chain.to_rgba()
            }
            StageInstance::Blur(params) => {
                chain = blur(&chain, params);
                chain.to_rgba()
            }
            StageInstance::Erode(params) => {
                chain = erode(&chain, params);
                chain.to_rgba()
            }
            StageInstance::Dilate(params) => {
                chain = dilate(&chain, params);
                chain.to_rgba()
            }
            StageInstance::Threshold(params) => {
                chain = Frame::Mask(hsv_threshold(&chain.to_rgba(), params));
                chain.to_rgba()
            }
            StageInstance::Contours(params) => {
                let contours = params.method.trace(&chain.to_mask());
                debug!(count = contours.len(), "contours traced");
                let mut canvas = source.clone();
                draw_contours(&mut canvas, &contours, origin);
                canvas
            }
        };

        let kind = stage.kind();
        debug!(stage = %kind, "preview stage complete");
        frames.push(PreviewFrame {
            caption: kind.caption(),
            stage: Some(kind),
            image: shown,
        });
    }

    frames
}

/// Decode `image_bytes` and run [`preview`] on it.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// when the bytes are not a readable image.
pub fn preview_bytes(
    pipeline: &Pipeline,
    image_bytes: &[u8],
) -> Result<Vec<PreviewFrame>, PipelineError> {
    let source = decode_rgba(image_bytes)?;
    Ok(preview(pipeline, &source))
}
