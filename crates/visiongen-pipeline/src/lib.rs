//! visiongen-pipeline: stage catalog, pipeline validation and preview
//! (sans-IO).
//!
//! A pipeline is an ordered list of vision stages (Crop, Blur, Erode,
//! Dilate, Threshold, Contours). Raw [`PipelineConfig`] values are
//! checked and bound by [`validate`], the only way to obtain a
//! [`Pipeline`]. A validated pipeline can be compiled to Java by
//! `visiongen-export` or run over a sample image with [`preview`].
//!
//! This crate has **no I/O dependencies**: it works on in-memory values
//! and byte slices. File access lives in the `visiongen` CLI.

pub mod blur;
pub mod catalog;
pub mod contour;
pub mod crop;
pub mod decode;
pub mod frame;
pub mod morphology;
pub mod preview;
pub mod stage;
pub mod threshold;
pub mod types;
pub mod validate;

pub use catalog::{OrderingConstraint, ParamDomain, ParamSpec, instantiate};
pub use contour::ContourTracer;
pub use frame::Frame;
pub use preview::{PreviewFrame, preview, preview_bytes};
pub use stage::{
    ApproxMethod, BlurParams, ChannelRange, ContourParams, CropRect, MorphParams, StageInstance,
    StageKind, StructuringShape, Symbolic, ThresholdParams,
};
pub use types::{ParamValue, Pipeline, PipelineConfig, PipelineError, StageConfig};
pub use validate::{check_order, validate};
