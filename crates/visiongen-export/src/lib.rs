//! visiongen-export: EasyOpenCV Java generation (sans-IO).
//!
//! Compiles a validated pipeline into the source of an `OpenCvPipeline`
//! subclass in three steps:
//!
//! 1. [`bind`] assigns fields, method names and dataflow identifiers,
//! 2. [`emit`] builds the [`CompilationUnit`] IR,
//! 3. [`to_java`] renders it.
//!
//! [`compile`] runs validation and all three steps.

pub mod ast;
pub mod bind;
pub mod emit;
pub mod error;
pub mod render;

pub use ast::CompilationUnit;
pub use bind::{Binding, StageBinding, bind};
pub use emit::{
    ExportOptions, FrameFormat, approx_constant, emit, is_java_identifier, shape_constant,
};
pub use error::ExportError;
pub use render::to_java;

use tracing::debug;
use visiongen_pipeline::{PipelineConfig, validate};

/// Validate `config` and `options`, then generate the Java source.
///
/// Either the whole file is produced or nothing is.
///
/// # Errors
///
/// Returns [`ExportError::InvalidClassName`] or
/// [`ExportError::InvalidPackage`] when the options would produce Java
/// that does not compile, and [`ExportError::Pipeline`] when the
/// configuration is not a valid pipeline.
pub fn compile(config: &PipelineConfig, options: &ExportOptions) -> Result<String, ExportError> {
    options.check()?;
    let pipeline = validate(config)?;
    let binding = bind(&pipeline);
    let unit = emit(&pipeline, &binding, options);
    let java = to_java(&unit);
    debug!(
        class = %options.class_name,
        stages = pipeline.len(),
        bytes = java.len(),
        "pipeline compiled"
    );
    Ok(java)
}
