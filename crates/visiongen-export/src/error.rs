use visiongen_pipeline::PipelineError;

/// Errors that stop Java generation before any text is produced.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The configuration is not a valid pipeline.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The requested class name would not compile.
    #[error("class name {0:?} is not a valid Java type name")]
    InvalidClassName(String),

    /// The requested package would not compile.
    #[error("package {0:?} is not a dot-separated list of Java identifiers")]
    InvalidPackage(String),
}
