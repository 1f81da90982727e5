//! visiongen: compile a stage pipeline into an EasyOpenCV Java class.
//!
//! Reads a `PipelineConfig` (JSON file, inline JSON, or the built-in
//! default), validates it, and writes the generated `OpenCvPipeline`
//! subclass to stdout or a file. Optionally runs the same pipeline over
//! a sample image and writes one PNG per stage.
//!
//! # Usage
//!
//! ```text
//! cargo run --bin visiongen -- [OPTIONS] [CONFIG]
//! visiongen --print-default > pipeline.json
//! visiongen pipeline.json --class-name BlueDetector -o BlueDetector.java
//! visiongen pipeline.json --preview frame.png --preview-dir preview/
//! ```
//!
//! Set `RUST_LOG=debug` to trace validation and emission.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use visiongen_export::{ExportOptions, FrameFormat, compile};
use visiongen_pipeline::{PipelineConfig, PreviewFrame, preview_bytes, validate};

/// Generate EasyOpenCV pipeline source from a stage configuration.
#[derive(Parser)]
#[command(name = "visiongen", version)]
struct Cli {
    /// Path to a pipeline configuration (JSON). Uses the default
    /// pipeline when omitted.
    config: Option<PathBuf>,

    /// Pipeline configuration as a JSON string.
    ///
    /// Cannot be combined with a CONFIG path.
    #[arg(long, conflicts_with = "config")]
    config_json: Option<String>,

    /// Print the default configuration as JSON and exit.
    #[arg(long)]
    print_default: bool,

    /// Name of the generated class.
    #[arg(long, default_value = "Pipeline")]
    class_name: String,

    /// Java package for the generated file.
    #[arg(long)]
    package: Option<String>,

    /// Channel layout of the frames the camera delivers.
    #[arg(long, value_enum, default_value_t = Format::Rgba)]
    frame_format: Format,

    /// Write the Java source to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sample image to run the pipeline on (PNG, JPEG, BMP, WebP).
    #[arg(long, requires = "preview_dir")]
    preview: Option<PathBuf>,

    /// Directory receiving one PNG per preview stage.
    #[arg(long, requires = "preview")]
    preview_dir: Option<PathBuf>,
}

/// Frame layout selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// EasyOpenCV default.
    Rgba,
    /// Plain OpenCV camera frames.
    Bgr,
    Rgb,
}

const fn frame_format(format: Format) -> FrameFormat {
    match format {
        Format::Rgba => FrameFormat::Rgba,
        Format::Bgr => FrameFormat::Bgr,
        Format::Rgb => FrameFormat::Rgb,
    }
}

/// Load the pipeline configuration selected on the command line.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let Some(ref path) = cli.config else {
        info!("no configuration given, using the default pipeline");
        return Ok(PipelineConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn options_from_cli(cli: &Cli) -> ExportOptions {
    ExportOptions {
        class_name: cli.class_name.clone(),
        package: cli.package.clone(),
        frame_format: frame_format(cli.frame_format),
    }
}

/// File name for the `index`-th preview frame, e.g. `01-hsv-threshold.png`.
fn frame_file_name(index: usize, frame: &PreviewFrame) -> String {
    let slug = frame.caption.to_lowercase().replace(' ', "-");
    format!("{index:02}-{slug}.png")
}

fn write_preview(config: &PipelineConfig, image_path: &Path, dir: &Path) -> Result<(), String> {
    let pipeline = validate(config).map_err(|e| format!("Invalid pipeline: {e}"))?;
    let bytes = std::fs::read(image_path)
        .map_err(|e| format!("Error reading {}: {e}", image_path.display()))?;
    let frames =
        preview_bytes(&pipeline, &bytes).map_err(|e| format!("Preview failed: {e}"))?;

    std::fs::create_dir_all(dir).map_err(|e| format!("Error creating {}: {e}", dir.display()))?;
    for (index, frame) in frames.iter().enumerate() {
        let path = dir.join(frame_file_name(index, frame));
        frame
            .image
            .save(&path)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        info!(caption = frame.caption, path = %path.display(), "preview frame written");
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), String> {
    if cli.print_default {
        let json = serde_json::to_string_pretty(&PipelineConfig::default())
            .map_err(|e| format!("Error serializing default config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let config = config_from_cli(cli)?;
    if config.stages.is_empty() {
        warn!("pipeline has no stages; the generated class only passes frames through");
    }
    let options = options_from_cli(cli);
    let java = compile(&config, &options).map_err(|e| format!("Cannot generate Java: {e}"))?;

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, &java)
                .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
            info!(path = %path.display(), bytes = java.len(), "java source written");
        }
        None => print!("{java}"),
    }

    if let (Some(image), Some(dir)) = (&cli.preview, &cli.preview_dir) {
        write_preview(&config, image, dir)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
