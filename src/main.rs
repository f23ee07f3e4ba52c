//! `artboard`: headless host for the canvas engine.
//!
//! Creates documents, replays scripted input against them, and exports the
//! artboard region as an image file.

mod script;

use std::path::{Path, PathBuf};

use canvas::asset::{AssetError, decode_data_uri};
use canvas::camera::{ScrollViewport, Size};
use canvas::config::EditorConfig;
use canvas::doc::Artboard;
use canvas::engine::EngineCore;
use canvas::export::{ExportError, ExportFormat, ExportOptions};
use canvas::persist::{DocumentSnapshot, PersistError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::script::ScriptError;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("document error: {0}")]
    Document(#[from] PersistError),
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("export produced an unreadable image: {0}")]
    Asset(#[from] AssetError),
}

#[derive(Parser, Debug)]
#[command(name = "artboard", about = "Create, script and export artboard documents")]
struct Cli {
    /// Viewport width in screen pixels used while replaying and fitting.
    #[arg(long, env = "ARTBOARD_VIEWPORT_WIDTH", default_value_t = 1280.0, global = true)]
    viewport_width: f64,

    #[arg(long, env = "ARTBOARD_VIEWPORT_HEIGHT", default_value_t = 800.0, global = true)]
    viewport_height: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an empty document with a centered artboard.
    New {
        #[arg(long, default_value_t = canvas::consts::ARTBOARD_DEFAULT_SIZE)]
        width: f64,
        #[arg(long, default_value_t = canvas::consts::ARTBOARD_DEFAULT_SIZE)]
        height: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Replay a JSON event script against a document.
    Replay {
        /// Starting document. Omit to start from an empty one.
        #[arg(long)]
        doc: Option<PathBuf>,
        #[arg(long)]
        script: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Also export the resulting artboard to this image file.
        #[arg(long)]
        export: Option<PathBuf>,
        #[command(flatten)]
        image: ImageArgs,
    },
    /// Export a document's artboard region to an image file.
    Export {
        #[arg(long)]
        doc: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        image: ImageArgs,
    },
}

#[derive(Args, Debug)]
struct ImageArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,
    /// JPEG quality in 0..=1.
    #[arg(long, default_value_t = 0.92)]
    quality: f64,
    /// Output pixels per world unit.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

impl ImageArgs {
    fn options(&self) -> ExportOptions {
        let format = match self.format {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
        };
        ExportOptions { format, quality: self.quality, scale: self.scale }
    }
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let viewport = Size::new(cli.viewport_width, cli.viewport_height);
    match cli.command {
        Command::New { width, height, out } => run_new(width, height, &out),
        Command::Replay { doc, script, out, export, image } => {
            run_replay(viewport, doc.as_deref(), &script, &out, export.as_deref(), &image)
        }
        Command::Export { doc, out, image } => run_export(viewport, &doc, &out, &image),
    }
}

fn run_new(width: f64, height: f64, out: &Path) -> Result<(), CliError> {
    let snapshot = DocumentSnapshot { artboard: Artboard::centered(width, height), ..DocumentSnapshot::default() };
    write_file(out, snapshot.to_json()?.as_bytes())?;
    info!(path = %out.display(), width = snapshot.artboard.width, height = snapshot.artboard.height, "document created");
    Ok(())
}

fn run_replay(
    viewport: Size,
    doc: Option<&Path>,
    script_path: &Path,
    out: &Path,
    export: Option<&Path>,
    image: &ImageArgs,
) -> Result<(), CliError> {
    let mut engine = open_engine(viewport, doc)?;
    let events = script::load_script(script_path)?;
    let base_dir = script_path.parent().unwrap_or_else(|| Path::new("."));
    let report = script::replay(&mut engine, &events, base_dir)?;

    write_file(out, engine.snapshot().to_json()?.as_bytes())?;
    info!(path = %out.display(), events = report.events, commits = report.commits, "document saved");

    if let Some(export) = export {
        write_export(&engine, export, image)?;
    }
    Ok(())
}

fn run_export(viewport: Size, doc: &Path, out: &Path, image: &ImageArgs) -> Result<(), CliError> {
    let engine = open_engine(viewport, Some(doc))?;
    write_export(&engine, out, image)
}

fn open_engine(viewport: Size, doc: Option<&Path>) -> Result<EngineCore, CliError> {
    let mut engine = EngineCore::with_viewport(EditorConfig::from_env(), Box::new(ScrollViewport::new(viewport)));
    match doc {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })?;
            engine.restore(DocumentSnapshot::from_json(&json)?);
            info!(path = %path.display(), elements = engine.elements().len(), "document loaded");
        }
        None => engine.fit_artboard(),
    }
    Ok(engine)
}

fn write_export(engine: &EngineCore, out: &Path, image: &ImageArgs) -> Result<(), CliError> {
    let uri = engine.export_as_image(&image.options())?;
    let (mime, bytes) = decode_data_uri(&uri)?;
    write_file(out, &bytes)?;
    info!(path = %out.display(), %mime, bytes = bytes.len(), "artboard exported");
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write { path: path.to_owned(), source })
}
