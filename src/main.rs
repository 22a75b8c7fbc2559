use std::collections::BTreeMap;

use canvas::camera::Size;
use canvas::doc::{Block, BlockKind};
use canvas::engine::EngineCore;
use canvas::markers::{MarkerKind, scan_markers};
use clap::{Args, Parser, Subcommand};
use notecanvas::api::rest::RestClient;
use notecanvas::api::{ApiError, CanvasStore, CommandSource};
use notecanvas::config::{ClientConfig, ConfigError};
use notecanvas::services::document::{self, CanvasOrigin, LoadedCanvas};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "notecanvas", about = "Inspect and migrate note canvases")]
struct Cli {
    /// Overrides `NOTECANVAS_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a note's canvas.
    Inspect(InspectArgs),
    /// Print a note's canvas in the current format.
    Export { note_id: String },
    /// Rewrite a legacy canvas in the current format.
    Migrate {
        note_id: String,
        /// Save the converted canvas; without it only the result is printed.
        #[arg(long)]
        write: bool,
    },
    /// List the `@` command menu entries.
    Commands,
}

#[derive(Args, Debug)]
struct InspectArgs {
    note_id: String,

    /// Viewport used for the zoom-to-fit camera, as `WIDTHxHEIGHT`.
    #[arg(long, default_value = "1280x800", value_parser = parse_viewport)]
    viewport: Size,
}

fn parse_viewport(raw: &str) -> Result<Size, String> {
    let (w, h) = raw.split_once(['x', 'X']).ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport must be positive".to_string());
    }
    Ok(Size::new(width, height))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    let client = RestClient::new(&config)?;

    match cli.command {
        Command::Inspect(args) => run_inspect(&client, &args).await,
        Command::Export { note_id } => {
            let loaded = load(&client, &note_id).await?;
            print_json(&document::encode(&loaded.blocks, &loaded.camera, loaded.legacy_store.as_ref()))
        }
        Command::Migrate { note_id, write } => run_migrate(&client, &note_id, write).await,
        Command::Commands => {
            let catalog = client.get_commands().await?;
            print_json(&serde_json::to_value(catalog)?)
        }
    }
}

async fn load(client: &RestClient, note_id: &str) -> Result<LoadedCanvas, CliError> {
    let note = client.load_note(note_id).await?;
    Ok(document::decode_or_empty(note_id, note.canvas_data.as_ref()))
}

async fn run_inspect(client: &RestClient, args: &InspectArgs) -> Result<(), CliError> {
    let loaded = load(client, &args.note_id).await?;

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    let mut reminders = 0;
    let mut annotations = 0;
    for block in &loaded.blocks {
        let kind = match block.kind() {
            BlockKind::Text => "text",
            BlockKind::Shape => "shape",
            BlockKind::Icon => "icon",
        };
        *kinds.entry(kind).or_default() += 1;
        if let Block::Text(text) = block {
            for marker in scan_markers(&text.content) {
                match marker.kind {
                    MarkerKind::Reminder => reminders += 1,
                    MarkerKind::Annotation => annotations += 1,
                }
            }
        }
    }

    let mut engine = EngineCore::new();
    engine.load(loaded.blocks, loaded.camera);
    engine.set_viewport(args.viewport.width, args.viewport.height);
    engine.zoom_to_fit();

    print_json(&json!({
        "note_id": args.note_id,
        "origin": origin_name(loaded.origin),
        "skipped": loaded.skipped,
        "blocks": kinds,
        "markers": { "reminders": reminders, "annotations": annotations },
        "camera": loaded.camera,
        "fit_camera": engine.camera(),
    }))
}

async fn run_migrate(client: &RestClient, note_id: &str, write: bool) -> Result<(), CliError> {
    let loaded = load(client, note_id).await?;
    if loaded.origin != CanvasOrigin::Legacy {
        info!(note_id = %note_id, origin = origin_name(loaded.origin), "nothing to migrate");
        return Ok(());
    }
    let converted = document::encode(&loaded.blocks, &loaded.camera, loaded.legacy_store.as_ref());
    if write {
        client.save_canvas(note_id, &converted).await?;
        info!(note_id = %note_id, blocks = loaded.blocks.len(), skipped = loaded.skipped, "canvas migrated");
    }
    print_json(&converted)
}

fn origin_name(origin: CanvasOrigin) -> &'static str {
    match origin {
        CanvasOrigin::V2 => "v2",
        CanvasOrigin::Legacy => "legacy",
        CanvasOrigin::Empty => "empty",
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
