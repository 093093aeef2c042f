//! foodlens - command-line client for the FoodLens analysis server
//!
//! Analyzes food and label photos, looks up barcodes, replays barcode reads
//! through the scan gate, and manages the persisted server URL.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use foodlens_client::models::AllergyProfile;
use foodlens_client::scan::{BarcodeRead, CameraEvent, ReadBounds, ScanMode, SessionEnd};
use foodlens_client::services::{
    AnalysisEndpoint, ImageUpload, ProgressCallback, StaticProfileSource,
};
use foodlens_client::{ClientConfig, FoodAnalyzer};
use foodlens_common::config::{resolve_config_path, set_server_url};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Preview size used when replaying reads from stdin
const REPLAY_VIEWPORT: (f64, f64) = (400.0, 800.0);

#[derive(Parser, Debug)]
#[command(name = "foodlens")]
#[command(about = "FoodLens food-safety analysis client")]
#[command(version)]
struct Args {
    /// Config file (defaults to FOODLENS_CONFIG, then the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Allergen to check for (repeatable)
    #[arg(short, long = "allergy", global = true)]
    allergies: Vec<String>,

    /// Dietary restriction such as "Vegan" or "Halal" (repeatable)
    #[arg(short = 'r', long = "restriction", global = true)]
    restrictions: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a photo
    Analyze {
        image: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Mode::Food)]
        mode: Mode,

        /// ISO 3166 country code of the user's location
        #[arg(long, default_value = "US")]
        country: String,
    },
    /// Look up a product barcode
    Lookup { barcode: String },
    /// Replay barcode reads from stdin through the scan gate
    ///
    /// One barcode per line; a line `mode food|label|barcode` switches the
    /// camera mode.
    Scan,
    /// Show, set or clear the persisted server URL
    ServerUrl {
        url: Option<String>,

        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Food,
    Label,
    Smart,
}

impl From<Mode> for AnalysisEndpoint {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Food => AnalysisEndpoint::Analyze,
            Mode::Label => AnalysisEndpoint::Label,
            Mode::Smart => AnalysisEndpoint::Smart,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "result": value,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_scan_line(line: &str) -> Option<CameraEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(mode) = line.strip_prefix("mode ") {
        let mode = match mode.trim().to_ascii_lowercase().as_str() {
            "food" => ScanMode::Food,
            "label" => ScanMode::Label,
            _ => ScanMode::Barcode,
        };
        return Some(CameraEvent::ModeChanged(mode));
    }

    // Replayed reads sit in the middle of the preview
    let (width, height) = REPLAY_VIEWPORT;
    let bounds = ReadBounds::new(width / 2.0 - 20.0, height / 2.0 - 20.0, 40.0, 40.0);
    Some(CameraEvent::Read(BarcodeRead::new(line, bounds)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        ClientConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting foodlens {}", foodlens_client::build_info());
    info!(server_url = %config.server_url, locale = %config.locale_tag, "Configuration resolved");

    let profile = StaticProfileSource::new(AllergyProfile::new(args.allergies, args.restrictions));

    match args.command {
        Command::ServerUrl { url, clear } => {
            let path = resolve_config_path(args.config.as_deref())?;
            match (url, clear) {
                (_, true) => {
                    set_server_url(&path, "")?;
                    println!("Server URL cleared ({})", path.display());
                }
                (Some(url), false) => {
                    set_server_url(&path, &url)?;
                    println!("Server URL saved to {}", path.display());
                }
                (None, false) => println!("{}", config.server_url),
            }
        }
        Command::Analyze { image, mode, country } => {
            let analyzer = FoodAnalyzer::new(config, Arc::new(profile))?;
            let upload = ImageUpload::from_path(&image)
                .await
                .with_context(|| format!("Failed to read image {}", image.display()))?;

            let progress: ProgressCallback = Arc::new(|fraction| {
                tracing::debug!(percent = (fraction * 100.0).round() as u32, "Upload progress");
            });

            let result = analyzer
                .analyze(mode.into(), &upload, &country, Some(progress))
                .await
                .map_err(|e| {
                    let hint = e.user_message(analyzer.config().locale());
                    anyhow::Error::new(e).context(hint)
                })?;
            print_json(&result)?;
        }
        Command::Lookup { barcode } => {
            let analyzer = FoodAnalyzer::new(config, Arc::new(profile))?;
            let outcome = analyzer.lookup_barcode(&barcode).await?;
            print_json(&outcome)?;
        }
        Command::Scan => {
            let analyzer = FoodAnalyzer::new(config, Arc::new(profile))?;
            let (width, height) = REPLAY_VIEWPORT;
            let mut session = analyzer.scan_session(width, height);

            let lines = BufReader::new(tokio::io::stdin()).lines();
            let events = futures::stream::unfold(lines, |mut lines| async move {
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            if let Some(event) = parse_scan_line(&line) {
                                return Some((event, lines));
                            }
                        }
                        _ => return None,
                    }
                }
            });

            match session.run(Box::pin(events)).await {
                SessionEnd::Resolved(product) => print_json(&product)?,
                SessionEnd::StreamEnded => {
                    print_json(&session.not_found())?;
                    bail!("No barcode resolved to a product");
                }
            }
        }
    }

    Ok(())
}
