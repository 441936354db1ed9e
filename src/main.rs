mod app;
mod config;
mod graph;
mod population;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::{LaunchOptions, RelGraphApp};
use crate::config::Settings;
use crate::population::{JsonSink, NullSink, PersistenceSink};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Account to analyze as soon as the window opens.
    #[arg(long)]
    target: Option<String>,

    /// Discovery depth (1-3); overrides the settings file.
    #[arg(long)]
    depth: Option<u8>,

    /// Stretch discovery delays; overrides the settings file.
    #[arg(long)]
    stealth: Option<bool>,

    /// JSON settings file, created when settings change in the UI.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write discovered profiles and connections as JSON into this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Seed for reproducible graphs.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "relgraph=info,warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load_or_default(path).unwrap_or_else(|error| {
            let error = anyhow::Error::from(error);
            warn!("falling back to default settings: {error:#}");
            Settings::default()
        }),
        None => Settings::default(),
    }
    .with_overrides(args.depth, args.stealth);

    let sink: Box<dyn PersistenceSink> = match &args.export_dir {
        Some(dir) => Box::new(
            JsonSink::spawn(dir)
                .with_context(|| format!("failed to start exporter for {}", dir.display()))?,
        ),
        None => Box::new(NullSink),
    };

    info!(
        depth = settings.depth(),
        stealth = settings.stealth_mode,
        export = args.export_dir.is_some(),
        "starting relgraph"
    );

    let launch = LaunchOptions {
        settings,
        settings_path: args.settings,
        sink,
        seed: args.seed,
        target: args.target,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "relgraph",
        options,
        Box::new(move |cc| Ok(Box::new(RelGraphApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("failed to run relgraph window: {error}"))
}
