//! PlantView - interactive viewer for telecom outside-plant topology.
//!
//! Shows the whole-network overview and single-route detail graphs served
//! by the topology backend, and saves node positions after dragging.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use iced::application;

use plantview::PlantView;
use plantview::backend::Backend;
use plantview::mock::MockBackend;
use plantview_common::{HttpBackend, PlantViewConfig, init_tracing, load_config_or_default};

#[derive(Parser, Debug)]
#[command(name = "plantview")]
#[command(about = "Interactive viewer for telecom outside-plant topology")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Override the log level
    #[arg(long)]
    log_level: Option<String>,

    /// Run against the built-in demo plant instead of a backend
    #[arg(long)]
    demo: bool,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plantview")
        .join("config.json5")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config: PlantViewConfig = load_config_or_default(&config_path)?;
    if let Some(base_url) = args.api_base {
        config.api.base_url = base_url;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging)?;

    let backend: Backend = if args.demo {
        tracing::info!("Starting PlantView in demo mode");
        Arc::new(MockBackend::new())
    } else {
        tracing::info!(
            api = %config.api.base_url,
            config = %config_path.display(),
            "Starting PlantView"
        );
        Arc::new(HttpBackend::new(&config.api)?)
    };

    application(
        move || PlantView::new(backend.clone(), config.clone()),
        PlantView::update,
        PlantView::view,
    )
    .title(PlantView::title)
    .subscription(PlantView::subscription)
    .theme(PlantView::theme)
    .run()
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
