mod app;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use market_graph::config::AppConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph payload: `{ "nodes": [...], "connections": [...] }`.
    payload: PathBuf,

    /// JSON file overriding simulation, viewport and encoding defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scale node radius linearly with connection count instead of by log.
    #[arg(long)]
    linear_radius: bool,

    /// Power-law exponent applied to normalized edge pressure.
    #[arg(long)]
    opacity_exponent: Option<f32>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if self.linear_radius {
            config.simulation.log_radius = false;
        }
        if let Some(exponent) = self.opacity_exponent {
            config.encoding.opacity.exponent = exponent;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.app_config()?;
    info!(payload = %args.payload.display(), "starting market graph viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let payload = args.payload;
    eframe::run_native(
        "market-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::MarketGraphApp::new(cc, payload, config)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
