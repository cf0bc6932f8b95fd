mod app;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use page_graph::GraphConfig;
use page_graph::source::{JsonDirSource, LoadRequest};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    #[arg(long, default_value = "default")]
    workspace: String,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    sample_edges: bool,
    #[arg(long, allow_hyphen_values = true)]
    charge_strength: Option<f32>,
    #[arg(long)]
    link_distance: Option<f32>,
    #[arg(long)]
    link_strength: Option<f32>,
    #[arg(long)]
    node_size_floor: Option<f32>,
    #[arg(long)]
    hide_labels: bool,
}

impl Args {
    fn graph_config(&self) -> Result<GraphConfig> {
        let mut config = match &self.config {
            Some(path) => GraphConfig::load(path)?,
            None => GraphConfig::default(),
        };
        if let Some(value) = self.charge_strength {
            config.charge_strength = value;
        }
        if let Some(value) = self.link_distance {
            config.link_distance = value;
        }
        if let Some(value) = self.link_strength {
            config.link_strength = value;
        }
        if let Some(value) = self.node_size_floor {
            config.node_size_floor = value;
        }
        if self.hide_labels {
            config.show_labels = false;
        }
        Ok(config.sanitized())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args
        .graph_config()
        .context("failed to resolve graph settings")?;
    let request = LoadRequest {
        source: Arc::new(JsonDirSource::new(args.data_dir.clone())),
        workspace_id: args.workspace.clone(),
        sample_edges: args.sample_edges,
    };
    tracing::info!(
        data_dir = %args.data_dir.display(),
        workspace = %args.workspace,
        "starting viewer"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "page-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::PageGraphApp::new(cc, request, config)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}
