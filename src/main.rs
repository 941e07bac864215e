mod app;
mod graph;
mod layout;
mod people;
mod summary;
mod util;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::graph::{Dimension, GraphConfig, TopologyMode};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON array of people (or an object with a `people` array).
    #[arg(long, short)]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = Dimension::Education)]
    dimension: Dimension,

    #[arg(long, value_enum, default_value_t = TopologyMode::Bipartite)]
    mode: TopologyMode,

    /// Minimum pairwise similarity, 0 to 1.
    #[arg(long, default_value_t = 0.1)]
    threshold: f32,

    #[arg(long, default_value_t = 60)]
    max_nodes: usize,

    /// Number of largest groups that get their own color.
    #[arg(long, default_value_t = 8)]
    top_n: usize,

    /// Keep people outside every colored group in bipartite mode.
    #[arg(long)]
    include_isolated: bool,

    /// Print the generated graph as JSON instead of opening a window.
    #[arg(long)]
    summary: bool,

    /// Tracing filter, e.g. `debug` or `kinship_graph=trace`. Falls back to
    /// `RUST_LOG`, then `info`.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            dimension: self.dimension,
            mode: self.mode,
            threshold: self.threshold,
            max_nodes: self.max_nodes,
            top_n: self.top_n,
            include_isolated: self.include_isolated,
            ..GraphConfig::default()
        }
        .sanitized()
    }
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow!("{error}"))
}

fn print_summary(args: &Args, config: &GraphConfig) -> Result<()> {
    let population = people::load_population(&args.input)?;
    let summary = summary::summarize(&population.people, &population.errors, config);

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary).context("failed to write summary")?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    let config = args.graph_config();
    info!(?config, input = %args.input.display(), "starting");

    if args.summary {
        return print_summary(&args, &config);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let input = args.input.clone();
    eframe::run_native(
        "kinship-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::KinshipGraphApp::new(cc, input, config)))),
    )
    .map_err(|error| anyhow!("{error}"))
}
