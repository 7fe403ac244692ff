//! kura shell entry point.
//!
//! ```bash
//! cargo run -p kura-repl -- --project notes --namespace /team
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kura_repl::config::KuraConfig;

#[derive(Parser, Debug)]
#[command(name = "kura")]
#[command(about = "Interactive shell for the kura versioned filesystem")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/kura/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Project to open
    #[arg(short, long)]
    project: Option<String>,

    /// Namespace applied to every path
    #[arg(short, long)]
    namespace: Option<String>,

    /// Prune each file to this many versions after every write
    #[arg(long)]
    keep_versions: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => KuraConfig::load_from(path)?,
        None => KuraConfig::load()?,
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(project) = args.project {
        config.project = project;
    }
    if let Some(namespace) = args.namespace {
        config.namespace = Some(namespace);
    }
    if let Some(keep) = args.keep_versions {
        config.keep_versions = Some(keep);
    }

    tracing::debug!(?config, "starting kura");
    kura_repl::run(config)
}
