//! Interactive anime catalog explorer.
//!
//! Fetches from Jikan (optionally cross-referenced with AniList),
//! filters locally, ranks by a Bayesian-shrinkage score, and draws a
//! terminal bar chart. All parameters are set in an interactive shell;
//! `start` runs the pipeline and the session survives any error.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod chart;
mod params;
mod pipeline;
mod shell;

use params::SessionParams;
use pipeline::App;
use shell::Shell;

/// CLI arguments.
#[derive(Parser)]
#[command(name = "hyouka")]
#[command(about = "Explore and rank anime catalog data interactively")]
#[command(version)]
struct Cli {
    /// Cache CSV path (overrides the default under the user data dir)
    #[arg(short, long, env = "HYOUKA_CACHE")]
    cache: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut params = SessionParams::default();
    if let Some(cache) = cli.cache {
        params.cache_path = cache;
    }

    let app = App::new()?;
    Shell::new(app, params)?.run()
}
