//! ssg — render template sources into static pages and precompiled scripts.
//!
//! # Usage
//!
//! ```text
//! ssg build [ROOT] [--out <dir>] [--globals <file>] [--dry-run] [--verbose]
//! ssg engines [--json]
//! ssg render <file> [--globals <file>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{build::BuildArgs, engines::EnginesArgs, render::RenderArgs};

#[derive(Parser, Debug)]
#[command(
    name = "ssg",
    version,
    about = "Render template sources into static pages and precompiled scripts",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every template under the source directory.
    Build(BuildArgs),

    /// List supported template engines and their extensions.
    Engines(EnginesArgs),

    /// Render a single template to stdout.
    Render(RenderArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Build(args) => args.run().await,
        Commands::Engines(args) => args.run(),
        Commands::Render(args) => args.run().await,
    }
}
