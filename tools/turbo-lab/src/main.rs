//! Turbo Lab - drive a TurboCommerce storefront in a simulated host.
//!
//! Commands:
//! - `turbo-lab check` - Validate a storefront config
//! - `turbo-lab render` - Pre-render the page; nothing hydrates
//! - `turbo-lab run` - Interactive session driven by `--step` events

mod commands;
mod context;
mod output;
mod script;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, RenderArgs, RunArgs};

/// Turbo Lab - exercise deferred islands without a browser
#[derive(Parser)]
#[command(name = "turbo-lab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a storefront config
    Check(CheckArgs),

    /// Pre-render the page
    Render(RenderArgs),

    /// Run an interactive session
    Run(RunArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = output::Output::new(cli.verbose, cli.json);

    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Controllers and islands run on local tasks.
    let local = LocalSet::new();
    let result = local
        .run_until(async {
            match cli.command {
                Commands::Check(args) => commands::check::run(args, &ctx).await,
                Commands::Render(args) => commands::render::run(args, &ctx).await,
                Commands::Run(args) => commands::run::run(args, &ctx).await,
            }
        })
        .await;

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
