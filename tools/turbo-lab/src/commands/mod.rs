//! CLI command implementations.

pub mod check;
pub mod render;
pub mod run;

use clap::Args;

use crate::script::Step;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Print the effective config as TOML.
    #[arg(long)]
    pub print: bool,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Include island snapshots.
    #[arg(long)]
    pub snapshot: bool,
}

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Session steps, in order (click:, hover:, show:, hide:, wait:<ms>,
    /// act:<island>:<action>, destroy:, report).
    #[arg(short, long = "step", value_name = "STEP")]
    pub steps: Vec<Step>,

    /// Print island snapshots at the end.
    #[arg(long)]
    pub snapshot: bool,
}
