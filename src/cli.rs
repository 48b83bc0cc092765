use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lead-kpi",
    version,
    about = "Monthly lead KPI scoring from lead, attendance and project-hour sheets"
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute scores and publish every table
    Run(RunCommand),
    /// Validate config and inputs without writing anything
    Check(CheckCommand),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    Audit,
    Master,
    Both,
}

#[derive(Args)]
pub struct RunCommand {
    /// Config file (defaults to ./lead_kpi.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured publish strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    /// Rows of the final report to print after publishing
    #[arg(long)]
    pub preview: Option<usize>,
}

#[derive(Args)]
pub struct CheckCommand {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
