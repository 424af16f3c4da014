use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "redeem",
    about = "One-time code redemption against a shared prize pool",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Redeem codes one after another against a scenario
    Play(PlayArgs),
    /// Redeem every code in a scenario concurrently and audit the result
    Simulate(SimulateArgs),
    /// Show the public pool configuration of a scenario
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct PlayArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,
    /// Codes to redeem, in order
    #[arg(required = true)]
    pub codes: Vec<String>,
    /// Requester identity recorded with each redemption
    #[arg(long = "as")]
    pub requester: Option<String>,
    /// Seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,
    /// Maximum redemptions in flight at once
    #[arg(short, long, default_value = "16")]
    pub concurrency: usize,
    /// Seed for the draw sequence (winners only repeat with --concurrency 1)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,
}
