use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "gem-license-checkr",
    about = "Resolve Bundler dependency licenses and check them against a policy",
    version
)]
pub struct Cli {
    /// Hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show license information for each dependency
    List(ListArgs),
    /// Validate dependency licenses against the policy file
    Check(CheckArgs),
    /// Create a sample .gem-license-checkr.toml
    Init(InitArgs),
    /// Show the current version
    Version,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table", value_name = "FORMAT")]
    pub format: ReportFormat,

    /// Include transitive dependencies
    #[arg(short, long)]
    pub recursive: bool,

    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to Gemfile.lock
    #[arg(long = "gemfile-lock", default_value = "Gemfile.lock", value_name = "PATH")]
    pub gemfile_lock: PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Policy file [default: ./.gem-license-checkr.toml, fallback ~/.config/gem-license-checkr/config.toml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", value_name = "FORMAT")]
    pub format: ReportFormat,

    /// Include transitive dependencies
    #[arg(short, long)]
    pub recursive: bool,

    /// Path to Gemfile.lock
    #[arg(long = "gemfile-lock", default_value = "Gemfile.lock", value_name = "PATH")]
    pub gemfile_lock: PathBuf,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing policy file
    #[arg(long)]
    pub force: bool,
}
