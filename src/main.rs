use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gem_license_checkr::checker;
use gem_license_checkr::cli::{CheckArgs, Cli, Command, InitArgs, ListArgs};
use gem_license_checkr::config::{self, PROJECT_CONFIG_FILE, SAMPLE_CONFIG};
use gem_license_checkr::fetcher::{FetcherConfig, LicenseFetcher};
use gem_license_checkr::models::{Dependency, LicenseInfo};
use gem_license_checkr::report;
use gem_license_checkr::resolver;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::List(args) => list(args, cli.quiet).await,
        Command::Check(args) => check(args, cli.quiet).await,
        Command::Init(args) => init(args),
        Command::Version => {
            println!("gem-license-checkr {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn list(args: ListArgs, quiet: bool) -> Result<ExitCode> {
    let dependencies = resolver::resolve(&args.gemfile_lock, args.recursive)?;
    let infos = fetch_licenses(&dependencies, project_dir(&args.gemfile_lock), quiet).await?;

    let rendered = report::render_list(args.format, &infos)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!("  {} report written to {}", "→".cyan(), path.display());
            }
        }
        None => print!("{}", rendered),
    }

    Ok(ExitCode::SUCCESS)
}

async fn check(args: CheckArgs, quiet: bool) -> Result<ExitCode> {
    // Policy errors should surface before any network traffic.
    let policy = config::load_policy(Path::new("."), args.config.as_deref())?;

    let dependencies = resolver::resolve(&args.gemfile_lock, args.recursive)?;
    let infos = fetch_licenses(&dependencies, project_dir(&args.gemfile_lock), quiet).await?;

    let result = checker::check(&policy, &infos);
    info!(
        passed = result.passed.len(),
        violations = result.violations.len(),
        warnings = result.warnings.len(),
        "check finished"
    );

    print!("{}", report::render_check(args.format, &result)?);

    if result.has_violations() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init(args: InitArgs) -> Result<ExitCode> {
    let path = Path::new(PROJECT_CONFIG_FILE);

    if path.exists() && !args.force {
        eprintln!(
            "{} {} already exists (use --force to overwrite)",
            "!".yellow().bold(),
            PROJECT_CONFIG_FILE
        );
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::write(path, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", PROJECT_CONFIG_FILE))?;
    println!("{} Created {}", "✓".green().bold(), PROJECT_CONFIG_FILE);

    Ok(ExitCode::SUCCESS)
}

/// Directory holding the lockfile; Bundler installs are looked up relative to it.
fn project_dir(gemfile_lock: &Path) -> &Path {
    gemfile_lock
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

async fn fetch_licenses(
    dependencies: &[Dependency],
    project_dir: &Path,
    quiet: bool,
) -> Result<Vec<LicenseInfo>> {
    info!(count = dependencies.len(), "resolved dependencies");

    let fetcher = LicenseFetcher::new(&FetcherConfig::from_env(project_dir))?;

    let pb = if !quiet && !dependencies.is_empty() {
        let pb = ProgressBar::new(dependencies.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let infos = fetcher
        .fetch_all_with_progress(dependencies, pb.as_ref())
        .await;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    Ok(infos)
}
