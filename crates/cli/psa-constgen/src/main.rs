//! psa-constgen - generates `psa_constant_names_generated.c`
//!
//! Reads the PSA crypto header and writes the C functions that turn status
//! codes, key types, curves, algorithms and key usage flags back into names.

#![allow(
    clippy::print_stdout,
    reason = "CLI tool reports its result on stdout"
)]

use anyhow::{Context, Result};
use clap::Parser;
use pcn_collect::Category;
use pcn_driver::{GeneratorConfig, run};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "psa-constgen", version, about = "Generate PSA constant name lookup functions")]
struct Cli {
    /// TOML file overriding the default paths
    #[clap(long)]
    config: Option<PathBuf>,

    /// Header to read, relative to the source tree root
    #[clap(long)]
    header: Option<PathBuf>,

    /// Generated C file, relative to the source tree root
    #[clap(long)]
    output: Option<PathBuf>,

    /// Directory to start looking for the source tree root from
    #[clap(long, short = 'C')]
    directory: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[clap(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(header) = &cli.header {
        config.header.clone_from(header);
    }
    if let Some(output) = &cli.output {
        config.output.clone_from(output);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let start = match &cli.directory {
        Some(directory) => directory.clone(),
        None => env::current_dir().context("Failed to determine current directory")?,
    };

    let report = run(&config, &start)
        .with_context(|| format!("Failed to generate {}", config.output.display()))?;

    println!(
        "Wrote {} ({} statuses, {} key types, {} algorithms, {} key usages)",
        report.output.display(),
        report.count(Category::Status),
        report.count(Category::KeyType) + report.count(Category::KeyTypeFromCurve),
        report.count(Category::Algorithm) + report.count(Category::AlgorithmFromHash),
        report.count(Category::KeyUsage),
    );

    Ok(())
}
