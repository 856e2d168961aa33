// SPDX-License-Identifier: PMPL-1.0-or-later
//! a11y-audit CLI - audit HTML snapshots for accessibility compliance

use a11y_audit::config::{load_config, write_default_config};
use a11y_audit::report::render;
use a11y_audit::{snapshot, AuditConfig, Auditor, GuidelineLevel, OutputFormat, Severity};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Rule-based accessibility compliance audit engine
#[derive(Parser)]
#[command(name = "a11y-audit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a snapshot file or every snapshot under a directory
    Check {
        /// Snapshot file or directory
        path: PathBuf,

        /// WCAG conformance level (overrides the config file)
        #[arg(long)]
        level: Option<LevelArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Configuration file (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        file: PathBuf,
    },
}

/// WCAG conformance level CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    /// Level A - minimum
    A,
    /// Level AA - standard
    Aa,
    /// Level AAA - enhanced
    Aaa,
}

impl From<LevelArg> for GuidelineLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::A => GuidelineLevel::A,
            LevelArg::Aa => GuidelineLevel::AA,
            LevelArg::Aaa => GuidelineLevel::AAA,
        }
    }
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("a11y_audit=debug")
    } else {
        EnvFilter::new("a11y_audit=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { path, level, format, output, config, verbose } => {
            init_logging(verbose);

            let mut settings = match &config {
                Some(file) => load_config(file)
                    .with_context(|| format!("failed to load config from {}", file.display()))?,
                None => AuditConfig::default(),
            };
            if let Some(level) = level {
                settings.target_level = level.into();
            }

            let auditor = Auditor::new(settings);
            let files = snapshot::snapshot_files(&path);
            if files.is_empty() {
                anyhow::bail!("no HTML snapshots found at {}", path.display());
            }
            for file in &files {
                let tree = snapshot::load_snapshot(file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let summary = auditor.run_pass(&tree);
                info!("{}: {} issue(s)", file.display(), summary.diagnostics_added);
            }

            let report = auditor.generate_report();
            let rendered = render(&report, &auditor.get_issues(None), format.into());
            write_output(&rendered, output.as_deref())?;

            if report.counts_by_severity.get(Severity::High) > 0 {
                std::process::exit(1);
            }
        }

        Commands::InitConfig { file } => {
            write_default_config(&file)
                .with_context(|| format!("failed to write {}", file.display()))?;
            eprintln!("Default configuration written to {}", file.display());
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
