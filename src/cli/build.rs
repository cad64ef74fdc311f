//! `pagesmith build`

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use super::common::Project;
use crate::build::{BuildReport, PageStatus, write_site};
use crate::core::PagesmithError;

/// Which outcomes turn a build into a non-zero exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FailLevel {
    /// Always exit 0
    Never,
    /// Fail on any warning or failed page
    Warning,
    /// Fail only on failed pages
    #[default]
    Error,
}

impl FailLevel {
    /// Whether `report` fails at this level.
    #[must_use]
    pub fn fails(self, report: &BuildReport) -> bool {
        match self {
            Self::Never => false,
            Self::Warning => report.fatal_count() > 0 || report.total_warnings() > 0,
            Self::Error => report.fatal_count() > 0,
        }
    }
}

#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Output directory, overriding `output` in pagesmith.toml
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exit with an error on warnings, on failed pages, or never
    #[arg(long, value_enum, default_value_t = FailLevel::Error)]
    fail_on: FailLevel,

    /// Maximum pages composed at once
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_parallel: Option<u64>,

    /// Compose only; do not write the output directory
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl BuildCommand {
    pub async fn execute(self, project: &Project) -> Result<()> {
        let mut project = project.clone();
        if let Some(max_parallel) = self.max_parallel {
            let mut config = (*project.config).clone();
            config.max_parallel = usize::try_from(max_parallel).ok();
            project.config = Arc::new(config);
        }

        let builder = project.builder();
        let report = builder.build().await?;

        if !self.dry_run {
            let output_root = self.output.clone().unwrap_or_else(|| project.output_root.clone());
            write_site(&report, builder.assets(), builder.root(), &output_root).await?;
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        if self.fail_on.fails(&report) {
            return Err(PagesmithError::BuildFailed {
                fatal: report.fatal_count(),
                warnings: report.total_warnings(),
            }
            .into());
        }
        Ok(())
    }
}

fn print_report(report: &BuildReport) {
    for page in &report.pages {
        match &page.status {
            PageStatus::Success => println!("  {} {}", "✓".green(), page.relative),
            PageStatus::Warning => {
                println!("  {} {}", "!".yellow(), page.relative);
                for warning in &page.warnings {
                    println!("      {} {}", warning.kind.to_string().yellow(), warning.message);
                }
            }
            PageStatus::Fatal {
                message,
                ..
            } => {
                println!("  {} {}", "✗".red(), page.relative);
                for line in message.lines() {
                    println!("      {}", line.red());
                }
            }
        }
    }

    println!(
        "\n{} pages: {} ok, {} with warnings, {} failed",
        report.pages.len(),
        report.success_count().to_string().green(),
        report.warning_count().to_string().yellow(),
        report.fatal_count().to_string().red()
    );
}
