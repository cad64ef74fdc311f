//! `pagesmith compose`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::common::Project;
use crate::utils::fs::SourceReader;

#[derive(Args, Debug)]
pub struct ComposeCommand {
    /// Page to compose, relative to the current directory or the source root
    page: PathBuf,

    /// Also print the page's dependencies and warnings to stderr
    #[arg(long)]
    explain: bool,
}

impl ComposeCommand {
    pub async fn execute(self, project: &Project) -> Result<()> {
        let page = project.resolve_file(&self.page)?;
        let builder = project.builder();
        let composer = builder.composer();

        let content = composer
            .reader()
            .read_to_string(&page)
            .await
            .with_context(|| format!("Failed to read page {}", page.display()))?;
        let output = composer.compose(&content, &page).await?;

        println!("{}", output.content);

        if self.explain {
            eprintln!("dependencies:");
            for dependency in &output.dependencies {
                eprintln!("  {}", dependency.display());
            }
            for warning in &output.warnings {
                eprintln!("warning: {warning}");
            }
        }
        Ok(())
    }
}
