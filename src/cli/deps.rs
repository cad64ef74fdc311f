//! `pagesmith deps`
//!
//! Runs a full composition pass to populate the graph, then answers "which
//! pages would be rebuilt if this file changed?".

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::common::Project;
use crate::core::FileRole;
use crate::utils::relative_to_root;

/// How `deps` prints its answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct DepsCommand {
    /// File to query, relative to the current directory or the source root
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Show the file's own dependency tree instead of its dependents
    #[arg(long)]
    tree: bool,
}

#[derive(Debug, Serialize)]
struct DepsOutput {
    file: String,
    role: FileRole,
    dependencies: Vec<String>,
    dependents: Vec<String>,
}

impl DepsCommand {
    pub async fn execute(self, project: &Project) -> Result<()> {
        let file = project.resolve_file(&self.file)?;
        let builder = project.builder();
        builder.build().await?;

        let root = builder.root();
        let graph = builder.graph().read().await;
        let label = |p: &PathBuf| relative_to_root(p, root);

        if self.tree {
            print!("{}", graph.to_tree_string(&file, root));
            return Ok(());
        }

        let output = DepsOutput {
            file: relative_to_root(&file, root),
            role: graph.file_role(&file),
            dependencies: graph.direct_dependencies(&file).iter().map(label).collect(),
            dependents: graph.transitive_dependents(&file, None).iter().map(label).collect(),
        };

        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{} ({:?})", output.file.cyan().bold(), output.role);
        if output.dependents.is_empty() {
            println!("  no pages depend on this file");
        } else {
            println!("  rebuilt when it changes:");
            for page in &output.dependents {
                println!("    {page}");
            }
        }
        Ok(())
    }
}
