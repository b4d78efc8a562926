//! Show what an offline package build would cache.
//!
//! Fetches every repository index (through the cache) and resolves each
//! declared version, but downloads no artifacts. Runs whether or not offline
//! packaging is switched on.
//!
//! ```bash
//! prefetch plan
//! prefetch plan --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor};
use crate::config::load_default_repository_root;
use crate::resolver::{ArtifactPlan, plan_artifact_fetches};
use crate::version::WildcardVersionResolver;

/// Command to print the artifact plan.
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format of the plan.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// The plan as a JSON object
    Json,
}

impl CommandExecutor for PlanCommand {
    async fn execute_with_context(self, context: CommandContext) -> Result<()> {
        let default_repository_root = load_default_repository_root(&context.store).await?;
        let candidates = context.settings.axis_candidates(default_repository_root);

        let plan = plan_artifact_fetches(
            &context.store,
            &context.cache,
            &WildcardVersionResolver,
            &candidates,
        )
        .await?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            OutputFormat::Text => print!("{}", render_text(&plan)),
        }

        Ok(())
    }
}

fn render_text(plan: &ArtifactPlan) -> String {
    let mut out = String::new();

    out.push_str(&format!("{} ({})\n", "Index manifests".bold(), plan.manifest_uris.len()));
    for uri in &plan.manifest_uris {
        out.push_str(&format!("  {uri}\n"));
    }

    out.push_str(&format!("{} ({})\n", "Artifacts".bold(), plan.artifact_uris.len()));
    for uri in &plan.artifact_uris {
        out.push_str(&format!("  {uri}\n"));
    }

    if !plan.unresolved.is_empty() {
        out.push_str(&format!("{} ({})\n", "Unresolved".yellow().bold(), plan.unresolved.len()));
        for unresolved in &plan.unresolved {
            out.push_str(&format!("  {} {unresolved}\n", "⚠".yellow()));
            out.push_str(&format!("    in {}\n", unresolved.manifest_uri));
        }
    }

    out
}
