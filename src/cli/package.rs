//! Fill the dependency cache for an offline package build.
//!
//! Plans the cache, registers one cache-fill task per URI under the package
//! task and runs it. Without offline packaging enabled this only prints a
//! notice.
//!
//! ```bash
//! prefetch package --offline
//! PREFETCH_OFFLINE=1 prefetch package --max-parallel 4
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, format_bytes};
use crate::package::setup_dependency_cache;
use crate::tasks::TaskGraph;
use crate::version::WildcardVersionResolver;

/// Command to build the offline dependency cache.
#[derive(Args, Debug)]
pub struct PackageCommand {
    /// Switch offline packaging on regardless of the settings
    #[arg(long)]
    pub offline: bool,

    /// Maximum number of concurrent downloads
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_parallel: Option<u16>,
}

impl CommandExecutor for PackageCommand {
    async fn execute_with_context(self, mut context: CommandContext) -> Result<()> {
        if self.offline {
            context.settings.offline = true;
        }
        if let Some(max_parallel) = self.max_parallel {
            context.settings.max_parallel = usize::from(max_parallel);
        }

        let mut graph = TaskGraph::new();
        let plan = setup_dependency_cache(
            &context.settings,
            &context.store,
            &context.cache,
            &WildcardVersionResolver,
            &mut graph,
        )
        .await?;

        let Some(plan) = plan else {
            println!(
                "Offline packaging is disabled; set `offline = true` in {} or pass --offline",
                context.settings_path.display()
            );
            return Ok(());
        };

        let report = graph
            .invoke(&context.settings.package_task, &context.cache, context.settings.max_parallel)
            .await?;

        println!(
            "{} Cached {} file(s), {} in {}",
            "✓".green(),
            report.cached_uris.len(),
            format_bytes(report.cached_bytes),
            context.cache.dir().display()
        );

        if !plan.unresolved.is_empty() {
            println!(
                "{} {} version(s) could not be resolved; run `prefetch plan` for details",
                "⚠".yellow(),
                plan.unresolved.len()
            );
        }

        Ok(())
    }
}
