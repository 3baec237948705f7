//! Run command: the orchestrated pipeline

use colored::Colorize;
use cvdata_core::migration::MigrationRegistry;
use cvdata_core::{Orchestrator, PipelineOptions};
use cvdata_meta::RuleCatalog;

use crate::context::CliContext;
use crate::error::{CliError, Result};

/// Run every stage and report overall health.
///
/// `--fail-fast` overrides `continue_on_error` from the settings.
pub fn run_pipeline(ctx: &CliContext, fail_fast: bool, json: bool) -> Result<()> {
    if !json {
        println!("{} Running data pipeline...", "=>".blue().bold());
    }

    let catalog = RuleCatalog::builtin()?;
    let registry = MigrationRegistry::with_builtins();
    let mut options = PipelineOptions::from_settings(&ctx.settings);
    if fail_fast {
        options.continue_on_error = false;
    }

    let report = Orchestrator::new(ctx.layout.clone(), ctx.settings.clone(), &catalog, &registry)
        .run(&options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for stage in &report.stages {
            let (marker, detail) = if stage.skipped {
                ("-".dimmed(), "skipped".to_string())
            } else if stage.success {
                ("+".green(), stage.summary.clone().unwrap_or_default())
            } else {
                (
                    "!".red(),
                    stage
                        .error
                        .clone()
                        .or_else(|| stage.summary.clone())
                        .unwrap_or_default(),
                )
            };
            println!(
                "   {} {:<13} {:>5} ms  {}",
                marker,
                stage.stage.to_string(),
                stage.duration_ms,
                detail
            );
        }
        println!();
        println!(
            "   health {:.2} (consistency {:.2}, reliability {:.2}, freshness {:.2}, schema {:.2})",
            report.health.overall,
            report.health.consistency,
            report.health.reliability,
            report.health.freshness,
            report.health.schema
        );
    }

    if report.passed {
        if !json {
            println!("{} Pipeline passed.", "OK".green().bold());
        }
        Ok(())
    } else {
        Err(CliError::user(format!(
            "Pipeline failed (health {:.2}, threshold {})",
            report.health.overall, report.health_threshold
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvdata_test_utils::TestDataDir;

    #[test]
    fn test_pipeline_on_legacy_data() {
        let dir = TestDataDir::new().with_v3_0_cv().with_activity();
        let ctx = CliContext::load(dir.root(), None, None).unwrap();

        run_pipeline(&ctx, false, false).unwrap();

        dir.assert_file_exists("data-architecture-master-report.json");
    }

    #[test]
    fn test_fail_fast_pipeline_fails() {
        let dir = TestDataDir::new().with_v3_0_cv();
        dir.write_raw("broken.json", "{");
        let ctx = CliContext::load(dir.root(), None, None).unwrap();

        assert!(run_pipeline(&ctx, true, true).is_err());
    }
}
