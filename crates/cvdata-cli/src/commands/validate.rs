//! Validate command implementation

use colored::Colorize;
use cvdata_core::ArchitectureValidator;
use cvdata_meta::RuleCatalog;

use crate::context::CliContext;
use crate::error::{CliError, Result};

/// Score the data directory and write the validation report.
pub fn run_validate(ctx: &CliContext, json: bool) -> Result<()> {
    if !json {
        println!("{} Validating data architecture...", "=>".blue().bold());
    }

    let catalog = RuleCatalog::builtin()?;
    let report = ArchitectureValidator::new(ctx.layout.clone(), &catalog).run()?;
    let threshold = ctx.settings.orchestrator.health_threshold;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("   consistency    {:>6.2}", report.consistency);
        println!("   integrity      {:>6.2}", report.integrity);
        println!("   relationships  {:>6.2}", report.relationships);
        println!("   overall        {:>6.2}", report.overall);

        if !report.errors.is_empty() {
            println!();
            println!("{} {} issue(s):", "ISSUES".yellow().bold(), report.errors.len());
            for issue in &report.errors {
                println!("   {} {}: {}", "!".red(), issue.file.cyan(), issue.message);
            }
        }
        if !report.recommendations.is_empty() {
            println!();
            for recommendation in &report.recommendations {
                println!("   {} {}", "->".cyan(), recommendation);
            }
        }
        println!();
    }

    if report.passed(threshold) {
        if !json {
            println!("{} Data architecture is healthy.", "OK".green().bold());
        }
        Ok(())
    } else {
        Err(CliError::user(format!(
            "Validation score {:.2} is below the threshold of {threshold}",
            report.overall
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvdata_test_utils::TestDataDir;

    fn context(dir: &TestDataDir) -> CliContext {
        CliContext::load(dir.root(), None, None).unwrap()
    }

    #[test]
    fn test_validate_healthy_data() {
        let dir = TestDataDir::new().with_full_set();
        run_validate(&context(&dir), false).unwrap();
        dir.assert_file_exists("data-architecture-validation-report.json");
    }

    #[test]
    fn test_validate_below_threshold_fails() {
        let dir = TestDataDir::new()
            .with_v4_cv()
            .with_settings("[orchestrator]\nhealth_threshold = 99.5\n");
        dir.write_raw("broken.json", "[");

        let result = run_validate(&context(&dir), true);
        assert!(matches!(result, Err(CliError::User { .. })));
    }
}
