//! Monitor command implementation

use colored::Colorize;
use cvdata_core::QualityMonitor;

use crate::context::CliContext;
use crate::error::Result;

pub fn run_monitor(ctx: &CliContext) -> Result<()> {
    println!("{} Assessing data quality...", "=>".blue().bold());
    let report = QualityMonitor::new(ctx.layout.clone(), ctx.settings.monitor.clone()).run()?;

    for doc in &report.documents {
        let schema = match (&doc.schema_version, doc.schema_current) {
            (Some(version), Some(true)) => format!("schema {version}").green(),
            (Some(version), _) => format!("schema {version}").yellow(),
            _ => String::new().normal(),
        };
        println!(
            "   {} {:>6.2} fresh, {:>7.1} days old {}",
            doc.path.cyan(),
            doc.freshness,
            doc.age_days,
            schema
        );
    }
    for warning in &report.warnings {
        println!("   {} {}", "!".yellow(), warning);
    }
    println!(
        "{} freshness {:.2}, schema {:.2}",
        "OK".green().bold(),
        report.freshness,
        report.schema
    );
    Ok(())
}
