//! Merge command implementation (two-source line merger).

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::merger::LineMerger;
use crate::report::{format_count_with_separator, ReportFormat, RunReport, SkipReason};

/// Run the merge command
pub fn run(dir1: &Path, dir2: &Path, output: &Path, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let merger = LineMerger::new(&config.list_extension).with_sort(config.sort_output);
    let mut report = RunReport::new();
    let summary = merger
        .merge(dir1, dir2, output, &mut report)
        .with_context(|| format!("Failed to merge into {}", output.display()))?;

    let problems = report.skipped.len() - report.count_skipped(SkipReason::Excluded);
    if problems > 0 {
        println!("{}", report.render(ReportFormat::Text)?);
    }
    println!(
        "[OK] {} files merged into {} ({} unique lines)",
        summary.files.len(),
        output.display(),
        format_count_with_separator(summary.total_lines())
    );
    Ok(())
}
