//! Combine command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::lock::LockGuard;
use crate::pipeline::{describe, Combiner};
use crate::report::{ReportFormat, RunReport};
use crate::workspace::Workspace;

/// Aggregate and partition the raw files currently in the work directory
pub fn combine(config: &Config, workspace: &Workspace, report: &mut RunReport) -> Result<usize> {
    workspace
        .prepare_output()
        .with_context(|| format!("Failed to prepare {}", workspace.output_dir().display()))?;

    info!("Partitioning: {}", describe(config));
    Ok(Combiner::from_config(config).run(&workspace.source_dirs(), report))
}

/// Run the combine command
pub fn run(format: ReportFormat, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let workspace = Workspace::new(&config);
    let _lock = LockGuard::acquire(workspace.work_dir())?;

    let mut report = RunReport::new();
    combine(&config, &workspace, &mut report)?;

    println!("{}", report.render(format)?);
    Ok(())
}
