//! Run command implementation: fetch, then combine.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::commands::{combine, fetch};
use crate::config::Config;
use crate::lock::LockGuard;
use crate::report::{format_count_with_separator, ReportFormat, RunReport};
use crate::workspace::Workspace;

/// Run the full pipeline
pub async fn run(format: ReportFormat, skip_fetch: bool, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let workspace = Workspace::new(&config);
    let _lock = LockGuard::acquire(workspace.work_dir())?;

    let mut report = RunReport::new();
    if skip_fetch {
        info!("Skipping fetch, reusing {}", workspace.work_dir().display());
    } else {
        workspace
            .prepare()
            .context("Failed to prepare work directories")?;
        fetch::fetch_all(&config, &workspace, &mut report).await?;
    }

    let total = combine::combine(&config, &workspace, &mut report)?;

    println!("{}", report.render(format)?);
    if format == ReportFormat::Text {
        println!(
            "[OK] {} unique domains written to {}",
            format_count_with_separator(total),
            workspace.output_dir().display()
        );
    }
    Ok(())
}
