//! Fetch command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::lock::LockGuard;
use crate::normalizer::CategoryNormalizer;
use crate::report::{ReportFormat, RunReport};
use crate::workspace::Workspace;

/// Fetch every enabled source of `workspace`, one after another.
///
/// Individual source failures are recorded in `report`; only failing to
/// build the HTTP client is an error.
pub async fn fetch_all(
    config: &Config,
    workspace: &Workspace,
    report: &mut RunReport,
) -> Result<()> {
    if workspace.sources().is_empty() {
        warn!("No sources enabled. Check your configuration.");
        return Ok(());
    }

    let fetcher = Fetcher::new(&config.fetch, CategoryNormalizer::from_config(config))
        .context("Failed to create fetcher")?;

    for (source, dir) in workspace.sources() {
        let outcome = fetcher.fetch_source(source, dir, report).await;
        report.record_source(outcome);
    }

    let failed = report.sources.iter().filter(|s| s.error.is_some()).count();
    if failed == report.sources.len() {
        warn!("Every source failed to fetch; output will be empty");
    } else if failed > 0 {
        warn!("{} of {} sources failed to fetch", failed, report.sources.len());
    }
    Ok(())
}

/// Run the fetch command
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let workspace = Workspace::new(&config);
    let _lock = LockGuard::acquire(workspace.work_dir())?;

    workspace
        .prepare()
        .context("Failed to prepare work directories")?;

    let mut report = RunReport::new();
    fetch_all(&config, &workspace, &mut report).await?;

    info!("Raw lists are in {}", workspace.work_dir().display());
    println!("{}", report.render(ReportFormat::Text)?);
    Ok(())
}
