//! Working directory layout: one raw directory per source plus the output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{Config, SourceConfig};

/// Resolved directories for one run
#[derive(Debug, Clone)]
pub struct Workspace {
    work_dir: PathBuf,
    sources: Vec<(SourceConfig, PathBuf)>,
    output_dir: PathBuf,
}

impl Workspace {
    pub fn new(config: &Config) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            sources: config
                .enabled_sources()
                .into_iter()
                .map(|s| (s.clone(), config.source_dir(s)))
                .collect(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Enabled sources with their raw directories, in configuration order
    pub fn sources(&self) -> &[(SourceConfig, PathBuf)] {
        &self.sources
    }

    /// Raw directories in the order they are aggregated
    pub fn source_dirs(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|(_, dir)| dir.clone()).collect()
    }

    /// Wipe and recreate every source directory and the output directory
    pub fn prepare(&self) -> io::Result<()> {
        for (_, dir) in &self.sources {
            reset_dir(dir)?;
        }
        self.prepare_output()
    }

    /// Wipe and recreate only the output directory
    pub fn prepare_output(&self) -> io::Result<()> {
        reset_dir(&self.output_dir)
    }
}

fn reset_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => debug!("Removed {}", dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir)
}
