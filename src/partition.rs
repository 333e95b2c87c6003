//! Partition writer: serialize one category's domain set into size-bounded
//! `0.0.0.0 <domain>` list files.
//!
//! Each partition is written to a temporary file in the output directory and
//! renamed into place when it is closed, so a crashed run never leaves a
//! truncated list that looks complete.

use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CombinerError;

/// Sink address written in front of every domain
pub const BLACKHOLE_ADDR: &str = "0.0.0.0";

/// Display title for a category: `_`/`-` become spaces, each word capitalized.
///
/// Only the first letter of a word is touched, so `DNS_Over_HTTPS` becomes
/// `DNS Over HTTPS`.
pub fn display_title(category: &str) -> String {
    let spaced = category.replace(['_', '-'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}

/// Result of writing one category
#[derive(Debug, Clone, Default)]
pub struct WriteSummary {
    /// Distinct domains emitted across all partitions
    pub domains: usize,
    /// Final paths of the partitions, in index order
    pub partitions: Vec<PathBuf>,
}

/// One open output file
struct Partition {
    writer: BufWriter<NamedTempFile>,
    target: PathBuf,
    body_bytes: u64,
    lines: usize,
}

impl Partition {
    fn open(dir: &Path, target: PathBuf, header: &str) -> Result<Self, CombinerError> {
        let temp = NamedTempFile::new_in(dir).map_err(|e| {
            CombinerError::FileSystem(format!("Failed to create {}: {}", target.display(), e))
        })?;
        let mut writer = BufWriter::new(temp);
        writeln!(writer, "{}", header)?;
        Ok(Self {
            writer,
            target,
            body_bytes: 0,
            lines: 0,
        })
    }

    fn write_line(&mut self, line: &str) -> Result<(), CombinerError> {
        self.writer.write_all(line.as_bytes())?;
        self.body_bytes += line.len() as u64;
        self.lines += 1;
        Ok(())
    }

    fn close(self) -> Result<PathBuf, CombinerError> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| CombinerError::FileSystem(e.error().to_string()))?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| {
            CombinerError::FileSystem(format!(
                "Failed to persist {}: {}",
                self.target.display(),
                e.error
            ))
        })?;
        debug!(
            "Closed {} ({} lines, {} bytes)",
            self.target.display(),
            self.lines,
            self.body_bytes
        );
        Ok(self.target)
    }
}

/// Writes category buckets to the output directory.
#[derive(Debug, Clone)]
pub struct PartitionWriter {
    output_dir: PathBuf,
    max_partition_bytes: u64,
    split: bool,
    sort: bool,
    extension: String,
}

impl PartitionWriter {
    pub fn new(output_dir: impl Into<PathBuf>, max_partition_bytes: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_partition_bytes,
            split: true,
            sort: true,
            extension: "txt".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_dir, config.max_partition_bytes)
            .with_split(config.split_output)
            .with_sort(config.sort_output)
            .with_extension(&config.list_extension)
    }

    /// Enable or disable splitting into numbered parts
    pub fn with_split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }

    /// Enable or disable lexicographic ordering of domains
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn partition_path(&self, category: &str, index: usize) -> PathBuf {
        let name = if self.split {
            format!("{}{}.{}", category, index, self.extension)
        } else {
            format!("{}.{}", category, self.extension)
        };
        self.output_dir.join(name)
    }

    fn header(&self, title: &str, index: usize) -> String {
        if self.split {
            format!("# {} Part {}", title, index)
        } else {
            format!("# {}", title)
        }
    }

    fn open(&self, category: &str, title: &str, index: usize) -> Result<Partition, CombinerError> {
        Partition::open(
            &self.output_dir,
            self.partition_path(category, index),
            &self.header(title, index),
        )
    }

    /// Write one category's domains, rotating to a new partition whenever the
    /// next line would push the current one past `max_partition_bytes`.
    ///
    /// A partition always receives at least one line before it can be
    /// rotated, so a single line longer than the threshold is written alone.
    /// On error the partitions already persisted for this category are
    /// removed, so a failed category leaves nothing on disk.
    pub fn write(
        &self,
        category: &str,
        domains: &HashSet<String>,
    ) -> Result<WriteSummary, CombinerError> {
        let mut summary = WriteSummary::default();
        match self.write_partitions(category, domains, &mut summary) {
            Ok(()) => Ok(summary),
            Err(e) => {
                for path in &summary.partitions {
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!("Failed to remove {}: {}", path.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn write_partitions(
        &self,
        category: &str,
        domains: &HashSet<String>,
        summary: &mut WriteSummary,
    ) -> Result<(), CombinerError> {
        let title = display_title(category);

        let mut ordered: Vec<&String> = domains.iter().collect();
        if self.sort {
            ordered.sort_unstable();
        }

        let mut index = 1;
        let mut current = self.open(category, &title, index)?;

        for domain in ordered {
            let line = format!("{} {}\n", BLACKHOLE_ADDR, domain);
            let len = line.len() as u64;

            if current.body_bytes + len > self.max_partition_bytes && current.lines > 0 {
                if self.split {
                    summary.partitions.push(current.close()?);
                    index += 1;
                    current = self.open(category, &title, index)?;
                } else if current.body_bytes <= self.max_partition_bytes {
                    warn!(
                        "{} exceeds {} bytes but splitting is disabled",
                        category, self.max_partition_bytes
                    );
                }
            }

            current.write_line(&line)?;
            summary.domains += 1;
        }

        summary.partitions.push(current.close()?);
        Ok(())
    }
}
