//! Domain aggregation: read every surviving raw list into its canonical
//! category bucket, deduplicating as we go.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::normalizer::{Category, CategoryNormalizer};
use crate::report::{RunReport, SkipReason};

/// Canonical category -> set of unique domain entries.
///
/// A `BTreeMap` so categories are flushed in a stable order.
pub type CategoryBuckets = BTreeMap<String, HashSet<String>>;

/// Extract the domain entry from one raw line.
///
/// Blank lines and `#` comments yield `None`. Otherwise the last
/// whitespace-separated field is returned lowercased, which collapses
/// `0.0.0.0 example.com` and `127.0.0.1 example.com` to `example.com`.
pub fn parse_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    trimmed
        .split_whitespace()
        .next_back()
        .map(|field| field.to_lowercase())
}

/// Counters for one file read
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub inserted: usize,
    pub duplicates: usize,
    pub invalid_lines: usize,
}

/// Read domain entries from `reader` into `bucket`.
///
/// Lines that are not valid UTF-8 are dropped and counted rather than
/// failing the whole file.
pub fn read_domains<R: BufRead>(
    mut reader: R,
    bucket: &mut HashSet<String>,
) -> std::io::Result<ReadStats> {
    let mut stats = ReadStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            stats.invalid_lines += 1;
            continue;
        };
        if let Some(domain) = parse_line(line) {
            if bucket.insert(domain) {
                stats.inserted += 1;
            } else {
                stats.duplicates += 1;
            }
        }
    }

    Ok(stats)
}

/// Builds category buckets from a list of source directories.
#[derive(Debug, Clone)]
pub struct DomainAggregator {
    normalizer: CategoryNormalizer,
}

impl DomainAggregator {
    pub fn new(normalizer: CategoryNormalizer) -> Self {
        Self { normalizer }
    }

    /// Aggregate every file of every directory, in directory order.
    ///
    /// Missing directories, unreadable files and excluded names contribute
    /// nothing; each is recorded in `report`.
    pub fn aggregate(&self, source_dirs: &[PathBuf], report: &mut RunReport) -> CategoryBuckets {
        info!("Merging and normalizing...");
        let mut buckets = CategoryBuckets::new();

        for dir in source_dirs {
            self.aggregate_dir(dir, &mut buckets, report);
        }

        info!(
            "Aggregated {} categories ({} unique domains)",
            buckets.len(),
            buckets.values().map(HashSet::len).sum::<usize>()
        );
        buckets
    }

    fn aggregate_dir(&self, dir: &Path, buckets: &mut CategoryBuckets, report: &mut RunReport) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                report.skip_path(dir, SkipReason::DirectoryUnavailable, Some(e.to_string()));
                return;
            }
        };

        // Sort for a stable processing order across platforms
        let mut paths: Vec<(String, PathBuf)> = entries
            .flatten()
            .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
            .collect();
        paths.sort();

        for (file_name, path) in paths {
            let category = match self.normalizer.normalize(&file_name) {
                Category::Excluded => {
                    report.skip_path(&path, SkipReason::Excluded, None);
                    continue;
                }
                Category::Canonical(category) => category,
            };

            if !path.is_file() {
                report.skip_path(&path, SkipReason::NotAFile, None);
                continue;
            }

            let bucket = buckets.entry(category.clone()).or_default();
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    report.skip_path(&path, SkipReason::OpenFailed, Some(e.to_string()));
                    continue;
                }
            };

            match read_domains(BufReader::new(file), bucket) {
                Ok(stats) => {
                    report.invalid_lines += stats.invalid_lines;
                    debug!(
                        "{} -> {}: {} new, {} duplicate",
                        path.display(),
                        category,
                        stats.inserted,
                        stats.duplicates
                    );
                }
                Err(e) => {
                    // Entries read before the error stay in the bucket
                    report.skip_path(&path, SkipReason::ReadFailed, Some(e.to_string()));
                }
            }
        }
    }
}
