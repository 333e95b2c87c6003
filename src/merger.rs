//! Two-source line merger: union same-named list files from two directories.
//!
//! Unlike the category pipeline this is not category-aware and keeps lines
//! literally (trimmed, blank lines dropped, comments kept).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::CombinerError;
use crate::report::{RunReport, SkipReason};

/// Result of one merge run
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    /// Output files written, with their unique line counts
    pub files: BTreeMap<String, usize>,
}

impl MergeSummary {
    pub fn total_lines(&self) -> usize {
        self.files.values().sum()
    }
}

/// Lowercased list-file name -> actual paths, for one directory (non-recursive).
///
/// Names differing only in case (`Ads.txt`, `ads.txt`) share one key, and
/// every one of them is read.
fn list_files(dir: &Path, suffix: &str, report: &mut RunReport) -> BTreeMap<String, Vec<PathBuf>> {
    let mut files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            report.skip_path(dir, SkipReason::DirectoryUnavailable, Some(e.to_string()));
            return files;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.ends_with(suffix) && entry.path().is_file() {
            files.entry(name).or_default().push(entry.path());
        }
    }
    for paths in files.values_mut() {
        paths.sort();
    }
    files
}

/// Insert the trimmed, non-empty lines of `path` into `lines`.
///
/// Lines that are not valid UTF-8 are dropped and counted; the rest of the
/// file is still read.
fn read_lines(path: &Path, lines: &mut HashSet<String>, report: &mut RunReport) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            report.skip_path(path, SkipReason::OpenFailed, Some(e.to_string()));
            return;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                report.skip_path(path, SkipReason::ReadFailed, Some(e.to_string()));
                return;
            }
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            report.invalid_lines += 1;
            continue;
        };
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.insert(trimmed.to_string());
        }
    }
}

fn write_lines(target: &Path, lines: &HashSet<String>, sort: bool) -> Result<(), CombinerError> {
    let dir = target.parent().unwrap_or(Path::new("."));
    let mut writer = BufWriter::new(NamedTempFile::new_in(dir)?);

    if sort {
        let ordered: BTreeSet<&String> = lines.iter().collect();
        for line in ordered {
            writeln!(writer, "{}", line)?;
        }
    } else {
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
    }

    let temp = writer
        .into_inner()
        .map_err(|e| CombinerError::FileSystem(e.error().to_string()))?;
    temp.persist(target)
        .map_err(|e| CombinerError::FileSystem(e.error.to_string()))?;
    Ok(())
}

/// Merges list files of the same name found in two directories.
#[derive(Debug, Clone)]
pub struct LineMerger {
    suffix: String,
    sort: bool,
}

impl Default for LineMerger {
    fn default() -> Self {
        Self::new("txt")
    }
}

impl LineMerger {
    pub fn new(list_extension: &str) -> Self {
        Self {
            suffix: format!(".{}", list_extension.to_lowercase()),
            sort: true,
        }
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Merge `dir1` and `dir2` into `output_dir`.
    ///
    /// Every list-file name present in either directory produces one output
    /// file (lowercase name) holding the union of both copies' lines. Names
    /// whose union is empty produce nothing. Write failures are recorded and
    /// the remaining names are still merged.
    pub fn merge(
        &self,
        dir1: &Path,
        dir2: &Path,
        output_dir: &Path,
        report: &mut RunReport,
    ) -> Result<MergeSummary, CombinerError> {
        fs::create_dir_all(output_dir)?;

        let first = list_files(dir1, &self.suffix, report);
        let second = list_files(dir2, &self.suffix, report);
        let names: BTreeSet<&String> = first.keys().chain(second.keys()).collect();
        info!(
            "Merging {} list names from {} and {}",
            names.len(),
            dir1.display(),
            dir2.display()
        );

        let mut summary = MergeSummary::default();
        for name in names {
            let mut lines = HashSet::new();
            for path in first.get(name).into_iter().chain(second.get(name)).flatten() {
                read_lines(path, &mut lines, report);
            }

            if lines.is_empty() {
                debug!("{} is empty in both sources, no output", name);
                continue;
            }

            let target = output_dir.join(name);
            match write_lines(&target, &lines, self.sort) {
                Ok(()) => {
                    debug!("Wrote {} ({} lines)", target.display(), lines.len());
                    summary.files.insert(name.clone(), lines.len());
                }
                Err(e) => report.skip_path(&target, SkipReason::WriteFailed, Some(e.to_string())),
            }
        }

        Ok(summary)
    }
}
