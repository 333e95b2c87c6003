//! Per-run report: what was fetched, what was skipped and why, and what was written.
//!
//! Every recoverable failure in the pipeline lands here instead of being
//! discarded, so "zero domains because the source was empty" can be told
//! apart from "zero domains because every fetch failed".

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Why an input or output unit was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Excluded,
    NotAFile,
    DirectoryUnavailable,
    OpenFailed,
    ReadFailed,
    FetchFailed,
    WriteFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Excluded => "excluded",
            SkipReason::NotAFile => "not a file",
            SkipReason::DirectoryUnavailable => "directory unavailable",
            SkipReason::OpenFailed => "open failed",
            SkipReason::ReadFailed => "read failed",
            SkipReason::FetchFailed => "fetch failed",
            SkipReason::WriteFailed => "write failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Skipped {
    /// File, directory, URL or category the skip applies to
    pub subject: String,
    pub reason: SkipReason,
    pub detail: Option<String>,
}

/// Outcome of fetching one configured source
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub name: String,
    pub files_written: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub domains: usize,
    pub partitions: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceOutcome>,
    pub skipped: Vec<Skipped>,
    pub categories: Vec<CategoryStats>,
    /// Lines dropped because they were not valid UTF-8
    pub invalid_lines: usize,
    /// Distinct domains emitted, summed over categories
    pub total_domains: usize,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            sources: Vec::new(),
            skipped: Vec::new(),
            categories: Vec::new(),
            invalid_lines: 0,
            total_domains: 0,
        }
    }

    /// Record a dropped unit and emit a structured log event for it
    pub fn skip(&mut self, subject: impl Into<String>, reason: SkipReason, detail: Option<String>) {
        let subject = subject.into();
        match reason {
            SkipReason::Excluded => debug!(subject = %subject, "Skipping excluded list"),
            _ => warn!(
                subject = %subject,
                reason = %reason,
                detail = detail.as_deref().unwrap_or(""),
                "Skipped"
            ),
        }
        self.skipped.push(Skipped {
            subject,
            reason,
            detail,
        });
    }

    /// Convenience for path subjects
    pub fn skip_path(&mut self, path: &Path, reason: SkipReason, detail: Option<String>) {
        self.skip(path.display().to_string(), reason, detail);
    }

    pub fn record_source(&mut self, outcome: SourceOutcome) {
        self.sources.push(outcome);
    }

    pub fn record_category(&mut self, stats: CategoryStats) {
        self.total_domains += stats.domains;
        self.categories.push(stats);
    }

    /// Number of skips with the given reason
    pub fn count_skipped(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    pub fn render(&self, format: ReportFormat) -> anyhow::Result<String> {
        match format {
            ReportFormat::Text => Ok(self.format_text()),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn format_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "--- FINAL REPORT ---");

        if !self.sources.is_empty() {
            let _ = writeln!(out, "Sources:");
            for source in &self.sources {
                match &source.error {
                    None => {
                        let _ = writeln!(
                            out,
                            "  [OK]   {:<12} {} files",
                            source.name, source.files_written
                        );
                    }
                    Some(e) => {
                        let _ = writeln!(out, "  [FAIL] {:<12} {}", source.name, e);
                    }
                }
            }
        }

        if !self.categories.is_empty() {
            let _ = writeln!(out, "Categories:");
            for cat in &self.categories {
                let _ = writeln!(
                    out,
                    "  {:<28} {:>12} domains  {} part(s)",
                    cat.category,
                    format_count_with_separator(cat.domains),
                    cat.partitions.len()
                );
            }
        }

        let not_excluded: Vec<_> = self
            .skipped
            .iter()
            .filter(|s| s.reason != SkipReason::Excluded)
            .collect();
        if !not_excluded.is_empty() {
            let _ = writeln!(out, "Skipped:");
            for s in not_excluded {
                let _ = writeln!(out, "  {} ({})", s.subject, s.reason);
            }
        }
        if self.invalid_lines > 0 {
            let _ = writeln!(
                out,
                "Lines dropped (invalid encoding): {}",
                format_count_with_separator(self.invalid_lines)
            );
        }

        let _ = writeln!(
            out,
            "Total unique domains protected: {}",
            format_count_with_separator(self.total_domains)
        );
        out
    }
}

/// Format a number with thousands separators (1,234,567).
pub fn format_count_with_separator(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format bytes in human-readable form (KiB, MiB, GiB).
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    match bytes {
        b if b >= GIB => format!("{:.1} GiB", b as f64 / GIB as f64),
        b if b >= MIB => format!("{:.1} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{} B", b),
    }
}
