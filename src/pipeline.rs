//! The merge-normalize-partition engine: aggregate raw directories into
//! category buckets, then flush each bucket to disk in category order.

use std::path::PathBuf;
use tracing::info;

use crate::aggregator::DomainAggregator;
use crate::config::Config;
use crate::normalizer::CategoryNormalizer;
use crate::partition::PartitionWriter;
use crate::report::{format_bytes, CategoryStats, RunReport, SkipReason};

pub struct Combiner {
    aggregator: DomainAggregator,
    writer: PartitionWriter,
}

impl Combiner {
    pub fn new(normalizer: CategoryNormalizer, writer: PartitionWriter) -> Self {
        Self {
            aggregator: DomainAggregator::new(normalizer),
            writer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CategoryNormalizer::from_config(config),
            PartitionWriter::from_config(config),
        )
    }

    /// Aggregate `source_dirs` and write every category.
    ///
    /// A category whose output cannot be written is recorded and skipped;
    /// the remaining categories are still written. Returns the number of
    /// distinct domains emitted across all categories.
    pub fn run(&self, source_dirs: &[PathBuf], report: &mut RunReport) -> usize {
        let buckets = self.aggregator.aggregate(source_dirs, report);

        info!(
            "Writing {} categories to {}...",
            buckets.len(),
            self.writer.output_dir().display()
        );

        let mut total = 0;
        // Each bucket is dropped as soon as its partitions are written
        for (category, domains) in buckets {
            match self.writer.write(&category, &domains) {
                Ok(summary) => {
                    info!(
                        "{}: {} domains in {} part(s)",
                        category,
                        summary.domains,
                        summary.partitions.len()
                    );
                    total += summary.domains;
                    report.record_category(CategoryStats {
                        category,
                        domains: summary.domains,
                        partitions: summary.partitions,
                    });
                }
                Err(e) => report.skip(category, SkipReason::WriteFailed, Some(e.to_string())),
            }
        }
        total
    }
}

/// One-line description of the partitioning settings, for logs
pub fn describe(config: &Config) -> String {
    if config.split_output {
        format!(
            "split at {} per part",
            format_bytes(config.max_partition_bytes)
        )
    } else {
        "single file per category".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn combiner(out: &Path, max: u64) -> Combiner {
        Combiner::new(
            CategoryNormalizer::new(["child.txt"], [("publicite", "ads")], "txt"),
            PartitionWriter::new(out, max),
        )
    }

    #[test]
    fn test_end_to_end_example() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        write(&a, "ads.txt", "0.0.0.0 foo.com\n# comment\n");
        write(&b, "publicite.txt", "bar.com\n");

        let mut report = RunReport::new();
        let total = combiner(&out, 1024).run(&[a, b], &mut report);

        assert_eq!(total, 2);
        assert_eq!(report.total_domains, 2);
        let content = fs::read_to_string(out.join("ads1.txt")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "# Ads Part 1");
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"0.0.0.0 foo.com"));
        assert!(lines.contains(&"0.0.0.0 bar.com"));
    }

    #[test]
    fn test_exclusion_never_reaches_output() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        write(&a, "child.txt", "hidden.com\n");
        write(&b, "child", "visible.com\n");

        let mut report = RunReport::new();
        combiner(&out, 1024).run(&[a, b], &mut report);

        let all: String = fs::read_dir(&out)
            .unwrap()
            .map(|e| fs::read_to_string(e.unwrap().path()).unwrap())
            .collect();
        assert!(!all.contains("hidden.com"));
        assert!(all.contains("visible.com"));
    }

    #[test]
    fn test_write_failure_is_recorded_not_fatal() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        write(&a, "ads.txt", "foo.com\n");

        let mut report = RunReport::new();
        let total = combiner(&temp.path().join("missing-out"), 1024).run(&[a], &mut report);

        assert_eq!(total, 0);
        assert_eq!(report.count_skipped(SkipReason::WriteFailed), 1);
        assert!(report.categories.is_empty());
    }

    #[test]
    fn test_categories_reported_in_order() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        write(&a, "porn.txt", "p.com\n");
        write(&a, "ads.txt", "a.com\n");
        write(&a, "games.txt", "g.com\n");

        let mut report = RunReport::new();
        combiner(&out, 1024).run(&[a], &mut report);

        let names: Vec<_> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["ads", "games", "porn"]);
    }

    #[test]
    fn test_describe() {
        let mut config = Config::default();
        assert_eq!(describe(&config), "split at 90.0 MiB per part");
        config.split_output = false;
        assert_eq!(describe(&config), "single file per category");
    }
}
