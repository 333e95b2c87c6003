//! # blocklist-combiner - category blocklists for DNS blackholes
//!
//! Aggregates domain blocklists published in several independent formats
//! into one deduplicated, category-partitioned set of `0.0.0.0 <domain>`
//! files that ad-blocking and content-filtering appliances load directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    blocklist-combiner                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: run, fetch, combine, merge, init           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── Exclusion set, category merge table, partition size  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls, flate2 + tar)                   │
//! │    ├── UT1 archive  -> Temp/ut1/<category>.txt              │
//! │    └── GitHub lists -> Temp/<source>/<category>.txt         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Combiner                                                   │
//! │    ├── CategoryNormalizer (exclusions, raw -> canonical)    │
//! │    ├── DomainAggregator   (per-category dedup)              │
//! │    └── PartitionWriter    (size-bounded output files)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RunReport (serde_json)                                     │
//! │    └── Every skipped file, source and write, with a reason  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use blocklist_combiner::config::Config;
//! use blocklist_combiner::pipeline::Combiner;
//! use blocklist_combiner::report::{ReportFormat, RunReport};
//! use blocklist_combiner::workspace::Workspace;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("blocklist-combiner.yaml")?;
//!     let workspace = Workspace::new(&config);
//!     workspace.prepare_output()?;
//!
//!     let mut report = RunReport::new();
//!     let total = Combiner::from_config(&config).run(&workspace.source_dirs(), &mut report);
//!
//!     println!("{}", report.render(ReportFormat::Text)?);
//!     println!("{} unique domains", total);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - Line parsing and per-category deduplication
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Typed pipeline errors
//! - [`fetcher`] - Source downloads (UT1 archive, GitHub directories)
//! - [`lock`] - Single-run guard on the work directory
//! - [`merger`] - Two-source line merger
//! - [`normalizer`] - Raw file name to canonical category
//! - [`partition`] - Size-bounded output writer
//! - [`pipeline`] - Aggregate then partition
//! - [`report`] - Per-run report
//! - [`workspace`] - Work and output directory layout

pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lock;
pub mod merger;
pub mod normalizer;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod workspace;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::CombinerError;
