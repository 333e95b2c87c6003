//! blocklist-combiner - merge category domain blocklists into DNS blackhole lists.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use blocklist_combiner::cli::{Cli, Commands};
use blocklist_combiner::commands;
use blocklist_combiner::report::ReportFormat;

fn parse_format(format: &str) -> Result<ReportFormat> {
    format.parse().map_err(|e: String| anyhow::anyhow!(e))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { format, skip_fetch } => {
            commands::run::run(parse_format(&format)?, skip_fetch, &cli.config).await
        }
        Commands::Fetch => commands::fetch::run(&cli.config).await,
        Commands::Combine { format } => commands::combine::run(parse_format(&format)?, &cli.config),
        Commands::Merge { dir1, dir2, output } => {
            commands::merge::run(&dir1, &dir2, &output, &cli.config)
        }
        Commands::Init { force } => commands::init::run(force, &cli.config),
        Commands::Version => {
            println!("blocklist-combiner {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
