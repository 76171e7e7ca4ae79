mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, IndexOptions};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "source_indexer=debug"
    } else {
        "source_indexer=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Index {
            path,
            output,
            extensions,
            ignore_file,
            config,
            threads,
            compact,
            progress,
        } => {
            cli::index_directory(
                &path,
                IndexOptions {
                    output,
                    extensions,
                    ignore_file,
                    config,
                    threads,
                    compact,
                    progress,
                },
            )?;
        }
        Commands::Files {
            path,
            extensions,
            config,
        } => {
            cli::list_files(&path, extensions, config.as_deref())?;
        }
        Commands::Detect { file, config } => {
            cli::detect_file(&file, config.as_deref())?;
        }
        Commands::Languages => {
            cli::list_languages()?;
        }
    }

    Ok(())
}
