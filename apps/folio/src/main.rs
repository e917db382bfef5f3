use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::Destination;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::FetchOptions;
use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    about = "Offline cache, carousel and gallery tooling for the portfolio site"
)]
struct Cli {
    #[arg(long, default_value = "folio.toml")]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install and activate the precache manifest into the cache store.
    Precache {
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        cache_name: Option<String>,
    },
    /// Resolve a request through the dispatcher.
    Fetch {
        url: String,
        #[arg(long)]
        navigate: bool,
        #[arg(long)]
        destination: Option<Destination>,
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List cache buckets with their entry counts.
    Buckets,
    /// Render the certificate gallery from a data file.
    Certificates {
        path: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a headless autoplaying carousel and print its slide changes.
    CarouselDemo {
        #[arg(long, default_value_t = 4)]
        slides: usize,
        #[arg(long, default_value_t = 5)]
        ticks: usize,
        #[arg(
            long,
            default_value_t = 1000,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config);
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    settings.database_url = normalize_database_url(&settings.database_url);

    match cli.command {
        Command::Precache { origin, cache_name } => {
            if let Some(origin) = origin {
                settings.origin = Some(origin);
            }
            if let Some(cache_name) = cache_name {
                settings.cache_name = cache_name;
            }
            let report = commands::precache(&settings).await?;
            println!(
                "activated {} with {} entries (buckets: {})",
                report.bucket,
                report.entries,
                report.buckets.join(", ")
            );
        }
        Command::Fetch {
            url,
            navigate,
            destination,
            offline,
            output,
        } => {
            let options = FetchOptions {
                navigate,
                destination,
                offline,
            };
            let response = commands::fetch(&settings, &url, &options).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &response.body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{} {} -> {}", response.status, response.url, path.display());
                }
                None => println!(
                    "{} {} ({} bytes)",
                    response.status,
                    response.url,
                    response.body.len()
                ),
            }
        }
        Command::Buckets => {
            for bucket in commands::buckets(&settings).await? {
                println!("{}\t{}\t{}", bucket.name, bucket.entries, bucket.created_at);
            }
        }
        Command::Certificates { path, output } => {
            let Some(html) = commands::certificates(&path) else {
                return Ok(());
            };
            match output {
                Some(output) => std::fs::write(&output, html)
                    .with_context(|| format!("failed to write {}", output.display()))?,
                None => println!("{html}"),
            }
        }
        Command::CarouselDemo {
            slides,
            ticks,
            interval_ms,
        } => {
            let changes =
                commands::carousel_demo(slides, ticks, Duration::from_millis(interval_ms)).await?;
            for change in changes {
                println!(
                    "slide {} -> {} of {}",
                    change.previous_slide, change.current_slide, change.total_slides
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
