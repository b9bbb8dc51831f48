//! seo-frontier main entry point
//!
//! This is the command-line interface for crawling projects, comparing
//! crawls, and checking content.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use seo_frontier::changes::{ChangeDetector, ContentHasher};
use seo_frontier::config::{load_config, load_config_with_hash, Config, QualityConfig};
use seo_frontier::crawler::{
    fetch_batch, BroadcastProgressSink, CrawlJob, CrawlService, FetchOptions, HttpCrawlClient,
};
use seo_frontier::quality::{ContentInput, ContentQualityService};
use seo_frontier::related::{
    Collection, RelatedCollectionsService, RelatedQuery, DEFAULT_CLUSTER_THRESHOLD,
    DEFAULT_MAX_RESULTS, DEFAULT_SIMILARITY_THRESHOLD,
};
use seo_frontier::storage::{PageStore, SqliteStorage};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// seo-frontier: crawl frontier and content analysis for SEO
///
/// Crawls a project's site within include/exclude patterns, stores page
/// fingerprints, reports changes between crawls, and scores copy for
/// machine-written tropes.
#[derive(Parser, Debug)]
#[command(name = "seo-frontier")]
#[command(version)]
#[command(about = "Crawl frontier and content analysis for SEO", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a crawl and print the final progress
    Crawl {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Override the configured start URL
        #[arg(long)]
        start_url: Option<String>,
    },

    /// Compare two stored crawls and save the change summary
    Diff {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Earlier crawl ID
        #[arg(long)]
        previous: i64,

        /// Later crawl ID
        #[arg(long)]
        current: i64,
    },

    /// Score content from a JSON object or array of objects
    Quality {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Read `[quality]` settings from this configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Find collections related to one collection in a JSON list
    Related {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// ID of the source collection
        #[arg(long, required_unless_present = "clusters")]
        source: Option<String>,

        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        /// Group all collections into clusters instead
        #[arg(long)]
        clusters: bool,
    },

    /// Fetch URLs concurrently and print one JSON line per result
    Fetch {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.json_logs);

    match cli.command {
        Command::Crawl { config, start_url } => handle_crawl(&config, start_url).await,
        Command::Diff {
            config,
            previous,
            current,
        } => handle_diff(&config, previous, current),
        Command::Quality { file, config } => handle_quality(&file, config.as_deref()),
        Command::Related {
            file,
            source,
            threshold,
            max_results,
            clusters,
        } => handle_related(&file, source, threshold, max_results, clusters),
        Command::Fetch { config, urls } => handle_fetch(&config, urls).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, json: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_frontier=info,warn"),
            1 => EnvFilter::new("seo_frontier=debug,info"),
            2 => EnvFilter::new("seo_frontier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(path: &Path) -> anyhow::Result<(Config, String)> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::debug!(hash = %hash, "Configuration loaded");
    Ok((config, hash))
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    SqliteStorage::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Handles the crawl command
async fn handle_crawl(path: &Path, start_url: Option<String>) -> anyhow::Result<()> {
    let (config, hash) = load(path)?;

    let client = HttpCrawlClient::new(&config.user_agent, &config.http)?;
    let storage = open_storage(&config)?;
    let hasher = ContentHasher::from_config(&config.change_detection);

    let sink = Arc::new(BroadcastProgressSink::default());
    let mut updates = sink.subscribe();
    tokio::spawn(async move {
        while let Ok(message) = updates.recv().await {
            tracing::debug!(crawl_id = message.crawl_id, progress = %message.payload, "Progress update");
        }
    });

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            on_interrupt.cancel();
        }
    });

    let mut job = CrawlJob::from_config(&config.crawler).with_config_hash(hash);
    if let Some(start_url) = start_url {
        job.start_url = start_url;
    }

    let mut service = CrawlService::new(client, storage, hasher).with_sink(sink);
    let progress = service.run_crawl(&job, &cancel).await?;
    print_json(&progress)
}

/// Handles the diff command
fn handle_diff(path: &Path, previous: i64, current: i64) -> anyhow::Result<()> {
    let (config, _) = load(path)?;
    let mut storage = open_storage(&config)?;

    let previous_crawl = storage.get_crawl(previous)?;
    let current_crawl = storage.get_crawl(current)?;
    if previous_crawl.project_id != current_crawl.project_id {
        bail!(
            "Crawls {} and {} belong to different projects",
            previous,
            current
        );
    }

    let detector = ChangeDetector::from_config(&config.change_detection)?;
    let summary = detector.compare(
        &storage.load_snapshots(previous)?,
        &storage.load_snapshots(current)?,
    );
    let summary_id =
        storage.save_change_summary(current_crawl.project_id, previous, current, &summary)?;

    tracing::info!(
        summary_id,
        new = summary.new_pages,
        removed = summary.removed_pages,
        changed = summary.changed_pages,
        significant = summary.is_significant,
        "Change summary saved"
    );
    print_json(&summary)
}

/// A single content object or a batch of them
#[derive(Deserialize)]
#[serde(untagged)]
enum QualityRequest {
    Batch(Vec<ContentInput>),
    Single(ContentInput),
}

/// Handles the quality command
fn handle_quality(file: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let settings = match config {
        Some(path) => load_config(path)?.quality,
        None => QualityConfig::default(),
    };
    let service = ContentQualityService::new(&settings)?;

    match read_json::<QualityRequest>(file)? {
        QualityRequest::Single(content) => {
            print_json(&service.check_content_quality(&content)?)
        }
        QualityRequest::Batch(items) => print_json(&service.check_batch(&items)),
    }
}

/// Handles the related command
fn handle_related(
    file: &Path,
    source: Option<String>,
    threshold: Option<f64>,
    max_results: usize,
    clusters: bool,
) -> anyhow::Result<()> {
    let collections: Vec<Collection> = read_json(file)?;
    let service = RelatedCollectionsService::new();

    if clusters {
        let threshold = threshold.unwrap_or(DEFAULT_CLUSTER_THRESHOLD);
        let groups = service.find_clusters(&collections, threshold)?;
        let ids: Vec<Vec<&str>> = groups
            .iter()
            .map(|group| group.iter().map(|c| c.id.as_str()).collect())
            .collect();
        return print_json(&ids);
    }

    let Some(source_id) = source else {
        bail!("--source is required unless --clusters is given");
    };
    let Some(source) = collections.iter().find(|c| c.id == source_id) else {
        bail!("No collection with id {} in {}", source_id, file.display());
    };

    let query = RelatedQuery {
        threshold: threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
        max_results,
        exclude_ids: [source_id.clone()].into_iter().collect(),
    };
    let labels: Vec<&str> = source.labels.iter().map(String::as_str).collect();
    print_json(&service.find_related(&labels, &collections, &query)?)
}

/// Handles the fetch command
async fn handle_fetch(path: &Path, urls: Vec<String>) -> anyhow::Result<()> {
    let (config, _) = load(path)?;
    let client = HttpCrawlClient::new(&config.user_agent, &config.http)?;
    let options = FetchOptions::default();

    let mut failed = 0;
    let mut outcomes = fetch_batch(&client, urls, config.crawler.batch_concurrency, &options);
    while let Some(outcome) = outcomes.next().await {
        if !outcome.is_success() {
            failed += 1;
        }
        let line = match &outcome.result {
            Ok(result) => serde_json::to_value(result)?,
            Err(e) => serde_json::json!({
                "success": false,
                "url": outcome.url,
                "error": e.to_string(),
            }),
        };
        println!("{}", line);
    }

    if failed > 0 {
        tracing::warn!(failed, "Some URLs could not be fetched");
    }
    Ok(())
}
