//! JobPilot operator CLI
//!
//! Discovers and ingests job postings into a SQLite store, and searches
//! them against a profile. Every command prints JSON on stdout; logs go to
//! stderr.

mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use job_discovery::{
    CancellationToken, IngestConfig, OpenAIEmbedder, OpenAIExtractor, OpenAIScorer, Pipeline,
    Profile, RejectionMemory, SearchConfig, SqliteStore, TavilyWebSearcher,
};
use openai_client::{OpenAIClient, RetryPolicy};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Upper bound on a single OpenAI HTTP request.
const OPENAI_REQUEST_TIMEOUT_SECS: u64 = 45;

#[derive(Parser)]
#[command(name = "jobpilot")]
#[command(about = "Discover, deduplicate and rank job postings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover posting URLs (or take them from --url) and ingest them
    Ingest {
        /// Discovery query
        #[arg(long)]
        query: Option<String>,

        /// URLs requested from discovery
        #[arg(long, default_value_t = 15)]
        limit: usize,

        /// Ingest these URLs instead of discovering
        #[arg(long = "url")]
        urls: Vec<String>,

        /// URLs processed at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Per-URL fetch timeout in seconds
        #[arg(long, default_value_t = 12)]
        fetch_timeout_secs: u64,

        /// Per-URL extraction timeout in seconds
        #[arg(long, default_value_t = 60)]
        extraction_timeout_secs: u64,
    },

    /// Rank stored postings against a profile
    Search {
        /// Profile JSON file
        #[arg(long)]
        profile: PathBuf,

        /// Rejection memory JSON file (list of ids or postings)
        #[arg(long)]
        rejections: Option<PathBuf>,

        /// Use this query instead of composing one from the profile
        #[arg(long)]
        query: Option<String>,

        /// Candidates retrieved before filtering
        #[arg(long, default_value_t = 20)]
        top_k: usize,

        /// Results returned (defaults to the profile's number_of_jobs_wanted)
        #[arg(long)]
        k: Option<usize>,

        /// Scoring calls in flight at once
        #[arg(long, default_value_t = 5)]
        concurrency: usize,

        /// Overall scoring budget in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Show store statistics
    Stats,
}

#[derive(Serialize)]
struct StatsResponse<'a> {
    database_url: &'a str,
    postings: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_discovery=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let store = SqliteStore::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open store at {}", config.database_url))?;

    let client = OpenAIClient::new(config.openai_api_key.expose())
        .with_timeout(Duration::from_secs(OPENAI_REQUEST_TIMEOUT_SECS))
        .context("Failed to build OpenAI client")?;
    let scoring_client = client.clone().with_retry(scoring_retry_policy());
    let pipeline = Pipeline::new(
        store,
        OpenAIEmbedder::new(client.clone(), &config.embedding_model),
        OpenAIExtractor::new(client, &config.extraction_model),
        OpenAIScorer::new(scoring_client, &config.scoring_model),
    );

    match cli.command {
        Commands::Ingest {
            query,
            limit,
            urls,
            concurrency,
            fetch_timeout_secs,
            extraction_timeout_secs,
        } => {
            let ingest_config = IngestConfig::default()
                .with_discovery_limit(limit)
                .with_concurrency(concurrency)
                .with_fetch_timeout(Duration::from_secs(fetch_timeout_secs))
                .with_extraction_timeout(Duration::from_secs(extraction_timeout_secs));
            let pipeline = pipeline.with_ingest_config(ingest_config);

            let report = if urls.is_empty() {
                let searcher = TavilyWebSearcher::new(config.require_tavily()?);
                pipeline
                    .with_searcher(searcher)
                    .discover_and_ingest(query.as_deref())
                    .await
                    .context("Discovery failed")?
            } else {
                pipeline.ingest_urls(&urls).await
            };
            print_json(&report)?;
        }

        Commands::Search {
            profile,
            rejections,
            query,
            top_k,
            k,
            concurrency,
            deadline_secs,
        } => {
            let profile: Profile = read_json(&profile)?;
            let rejections: RejectionMemory = match rejections {
                Some(path) => read_json(&path)?,
                None => RejectionMemory::new(),
            };

            let mut search_config = SearchConfig::default()
                .with_retrieve_top_k(top_k)
                .with_scoring_concurrency(concurrency);
            if let Some(k) = k {
                search_config = search_config.with_result_count(k);
            }
            if let Some(secs) = deadline_secs {
                search_config = search_config.with_search_deadline(Duration::from_secs(secs));
            }
            let pipeline = pipeline.with_search_config(search_config);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, returning completed results");
                    on_interrupt.cancel();
                }
            });

            let result = match query {
                Some(query) => {
                    pipeline
                        .search_with_query(&query, &profile, &rejections, cancel)
                        .await
                }
                None => pipeline.search_with_cancel(&profile, &rejections, cancel).await,
            };
            print_json(&result)?;
        }

        Commands::Stats => {
            let postings = pipeline.count().await.context("Failed to count postings")?;
            print_json(&StatsResponse {
                database_url: &config.database_url,
                postings,
            })?;
        }
    }

    Ok(())
}

/// Scoring calls run under the pipeline's per-call timeout, so the
/// scorer's back-off has to fit well inside it.
fn scoring_retry_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(500))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
