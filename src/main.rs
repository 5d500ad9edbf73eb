//! Argonaut CLI driver
//!
//! Thin wrapper that wires the stores and LLM gateway together and runs a
//! single query (or a health check) through the pipeline. The HTTP service
//! and chat UI live elsewhere; this binary exists to exercise the core.
//!
//! # Usage
//!
//! ```bash
//! # Answer one question
//! argonaut "How many profiles in 2023?"
//!
//! # Component health probe
//! argonaut --health
//!
//! # Full result envelope as JSON
//! argonaut --json "Compare temperature near the equator between 2021 and 2022"
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: Postgres connection string
//! - `VECTOR_DB_URL`: vector store base URL
//! - `GROQ_API_KEY` / `HF_API_KEY`: LLM provider credentials
//! - `RUST_LOG`: logging filter (default: info)

use anyhow::{Context, Result};
use argonaut::llm::{GroqClient, HuggingFaceClient, MultiLlmGateway};
use argonaut::store::{HttpVectorStore, PgRelationalStore};
use argonaut::{QueryPipeline, Settings};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "argonaut")]
#[command(about = "ARGO Float Data Intelligence - natural-language queries over profile data")]
#[command(version)]
struct CliArgs {
    /// The natural-language query to resolve
    query: Option<String>,

    /// Probe component health instead of running a query
    #[arg(long)]
    health: bool,

    /// Print the full result envelope as JSON
    #[arg(long)]
    json: bool,

    /// Override the per-retrieval result budget
    #[arg(long, value_name = "N")]
    max_results: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; missing files are fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let settings = Settings::load();

    let store = PgRelationalStore::connect(&settings.database_url, settings.db_max_connections)
        .await
        .context("Failed to connect to the relational store")?;
    let vector = HttpVectorStore::new(
        &settings.vector_url,
        &settings.vector_collection,
        settings.store_timeout(),
    )
    .context("Failed to build the vector store client")?;
    let gateway = MultiLlmGateway::new(
        GroqClient::new(settings.primary_llm.clone(), settings.llm_timeout())
            .context("Failed to build the primary LLM client")?,
        HuggingFaceClient::new(settings.secondary_llm.clone(), settings.llm_timeout())
            .context("Failed to build the secondary LLM client")?,
    );

    let pipeline = QueryPipeline::new(
        Arc::new(store),
        Arc::new(vector),
        Arc::new(gateway),
        &settings,
    );

    if args.health {
        let report = pipeline.health_check().await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.overall_ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let Some(query) = args.query else {
        anyhow::bail!("No query given. Usage: argonaut \"<question>\" (or --health)");
    };

    let result = pipeline.process_query(&query, args.max_results).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.answer);
    }

    Ok(())
}
