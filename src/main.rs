//! # search-step CLI
//!
//! Runs the search step event receiver, or drives the search pipeline once
//! from the command line.
//!
//! ## Usage
//!
//! ```bash
//! search-step --config ./config/search-step.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search-step serve` | Start the HTTP event receiver |
//! | `search-step search "<query>"` | Run one search and print the results |
//! | `search-step filters` | Print the filter menu |
//! | `search-step details <id>` | Print the detail pane payload for an item |
//!
//! ## Examples
//!
//! ```bash
//! # Python templates only
//! search-step search "hello world" --language python --template
//!
//! # Open Library works, with logs
//! RUST_LOG=search_step=debug search-step search "dune"
//! ```
//!
//! Logs go to stderr; command output is JSON on stdout.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use search_step::assemble::Assembler;
use search_step::config::{self, Config};
use search_step::details::{build_details_payload, EntityDetailsRequest};
use search_step::filters::{
    filter_menu, LANGUAGES_FILTER, SAMPLES_FILTER, TEMPLATES_FILTER, TYPE_FILTER,
};
use search_step::models::{FilterSelection, SearchQuery};
use search_step::platform::SlackClient;
use search_step::server;
use search_step::upstream::http_client;

/// search-step: a workflow search step backed by sample data or Open Library.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/search-step.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "search-step", version, about = "Workflow search step service")]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// A missing file means built-in defaults.
    #[arg(long, global = true, default_value = "./config/search-step.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP event receiver.
    Serve,

    /// Run one search through the configured provider and print the results.
    Search {
        /// The search query string.
        query: String,

        /// Restrict to a language (repeatable).
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Restrict to an item type (repeatable). Only applied when exactly
        /// one distinct type is selected.
        #[arg(long = "type")]
        types: Vec<String>,

        /// Only templates.
        #[arg(long)]
        template: bool,

        /// Only samples.
        #[arg(long)]
        sample: bool,
    },

    /// Print the filter menu returned by the `filters` step.
    Filters,

    /// Print the entity detail payload for an item id.
    Details {
        /// External id, as found in `external_ref.id`.
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Search {
            query,
            languages,
            types,
            template,
            sample,
        } => {
            let query = build_query(query, languages, types, template, sample);
            let results = assembler(&cfg)?.assemble(&query).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Details { id } => {
            let Some(record) = assembler(&cfg)?.lookup(&id).await? else {
                bail!("no item found with id: {}", id);
            };
            let request = EntityDetailsRequest::new(id, "", record.link.clone());
            let payload = build_details_payload(&request, &record);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Filters => {
            println!("{}", serde_json::to_string_pretty(&filter_menu())?);
        }
    }

    Ok(())
}

fn assembler(cfg: &Config) -> Result<Assembler> {
    let platform = Arc::new(SlackClient::new(&cfg.slack, http_client(&cfg.http)?));
    Assembler::from_config(cfg, platform)
}

fn build_query(
    text: String,
    languages: Vec<String>,
    types: Vec<String>,
    template: bool,
    sample: bool,
) -> SearchQuery {
    let mut filters = BTreeMap::new();
    if !languages.is_empty() {
        filters.insert(LANGUAGES_FILTER.to_string(), FilterSelection::Options(languages));
    }
    if !types.is_empty() {
        filters.insert(TYPE_FILTER.to_string(), FilterSelection::Options(types));
    }
    if template {
        filters.insert(TEMPLATES_FILTER.to_string(), FilterSelection::Toggle(true));
    }
    if sample {
        filters.insert(SAMPLES_FILTER.to_string(), FilterSelection::Toggle(true));
    }
    SearchQuery {
        text: Some(text),
        selected_filters: filters,
    }
}
