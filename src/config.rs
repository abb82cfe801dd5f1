//! TOML configuration.
//!
//! Every section has defaults, so an empty file (or no file at all, see
//! [`load_or_default`]) yields a working sample-data setup. See
//! `config/search-step.example.toml` for all keys.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::fanout::MAX_IN_FLIGHT;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub sample_data: SampleDataConfig,
    #[serde(default)]
    pub open_library: OpenLibraryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which provider answers the `search` step.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    SampleData,
    OpenLibrary,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::SampleData => "sample_data",
            ProviderKind::OpenLibrary => "open_library",
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub provider: ProviderKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackConfig {
    #[serde(default = "default_slack_api_base_url")]
    pub api_base_url: String,
    /// Name of the environment variable holding the bot token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_slack_api_base_url(),
            token_env: default_token_env(),
        }
    }
}

impl SlackConfig {
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

fn default_slack_api_base_url() -> String {
    "https://slack.com/api/".to_string()
}
fn default_token_env() -> String {
    "SLACK_BOT_TOKEN".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SampleDataConfig {
    #[serde(default = "default_sample_max_results")]
    pub max_results: usize,
}

impl Default for SampleDataConfig {
    fn default() -> Self {
        Self {
            max_results: default_sample_max_results(),
        }
    }
}

fn default_sample_max_results() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenLibraryConfig {
    #[serde(default = "default_open_library_base_url")]
    pub base_url: String,
    #[serde(default = "default_open_library_max_results")]
    pub max_results: usize,
    /// Value of the `fields` parameter sent to `/search.json`.
    #[serde(default = "default_open_library_fields")]
    pub fields: String,
    /// Fetch each work's detail record to fill in `content`.
    #[serde(default)]
    pub enrich: bool,
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: default_open_library_base_url(),
            max_results: default_open_library_max_results(),
            fields: default_open_library_fields(),
            enrich: false,
            enrich_concurrency: default_enrich_concurrency(),
        }
    }
}

fn default_open_library_base_url() -> String {
    "https://openlibrary.org".to_string()
}
fn default_open_library_max_results() -> usize {
    50
}
fn default_open_library_fields() -> String {
    "key,title,author_name,editions,description,publish_date".to_string()
}
fn default_enrich_concurrency() -> usize {
    MAX_IN_FLIGHT
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// How long the event receiver waits for a step to acknowledge before
    /// answering the platform anyway.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            ack_timeout_secs: default_ack_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_ack_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Max results of the configured provider.
    pub fn max_results(&self) -> usize {
        match self.search.provider {
            ProviderKind::SampleData => self.sample_data.max_results,
            ProviderKind::OpenLibrary => self.open_library.max_results,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        let config = Config::default();
        validate(&config)?;
        Ok(config)
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be >= 1");
    }

    if config.slack.api_base_url.trim().is_empty() {
        bail!("slack.api_base_url must not be empty");
    }

    if config.sample_data.max_results == 0 {
        bail!("sample_data.max_results must be >= 1");
    }

    if config.open_library.base_url.trim().is_empty() {
        bail!("open_library.base_url must not be empty");
    }
    if config.open_library.max_results == 0 {
        bail!("open_library.max_results must be >= 1");
    }
    if !(1..=MAX_IN_FLIGHT).contains(&config.open_library.enrich_concurrency) {
        bail!(
            "open_library.enrich_concurrency must be in [1, {}]",
            MAX_IN_FLIGHT
        );
    }

    if config.server.ack_timeout_secs == 0 {
        bail!("server.ack_timeout_secs must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.search.provider, ProviderKind::SampleData);
        assert_eq!(config.max_results(), 10);
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.slack.token_env, "SLACK_BOT_TOKEN");
        assert_eq!(config.open_library.base_url, "https://openlibrary.org");
        assert_eq!(config.open_library.enrich_concurrency, 50);
        assert!(!config.open_library.enrich);
        assert_eq!(config.server.ack_timeout_secs, 10);
    }

    #[test]
    fn test_open_library_provider() {
        let config = parse_config(
            r#"
[search]
provider = "open_library"

[open_library]
max_results = 25
enrich = true
enrich_concurrency = 8
"#,
        )
        .unwrap();
        assert_eq!(config.search.provider, ProviderKind::OpenLibrary);
        assert_eq!(config.max_results(), 25);
        assert!(config.open_library.enrich);
        assert_eq!(config.open_library.enrich_concurrency, 8);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = parse_config("[search]\nprovider = \"bing\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("parse"));
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let err = parse_config("[sample_data]\nmax_results = 0\n").unwrap_err();
        assert!(err.to_string().contains("sample_data.max_results"));

        let err = parse_config("[open_library]\nmax_results = 0\n").unwrap_err();
        assert!(err.to_string().contains("open_library.max_results"));
    }

    #[test]
    fn test_concurrency_out_of_range_rejected() {
        assert!(parse_config("[open_library]\nenrich_concurrency = 0\n").is_err());
        assert!(parse_config("[open_library]\nenrich_concurrency = 51\n").is_err());
        assert!(parse_config("[open_library]\nenrich_concurrency = 50\n").is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        assert!(parse_config("[http]\ntimeout_secs = 0\n").is_err());
        assert!(parse_config("[server]\nack_timeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"0.0.0.0:8080\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.search.provider, ProviderKind::SampleData);
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config(include_str!("../config/search-step.example.toml")).unwrap();
        assert_eq!(config.search.provider, ProviderKind::SampleData);
        assert_eq!(config.open_library.max_results, 50);
    }

    #[test]
    fn test_load_config_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
