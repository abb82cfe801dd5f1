//! Open Library search provider.
//!
//! # Pipeline
//!
//! 1. `GET /search.json?q=<query>&fields=<fields>&limit=<cap>`
//! 2. Each hit in `docs` (first `cap` only) goes through
//!    [`normalize`](crate::normalize::normalize); invalid hits are dropped.
//! 3. With `enrich = true`, each surviving hit's work record is fetched
//!    (`GET /<key>.json`) through [`enrich_all`]. Hits whose work record
//!    failed to load or has no description are dropped.
//! 4. Publish dates go through [`to_iso_date`] and results are built with
//!    `link = base_url + key`.
//!
//! Without enrichment the edition description is the only text available, so
//! `content` is omitted. With enrichment, `content` is the work description
//! when it differs from the edition description.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::OpenLibraryConfig;
use crate::date::to_iso_date;
use crate::error::UpstreamError;
use crate::fanout::enrich_all;
use crate::filters::FilterPayload;
use crate::models::{CandidateRecord, EntityReference, SearchQuery, SearchResultRecord};
use crate::normalize::{normalize, text_value};
use crate::traits::SearchProvider;
use crate::upstream::get_json;

/// Thin client for the Open Library search and work endpoints.
#[derive(Clone)]
pub struct OpenLibraryClient {
    http: reqwest::Client,
    base_url: String,
    fields: String,
}

impl OpenLibraryClient {
    pub fn new(config: &OpenLibraryConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fields: config.fields.clone(),
        }
    }

    /// Run a search and return the raw response page.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Value, UpstreamError> {
        let url = format!("{}/search.json", self.base_url);
        get_json(
            &self.http,
            &url,
            &[
                ("q", query.to_string()),
                ("fields", self.fields.clone()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Fetch the record behind a key such as `/works/OL45804W`.
    pub async fn fetch_detail(&self, key: &str) -> Result<Value, UpstreamError> {
        get_json(&self.http, &format!("{}.json", self.link_for(key)), &[]).await
    }

    /// Public URL of an item.
    pub fn link_for(&self, key: &str) -> String {
        if key.starts_with('/') {
            format!("{}{}", self.base_url, key)
        } else {
            format!("{}/{}", self.base_url, key)
        }
    }
}

pub struct OpenLibraryProvider {
    client: OpenLibraryClient,
    max_results: usize,
    enrich: bool,
    enrich_concurrency: usize,
}

impl OpenLibraryProvider {
    pub fn new(config: &OpenLibraryConfig, http: reqwest::Client) -> Self {
        Self {
            client: OpenLibraryClient::new(config, http),
            max_results: config.max_results,
            enrich: config.enrich,
            enrich_concurrency: config.enrich_concurrency,
        }
    }

    fn to_record(&self, candidate: CandidateRecord, content: Option<String>) -> SearchResultRecord {
        SearchResultRecord {
            link: self.client.link_for(&candidate.key),
            date_updated: to_iso_date(&candidate.publish_date_raw),
            external_ref: EntityReference::new(candidate.key),
            title: candidate.title,
            description: candidate.description,
            content,
        }
    }

    /// Attach work descriptions, dropping candidates whose work record is
    /// unusable.
    async fn enrich(&self, candidates: Vec<CandidateRecord>) -> Vec<SearchResultRecord> {
        let keys: Vec<String> = candidates.iter().map(|c| c.key.clone()).collect();
        let client = &self.client;
        let details = enrich_all(keys, self.enrich_concurrency, |key: String| async move {
            client.fetch_detail(&key).await
        })
        .await;

        candidates
            .into_iter()
            .zip(details)
            .filter_map(|(candidate, (key, outcome))| match outcome {
                Ok(detail) => match text_value(&detail["description"]) {
                    Some(work_description) => {
                        let content =
                            (work_description != candidate.description).then_some(work_description);
                        Some(self.to_record(candidate, content))
                    }
                    None => {
                        tracing::warn!(key = %key, "work record has no description, skipping");
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "work detail fetch failed, skipping");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl SearchProvider for OpenLibraryProvider {
    fn name(&self) -> &str {
        "open_library"
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn search(
        &self,
        query: &SearchQuery,
        filters: &FilterPayload,
    ) -> Result<Vec<SearchResultRecord>, UpstreamError> {
        let Some(text) = query.trimmed_text() else {
            tracing::info!("empty query, skipping Open Library search");
            return Ok(Vec::new());
        };
        if !filters.is_empty() {
            tracing::debug!(filters = %filters.to_json(), "Open Library ignores filters");
        }

        let page = self.client.search(text, self.max_results).await?;
        let docs = page
            .get("docs")
            .and_then(Value::as_array)
            .ok_or_else(|| UpstreamError::Malformed("search response has no docs array".into()))?;

        let candidates: Vec<CandidateRecord> = docs
            .iter()
            .take(self.max_results)
            .filter_map(normalize)
            .collect();
        tracing::debug!(
            hits = docs.len(),
            valid = candidates.len(),
            "validated Open Library hits"
        );

        if self.enrich {
            Ok(self.enrich(candidates).await)
        } else {
            Ok(candidates
                .into_iter()
                .map(|candidate| self.to_record(candidate, None))
                .collect())
        }
    }

    async fn lookup(&self, id: &str) -> Result<Option<SearchResultRecord>, UpstreamError> {
        let work = self.client.fetch_detail(id).await?;
        let Some(title) = work["title"].as_str().filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };

        Ok(Some(SearchResultRecord {
            title: title.to_string(),
            description: text_value(&work["description"]).unwrap_or_default(),
            link: self.client.link_for(id),
            date_updated: to_iso_date(work["first_publish_date"].as_str().unwrap_or_default()),
            external_ref: EntityReference::new(id),
            content: None,
        }))
    }
}
