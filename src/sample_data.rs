//! Sample-data provider backed by the platform's `developer.sampleData.get`.
//!
//! The platform returns records that already have the output shape, so they
//! are mapped over directly. Request shape:
//!
//! ```json
//! { "query": "python", "filters": "{\"languages\":[\"python\"],\"type\":\"template\"}" }
//! ```
//!
//! `filters` is a JSON-encoded string and is omitted when nothing is
//! selected; `query` is omitted when blank.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::UpstreamError;
use crate::filters::FilterPayload;
use crate::models::{SearchQuery, SearchResultRecord};
use crate::platform::{ensure_ok, Platform};
use crate::traits::SearchProvider;

pub const SAMPLE_DATA_METHOD: &str = "developer.sampleData.get";

pub struct SampleDataProvider {
    platform: Arc<dyn Platform>,
    max_results: usize,
}

impl SampleDataProvider {
    pub fn new(platform: Arc<dyn Platform>, max_results: usize) -> Self {
        Self {
            platform,
            max_results,
        }
    }

    /// Fetch raw samples.
    ///
    /// Fails with `Malformed` when the envelope says `ok: false` or has no
    /// `samples` array.
    pub async fn fetch_samples(
        &self,
        query: Option<&str>,
        filters: &FilterPayload,
    ) -> Result<Vec<Value>, UpstreamError> {
        let mut params = Map::new();
        if let Some(query) = query {
            params.insert("query".to_string(), Value::from(query));
        }
        if !filters.is_empty() {
            params.insert(
                "filters".to_string(),
                Value::from(filters.to_json().to_string()),
            );
        }

        let envelope = self
            .platform
            .api_call(SAMPLE_DATA_METHOD, Value::Object(params))
            .await?;
        let envelope = ensure_ok(SAMPLE_DATA_METHOD, envelope)?;

        match envelope.get("samples") {
            Some(Value::Array(samples)) => Ok(samples.clone()),
            _ => {
                tracing::error!(
                    method = SAMPLE_DATA_METHOD,
                    response = %envelope,
                    "response has no samples array"
                );
                Err(UpstreamError::Malformed(format!(
                    "invalid response format from {}",
                    SAMPLE_DATA_METHOD
                )))
            }
        }
    }
}

/// Map one sample onto a result record, or `None` if a field is missing.
pub fn sample_to_record(sample: &Value) -> Option<SearchResultRecord> {
    serde_json::from_value(sample.clone()).ok()
}

#[async_trait]
impl SearchProvider for SampleDataProvider {
    fn name(&self) -> &str {
        "sample_data"
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn search(
        &self,
        query: &SearchQuery,
        filters: &FilterPayload,
    ) -> Result<Vec<SearchResultRecord>, UpstreamError> {
        let samples = self.fetch_samples(query.trimmed_text(), filters).await?;

        let records: Vec<SearchResultRecord> = samples
            .iter()
            .filter_map(|sample| {
                let record = sample_to_record(sample);
                if record.is_none() {
                    tracing::warn!(sample = %sample, "skipping sample with missing fields");
                }
                record
            })
            .collect();

        Ok(records)
    }

    async fn lookup(&self, id: &str) -> Result<Option<SearchResultRecord>, UpstreamError> {
        let samples = self.fetch_samples(None, &FilterPayload::default()).await?;
        Ok(samples
            .iter()
            .filter_map(sample_to_record)
            .find(|record| record.external_ref.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_to_record_keeps_content() {
        let record = sample_to_record(&json!({
            "title": "Sample 2",
            "description": "Description 2",
            "link": "https://example.com/2",
            "date_updated": "2023-01-02",
            "external_ref": {"id": "sample2"},
            "content": "Full content here",
        }))
        .unwrap();
        assert_eq!(record.content.as_deref(), Some("Full content here"));
        assert_eq!(record.external_ref.id, "sample2");
    }

    #[test]
    fn test_sample_to_record_without_content() {
        let record = sample_to_record(&json!({
            "title": "Sample 1",
            "description": "Description 1",
            "link": "https://example.com/1",
            "date_updated": "2023-01-01",
            "external_ref": {"id": "sample1", "type": "sample"},
        }))
        .unwrap();
        assert_eq!(record.content, None);
        assert_eq!(record.external_ref.kind.as_deref(), Some("sample"));
    }

    #[test]
    fn test_sample_missing_field_rejected() {
        assert!(sample_to_record(&json!({
            "title": "Sample 1",
            "link": "https://example.com/1",
            "date_updated": "2023-01-01",
            "external_ref": {"id": "sample1"},
        }))
        .is_none());
    }
}
