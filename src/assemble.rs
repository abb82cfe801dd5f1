//! Result assembly: one entry point for every provider.
//!
//! The [`Assembler`] builds the filter payload from the query, hands both to
//! the configured [`SearchProvider`], and caps the result list at the
//! provider's `max_results`.

use anyhow::Result;
use std::sync::Arc;

use crate::config::{Config, ProviderKind};
use crate::error::UpstreamError;
use crate::filters::build_filter_payload;
use crate::models::{SearchQuery, SearchResultRecord};
use crate::open_library::OpenLibraryProvider;
use crate::platform::Platform;
use crate::sample_data::SampleDataProvider;
use crate::traits::SearchProvider;
use crate::upstream::http_client;

pub struct Assembler {
    provider: Box<dyn SearchProvider>,
}

impl Assembler {
    pub fn new(provider: Box<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    /// Build the assembler for the provider selected in `[search]`.
    ///
    /// The sample-data provider talks to the platform, so it shares
    /// `platform` with the step functions.
    pub fn from_config(config: &Config, platform: Arc<dyn Platform>) -> Result<Self> {
        let provider: Box<dyn SearchProvider> = match config.search.provider {
            ProviderKind::SampleData => Box::new(SampleDataProvider::new(
                platform,
                config.sample_data.max_results,
            )),
            ProviderKind::OpenLibrary => Box::new(OpenLibraryProvider::new(
                &config.open_library,
                http_client(&config.http)?,
            )),
        };
        Ok(Self::new(provider))
    }

    pub fn provider(&self) -> &dyn SearchProvider {
        self.provider.as_ref()
    }

    /// Run a search and return at most `max_results` records, in provider
    /// order.
    pub async fn assemble(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResultRecord>, UpstreamError> {
        let filters = build_filter_payload(&query.selected_filters);
        tracing::info!(
            provider = self.provider.name(),
            filters = %filters.to_json(),
            "calling search provider"
        );

        let mut results = self.provider.search(query, &filters).await?;
        results.truncate(self.provider.max_results());
        Ok(results)
    }

    /// Resolve one item by external id.
    pub async fn lookup(&self, id: &str) -> Result<Option<SearchResultRecord>, UpstreamError> {
        self.provider.lookup(id).await
    }
}
