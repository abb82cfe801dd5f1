//! Extension traits for search providers and workflow step functions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            FunctionRegistry              │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐  │
//! │  │  search  │ │ filters  │ │  Custom  │  │
//! │  │          │ │          │ │  (Rust)  │  │
//! │  └────┬─────┘ └──────────┘ └──────────┘  │
//! └───────┼──────────────────────────────────┘
//!         ▼
//!    Assembler ──▶ SearchProvider
//!                  ├─ SampleDataProvider  (developer.sampleData.get)
//!                  └─ OpenLibraryProvider (/search.json + /works/*.json)
//! ```
//!
//! A [`StepFunction`] is looked up by the `callback_id` of an incoming
//! `function_executed` event and run by [`run_step`](crate::step::run_step),
//! which owns acknowledgement and completion. Step functions only compute
//! their outputs.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::assemble::Assembler;
use crate::error::{StepError, UpstreamError};
use crate::filters::{filter_menu, FilterPayload};
use crate::models::{SearchInputs, SearchQuery, SearchResultRecord};
use crate::platform::Platform;

// ═══════════════════════════════════════════════════════════════════════
// SearchProvider Trait
// ═══════════════════════════════════════════════════════════════════════

/// A search backend.
///
/// Providers return already-shaped [`SearchResultRecord`]s; the
/// [`Assembler`] applies the result cap.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider identifier used in logs (e.g. `"open_library"`).
    fn name(&self) -> &str;

    /// Maximum number of results this provider may return per search.
    fn max_results(&self) -> usize;

    /// Run a search.
    ///
    /// `filters` is the payload built from the query's selections. Providers
    /// that cannot filter ignore it.
    async fn search(
        &self,
        query: &SearchQuery,
        filters: &FilterPayload,
    ) -> Result<Vec<SearchResultRecord>, UpstreamError>;

    /// Resolve a single item by its external id.
    ///
    /// `Ok(None)` means the provider answered but has no such item.
    async fn lookup(&self, id: &str) -> Result<Option<SearchResultRecord>, UpstreamError>;
}

// ═══════════════════════════════════════════════════════════════════════
// StepFunction Trait
// ═══════════════════════════════════════════════════════════════════════

/// A workflow step function invoked by the platform.
#[async_trait]
pub trait StepFunction: Send + Sync {
    /// The function's `callback_id` as declared in the app manifest.
    fn callback_id(&self) -> &str;

    /// One-line description for logs and the CLI.
    fn description(&self) -> &str;

    /// Message shown to the user when the step fails.
    ///
    /// Must not depend on the error; error detail is logged instead.
    fn failure_message(&self) -> &str;

    /// Compute the step outputs from the raw `inputs` object.
    async fn execute(&self, inputs: Value, ctx: &StepContext) -> Result<Value, StepError>;
}

// ═══════════════════════════════════════════════════════════════════════
// StepContext
// ═══════════════════════════════════════════════════════════════════════

/// Collaborators available to a step function during one invocation.
///
/// Cheap to clone; nothing in here is mutated by a step.
#[derive(Clone)]
pub struct StepContext {
    pub platform: Arc<dyn Platform>,
    pub assembler: Arc<Assembler>,
}

impl StepContext {
    pub fn new(platform: Arc<dyn Platform>, assembler: Arc<Assembler>) -> Self {
        Self {
            platform,
            assembler,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Step Functions
// ═══════════════════════════════════════════════════════════════════════

pub const SEARCH_FAILURE_MESSAGE: &str =
    "We encountered an issue processing your search results. Please try again.";
pub const FILTERS_FAILURE_MESSAGE: &str =
    "We encountered an issue loading the search filters. Please try again.";

/// Built-in `search` step: runs the query through the [`Assembler`].
pub struct SearchStep;

#[async_trait]
impl StepFunction for SearchStep {
    fn callback_id(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the configured provider and return normalized results"
    }

    fn failure_message(&self) -> &str {
        SEARCH_FAILURE_MESSAGE
    }

    async fn execute(&self, inputs: Value, ctx: &StepContext) -> Result<Value, StepError> {
        let inputs: SearchInputs =
            serde_json::from_value(inputs).map_err(|e| StepError::InvalidInputs(e.to_string()))?;

        let user = inputs
            .user_context
            .as_ref()
            .map(|u| u.id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let query = inputs.into_query();
        tracing::info!(user = %user, filters = ?query.selected_filters, "executing search");

        let results = ctx.assembler.assemble(&query).await?;
        tracing::info!(count = results.len(), "found search results");

        Ok(json!({ "search_result": results }))
    }
}

/// Built-in `filters` step: returns the static filter menu.
pub struct FiltersStep;

#[async_trait]
impl StepFunction for FiltersStep {
    fn callback_id(&self) -> &str {
        "filters"
    }

    fn description(&self) -> &str {
        "List the filters the search step understands"
    }

    fn failure_message(&self) -> &str {
        FILTERS_FAILURE_MESSAGE
    }

    async fn execute(&self, _inputs: Value, _ctx: &StepContext) -> Result<Value, StepError> {
        Ok(json!({ "filters": filter_menu() }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of step functions keyed by `callback_id`.
///
/// ```rust
/// use search_step::traits::FunctionRegistry;
///
/// let registry = FunctionRegistry::with_builtins();
/// assert!(registry.find("search").is_some());
/// assert!(registry.find("filters").is_some());
/// ```
pub struct FunctionRegistry {
    functions: Vec<Arc<dyn StepFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    /// Create a registry with the built-in `search` and `filters` steps.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SearchStep));
        registry.register(Arc::new(FiltersStep));
        registry
    }

    /// Register a function. A later registration with the same
    /// `callback_id` shadows the earlier one.
    pub fn register(&mut self, function: Arc<dyn StepFunction>) {
        self.functions.push(function);
    }

    pub fn functions(&self) -> &[Arc<dyn StepFunction>] {
        &self.functions
    }

    /// Find a function by `callback_id`.
    pub fn find(&self, callback_id: &str) -> Option<Arc<dyn StepFunction>> {
        self.functions
            .iter()
            .rev()
            .find(|f| f.callback_id() == callback_id)
            .cloned()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
