//! Core data models used throughout the search step.
//!
//! These types represent the step inputs, the intermediate candidate records,
//! and the search results that flow through the search pipeline. All of them
//! are built fresh per invocation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A filter selection as sent by the platform: either the chosen options of a
/// multi-select filter, or the state of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSelection {
    Options(Vec<String>),
    Toggle(bool),
}

impl FilterSelection {
    /// Read a selection from a raw input value: a list of strings or a bool.
    /// Anything else (null, numbers, objects, mixed lists) is `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(on) => Some(Self::Toggle(*on)),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::Options),
            _ => None,
        }
    }
}

/// Query text plus the user's filter selections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub selected_filters: BTreeMap<String, FilterSelection>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            selected_filters: BTreeMap::new(),
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, selection: FilterSelection) -> Self {
        self.selected_filters.insert(name.into(), selection);
        self
    }

    /// Query text with surrounding whitespace removed, or `None` if blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Identity of the user running the workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct UserContext {
    pub id: String,
}

/// Inputs of the `search` step function.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchInputs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient_filters")]
    pub filters: Option<BTreeMap<String, FilterSelection>>,
    #[serde(default)]
    pub user_context: Option<UserContext>,
}

/// Keep the filter entries that read as a selection and drop the rest.
fn lenient_filters<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, FilterSelection>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            tracing::debug!(filters = %other, "ignoring filters that are not an object");
            return Ok(None);
        }
    };

    let selected = entries
        .into_iter()
        .filter_map(|(name, value)| match FilterSelection::from_value(&value) {
            Some(selection) => Some((name, selection)),
            None => {
                tracing::debug!(filter = %name, value = %value, "ignoring unusable filter value");
                None
            }
        })
        .collect();
    Ok(Some(selected))
}

impl SearchInputs {
    pub fn into_query(self) -> SearchQuery {
        SearchQuery {
            text: self.query,
            selected_filters: self.filters.unwrap_or_default(),
        }
    }
}

/// Stable external identifier of a result item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReference {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl EntityReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
        }
    }
}

/// One search result as returned to the workflow.
///
/// `content` is left out of the serialized form entirely when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultRecord {
    pub title: String,
    pub description: String,
    pub link: String,
    pub date_updated: String,
    pub external_ref: EntityReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A public-search hit that passed validation, before date canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub key: String,
    pub title: String,
    pub author_name: String,
    pub edition_key: String,
    pub edition_title: String,
    pub publish_date_raw: String,
    pub description: String,
}
