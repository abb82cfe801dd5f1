//! Search filters: the static filter menu and the provider filter payload.
//!
//! The `filters` step hands the menu below to the platform. When a search
//! runs, the user's selections come back keyed by filter name and are folded
//! into a [`FilterPayload`] the sample-data provider understands.
//!
//! # Type selection
//!
//! The provider accepts a single `type` value. It can be selected either as a
//! list (`type: ["template"]`) or through the `template` / `sample` toggles.
//! Both forms are merged; when exactly one distinct type is selected it is
//! sent, otherwise `type` is left out so the search is not narrowed by an
//! ambiguous choice.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::FilterSelection;

pub const LANGUAGES_FILTER: &str = "languages";
pub const TYPE_FILTER: &str = "type";
pub const TEMPLATES_FILTER: &str = "template";
pub const SAMPLES_FILTER: &str = "sample";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    MultiSelect,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub name: String,
    pub value: String,
}

/// One entry of the filter menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDefinition {
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name_plural: Option<String>,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FilterOption>>,
}

fn option(name: &str, value: &str) -> FilterOption {
    FilterOption {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn toggle(name: &str, display_name: &str) -> FilterDefinition {
    FilterDefinition {
        name: name.to_string(),
        display_name: display_name.to_string(),
        display_name_plural: None,
        filter_type: FilterType::Toggle,
        options: None,
    }
}

/// The filters offered to the user, in display order.
pub fn filter_menu() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition {
            name: LANGUAGES_FILTER.to_string(),
            display_name: "Language".to_string(),
            display_name_plural: Some("Languages".to_string()),
            filter_type: FilterType::MultiSelect,
            options: Some(vec![
                option("Python", "python"),
                option("Java", "java"),
                option("JavaScript", "javascript"),
                option("TypeScript", "typescript"),
            ]),
        },
        toggle(TEMPLATES_FILTER, "Templates"),
        toggle(SAMPLES_FILTER, "Samples"),
    ]
}

/// Filters in the shape the sample-data provider accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPayload {
    pub languages: Vec<String>,
    pub kind: Option<String>,
}

impl FilterPayload {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.kind.is_none()
    }

    /// JSON object with only the keys that carry a selection.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if !self.languages.is_empty() {
            map.insert(
                LANGUAGES_FILTER.to_string(),
                Value::from(self.languages.clone()),
            );
        }
        if let Some(kind) = &self.kind {
            map.insert(TYPE_FILTER.to_string(), Value::from(kind.clone()));
        }
        Value::Object(map)
    }
}

/// Build the provider payload from the user's selections.
///
/// Unknown filter names are ignored. A toggle sent for `languages` or a list
/// sent for a toggle is ignored as well.
pub fn build_filter_payload(selected: &BTreeMap<String, FilterSelection>) -> FilterPayload {
    let mut payload = FilterPayload::default();

    if let Some(FilterSelection::Options(languages)) = selected.get(LANGUAGES_FILTER) {
        payload.languages = languages.clone();
    }

    let mut types: BTreeSet<&str> = BTreeSet::new();
    if let Some(FilterSelection::Options(values)) = selected.get(TYPE_FILTER) {
        types.extend(values.iter().map(String::as_str));
    }
    for name in [TEMPLATES_FILTER, SAMPLES_FILTER] {
        if let Some(FilterSelection::Toggle(true)) = selected.get(name) {
            types.insert(name);
        }
    }

    if types.len() == 1 {
        payload.kind = types.into_iter().next().map(str::to_string);
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selections(pairs: &[(&str, FilterSelection)]) -> BTreeMap<String, FilterSelection> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn options(values: &[&str]) -> FilterSelection {
        FilterSelection::Options(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_single_type_collapses_to_scalar() {
        let payload = build_filter_payload(&selections(&[
            ("languages", options(&["python"])),
            ("type", options(&["template"])),
        ]));
        assert_eq!(
            payload.to_json(),
            json!({"languages": ["python"], "type": "template"})
        );
    }

    #[test]
    fn test_multiple_types_are_dropped() {
        let payload =
            build_filter_payload(&selections(&[("type", options(&["template", "sample"]))]));
        assert!(payload.is_empty());
        assert_eq!(payload.to_json(), json!({}));
    }

    #[test]
    fn test_languages_pass_through_verbatim() {
        let payload = build_filter_payload(&selections(&[(
            "languages",
            options(&["python", "javascript"]),
        )]));
        assert_eq!(payload.to_json(), json!({"languages": ["python", "javascript"]}));
    }

    #[test]
    fn test_empty_selections_give_empty_payload() {
        let payload = build_filter_payload(&selections(&[
            ("languages", options(&[])),
            ("type", options(&[])),
        ]));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_single_toggle_sets_type() {
        let payload = build_filter_payload(&selections(&[
            ("languages", options(&["python"])),
            ("template", FilterSelection::Toggle(true)),
        ]));
        assert_eq!(
            payload.to_json(),
            json!({"languages": ["python"], "type": "template"})
        );

        let payload =
            build_filter_payload(&selections(&[("sample", FilterSelection::Toggle(true))]));
        assert_eq!(payload.kind.as_deref(), Some("sample"));
    }

    #[test]
    fn test_both_toggles_drop_type() {
        let payload = build_filter_payload(&selections(&[
            ("template", FilterSelection::Toggle(true)),
            ("sample", FilterSelection::Toggle(true)),
        ]));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_toggle_off_is_ignored() {
        let payload = build_filter_payload(&selections(&[
            ("template", FilterSelection::Toggle(false)),
            ("sample", FilterSelection::Toggle(true)),
        ]));
        assert_eq!(payload.kind.as_deref(), Some("sample"));
    }

    #[test]
    fn test_toggle_conflicting_with_type_list_drops_type() {
        let payload = build_filter_payload(&selections(&[
            ("type", options(&["sample"])),
            ("template", FilterSelection::Toggle(true)),
        ]));
        assert_eq!(payload.kind, None);
    }

    #[test]
    fn test_unknown_filters_ignored() {
        let payload = build_filter_payload(&selections(&[("color", options(&["red"]))]));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_filter_menu_shape() {
        let menu = serde_json::to_value(filter_menu()).unwrap();
        assert_eq!(
            menu,
            json!([
                {
                    "name": "languages",
                    "display_name": "Language",
                    "display_name_plural": "Languages",
                    "type": "multi_select",
                    "options": [
                        {"name": "Python", "value": "python"},
                        {"name": "Java", "value": "java"},
                        {"name": "JavaScript", "value": "javascript"},
                        {"name": "TypeScript", "value": "typescript"},
                    ],
                },
                {"name": "template", "display_name": "Templates", "type": "toggle"},
                {"name": "sample", "display_name": "Samples", "type": "toggle"},
            ])
        );
    }
}
