//! Validation and normalization of Open Library search hits.
//!
//! A hit becomes a [`CandidateRecord`] only if every required field is
//! present and usable. The first failing check rejects the whole hit; nothing
//! is ever filled in with placeholder values.

use serde_json::Value;

use crate::models::CandidateRecord;

const REQUIRED_FIELDS: [&str; 4] = ["key", "title", "editions", "author_name"];
const REQUIRED_EDITION_FIELDS: [&str; 4] = ["key", "title", "publish_date", "description"];

/// Validate one raw search hit.
///
/// Returns `None` when the hit lacks any required field, has no author, has
/// no edition, or its first edition lacks a publish date or description.
pub fn normalize(raw: &Value) -> Option<CandidateRecord> {
    if !has_fields(raw, &REQUIRED_FIELDS) {
        return None;
    }
    let key = non_empty_str(&raw["key"])?;
    let title = non_empty_str(&raw["title"])?;
    let author_name = first_author(raw)?;

    let edition = raw["editions"].get("docs")?.as_array()?.first()?;
    if !has_fields(edition, &REQUIRED_EDITION_FIELDS) {
        return None;
    }
    let publish_date_raw = edition["publish_date"]
        .as_array()?
        .first()?
        .as_str()?
        .to_string();

    Some(CandidateRecord {
        key,
        title,
        author_name,
        edition_key: non_empty_str(&edition["key"])?,
        edition_title: non_empty_str(&edition["title"])?,
        publish_date_raw,
        description: text_value(&edition["description"])?,
    })
}

/// Coerce an Open Library text field into a string.
///
/// Accepts a plain string or a typed text object (`{"type": "/type/text",
/// "value": "..."}`). Empty text counts as missing.
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str),
        _ => None,
    }
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

fn has_fields(value: &Value, fields: &[&str]) -> bool {
    value
        .as_object()
        .is_some_and(|obj| fields.iter().all(|f| obj.contains_key(*f)))
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn first_author(raw: &Value) -> Option<String> {
    raw["author_name"].as_array()?.first().and_then(non_empty_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_hit() -> Value {
        json!({
            "key": "/works/OL45804W",
            "title": "Fantastic Mr Fox",
            "author_name": ["Roald Dahl", "Quentin Blake"],
            "editions": {
                "numFound": 1,
                "docs": [{
                    "key": "/books/OL7353617M",
                    "title": "Fantastic Mr. Fox",
                    "publish_date": ["October 1, 1988", "1988"],
                    "description": "A fox outwits three farmers."
                }]
            }
        })
    }

    #[test]
    fn test_valid_hit() {
        let record = normalize(&valid_hit()).unwrap();
        assert_eq!(record.key, "/works/OL45804W");
        assert_eq!(record.title, "Fantastic Mr Fox");
        assert_eq!(record.author_name, "Roald Dahl");
        assert_eq!(record.edition_key, "/books/OL7353617M");
        assert_eq!(record.edition_title, "Fantastic Mr. Fox");
        assert_eq!(record.publish_date_raw, "October 1, 1988");
        assert_eq!(record.description, "A fox outwits three farmers.");
    }

    #[test]
    fn test_any_missing_required_field_rejects() {
        // Every non-empty subset of the required fields, removed.
        for mask in 1u8..(1 << REQUIRED_FIELDS.len()) {
            let mut hit = valid_hit();
            for (i, field) in REQUIRED_FIELDS.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    hit.as_object_mut().unwrap().remove(*field);
                }
            }
            assert!(normalize(&hit).is_none(), "mask {mask:#06b} accepted");
        }
    }

    #[test]
    fn test_any_missing_edition_field_rejects() {
        for field in REQUIRED_EDITION_FIELDS {
            let mut hit = valid_hit();
            hit["editions"]["docs"][0]
                .as_object_mut()
                .unwrap()
                .remove(field);
            assert!(normalize(&hit).is_none(), "missing {field} accepted");
        }
    }

    #[test]
    fn test_empty_author_list_rejects() {
        let mut hit = valid_hit();
        hit["author_name"] = json!([]);
        assert!(normalize(&hit).is_none());
    }

    #[test]
    fn test_no_editions_rejects() {
        let mut hit = valid_hit();
        hit["editions"]["docs"] = json!([]);
        assert!(normalize(&hit).is_none());

        let mut hit = valid_hit();
        hit["editions"] = json!({"numFound": 0});
        assert!(normalize(&hit).is_none());
    }

    #[test]
    fn test_empty_publish_date_rejects() {
        let mut hit = valid_hit();
        hit["editions"]["docs"][0]["publish_date"] = json!([]);
        assert!(normalize(&hit).is_none());
    }

    #[test]
    fn test_blank_title_rejects() {
        let mut hit = valid_hit();
        hit["title"] = json!("  ");
        assert!(normalize(&hit).is_none());
    }

    #[test]
    fn test_typed_text_description() {
        let mut hit = valid_hit();
        hit["editions"]["docs"][0]["description"] =
            json!({"type": "/type/text", "value": "From the text object."});
        let record = normalize(&hit).unwrap();
        assert_eq!(record.description, "From the text object.");
    }

    #[test]
    fn test_non_object_hit_rejects() {
        assert!(normalize(&json!("not a record")).is_none());
        assert!(normalize(&json!(null)).is_none());
    }

    #[test]
    fn test_text_value_variants() {
        assert_eq!(text_value(&json!("plain")), Some("plain".to_string()));
        assert_eq!(text_value(&json!({"value": "typed"})), Some("typed".to_string()));
        assert_eq!(text_value(&json!("")), None);
        assert_eq!(text_value(&json!(42)), None);
        assert_eq!(text_value(&json!({"type": "/type/text"})), None);
    }
}
