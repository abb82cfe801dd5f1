//! Entity detail pane for unfurled search results.
//!
//! On `entity_details_requested` the item is resolved through the active
//! provider's [`lookup`](crate::traits::SearchProvider::lookup) and shown
//! with `entity.presentDetails`. Unknown ids are logged and dropped without
//! a platform call.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{EntityReference, SearchResultRecord};
use crate::platform::present_details;
use crate::traits::StepContext;

pub const ENTITY_TYPE: &str = "slack#/entities/item";
const TITLE_MAX_LENGTH: usize = 50;

/// Payload of an `entity_details_requested` event.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDetailsRequest {
    pub external_ref: EntityReference,
    pub trigger_id: String,
    pub link: EntityLink,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityLink {
    pub url: String,
}

impl EntityDetailsRequest {
    pub fn new(
        id: impl Into<String>,
        trigger_id: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            external_ref: EntityReference::new(id),
            trigger_id: trigger_id.into(),
            link: EntityLink { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomField {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    pub value: String,
}

impl CustomField {
    fn string(key: &'static str, label: &'static str, value: &str) -> Self {
        Self {
            key,
            label,
            field_type: "string",
            value: value.to_string(),
        }
    }
}

/// Detail fields for a record; `content` only when the record has it.
pub fn custom_fields(record: &SearchResultRecord) -> Vec<CustomField> {
    let mut fields = vec![
        CustomField::string("description", "Description of sample", &record.description),
        CustomField::string("date_updated", "Last updated", &record.date_updated),
    ];
    if let Some(content) = &record.content {
        fields.push(CustomField::string("content", "Details of sample", content));
    }
    fields
}

/// Build the `entity.presentDetails` request body.
pub fn build_details_payload(request: &EntityDetailsRequest, record: &SearchResultRecord) -> Value {
    json!({
        "trigger_id": request.trigger_id,
        "metadata": {
            "entity_type": ENTITY_TYPE,
            "url": request.link.url,
            "external_ref": {"id": request.external_ref.id},
            "entity_payload": {
                "attributes": {
                    "title": {
                        "text": record.title,
                        "edit": {"enabled": false, "text": {"max_length": TITLE_MAX_LENGTH}},
                    },
                },
                "custom_fields": custom_fields(record),
            },
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsOutcome {
    Presented,
    NotFound,
    Failed,
}

/// Resolve and present one entity. Never propagates an error.
pub async fn handle_entity_details(
    request: &EntityDetailsRequest,
    ctx: &StepContext,
) -> DetailsOutcome {
    let id = &request.external_ref.id;

    let record = match ctx.assembler.lookup(id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::warn!(id = %id, "unable to find item in provider data");
            return DetailsOutcome::NotFound;
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "failed to fetch item details");
            return DetailsOutcome::Failed;
        }
    };

    let payload = build_details_payload(request, &record);
    match present_details(ctx.platform.as_ref(), payload).await {
        Ok(()) => DetailsOutcome::Presented,
        Err(e) => {
            tracing::error!(id = %id, error = %e, "failed to present item details");
            DetailsOutcome::Failed
        }
    }
}
