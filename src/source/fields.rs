// src/source/fields.rs
//! Per-category field mapping from raw records to `NormalizedRecord`.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::RecordError;
use crate::ownership::OwnerHints;
use crate::record::{
    epoch_zero, first_scalar, parse_timestamp, NormalizedRecord, RawRecord, SourceKey, ID_ALIASES,
};

const TITLE_ALIASES: &[&str] = &["title", "name"];
const BODY_ALIASES: &[&str] = &["content", "summary", "body", "description"];
const CREATED_AT_ALIASES: &[&str] = &["createdAt", "created_at", "timestamp"];
const IMAGE_ALIASES: &[&str] = &["images", "imageUrls", "photos", "imageUrl", "image_url"];

/// A labeled optional field and the raw names it may appear under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryField {
    pub label: &'static str,
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub secondary: Vec<SecondaryField>,
}

const COMPANY: SecondaryField = SecondaryField {
    label: "company",
    aliases: &["company", "shop"],
};
const CONTACT: SecondaryField = SecondaryField {
    label: "contact",
    aliases: &["contact"],
};
const LINK: SecondaryField = SecondaryField {
    label: "link",
    aliases: &["link", "url"],
};

impl FieldMap {
    pub fn for_source(key: SourceKey) -> Self {
        let secondary = match key {
            SourceKey::Jobs => vec![COMPANY, CONTACT],
            SourceKey::Rent | SourceKey::Cv => vec![CONTACT],
            SourceKey::Forum => vec![],
            SourceKey::News => vec![LINK],
        };
        Self { secondary }
    }

    /// Map `raw` into the common shape. Fails only when there is no id to key on.
    pub fn normalize(
        &self,
        key: SourceKey,
        label: &str,
        raw: &RawRecord,
        owner: OwnerHints,
    ) -> Result<NormalizedRecord, RecordError> {
        let id = first_scalar(raw, &ID_ALIASES).ok_or(RecordError::MissingId)?;

        let created_at = CREATED_AT_ALIASES
            .iter()
            .filter_map(|a| raw.get(*a))
            .find_map(parse_timestamp)
            .unwrap_or_else(|| {
                tracing::debug!(source = %key, id = %id, "record has no usable createdAt");
                metrics::counter!("hub_missing_created_at_total").increment(1);
                epoch_zero()
            });

        let secondary_fields = self
            .secondary
            .iter()
            .filter_map(|f| first_scalar(raw, f.aliases).map(|v| (f.label.to_string(), v)))
            .collect::<BTreeMap<_, _>>();

        Ok(NormalizedRecord {
            id,
            source_key: key,
            source_label: label.to_string(),
            title: first_scalar(raw, TITLE_ALIASES).unwrap_or_default(),
            secondary_fields,
            body: first_scalar(raw, BODY_ALIASES).unwrap_or_default(),
            images: images(raw),
            created_at,
            owner_id: owner.id,
            owner_email: owner.email,
        })
    }
}

fn images(raw: &RawRecord) -> Vec<String> {
    let Some(v) = IMAGE_ALIASES
        .iter()
        .filter_map(|a| raw.get(*a))
        .find(|v| !v.is_null())
    else {
        return Vec::new();
    };
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
