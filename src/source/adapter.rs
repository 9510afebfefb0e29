// src/source/adapter.rs
use async_trait::async_trait;
use std::sync::Arc;

use super::{FieldMap, SourceAdapter};
use crate::error::{RecordError, SourceError};
use crate::identity::Identity;
use crate::ownership::OwnerHints;
use crate::record::{DeleteOutcome, NormalizedRecord, RawRecord, SourceKey};
use crate::store::ContentStore;

/// Source adapter over any `ContentStore`.
///
/// A missing store handle is a configuration fault: both operations report
/// `SourceError::Unavailable` for this source and nothing else.
pub struct StoreAdapter {
    key: SourceKey,
    label: String,
    store: Option<Arc<dyn ContentStore>>,
    fields: FieldMap,
}

impl StoreAdapter {
    pub fn new(key: SourceKey, store: Arc<dyn ContentStore>) -> Self {
        Self {
            key,
            label: key.default_label().to_string(),
            store: Some(store),
            fields: FieldMap::for_source(key),
        }
    }

    /// Registered, but with nothing behind it.
    pub fn unconfigured(key: SourceKey) -> Self {
        Self {
            key,
            label: key.default_label().to_string(),
            store: None,
            fields: FieldMap::for_source(key),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    fn store(&self) -> Result<&Arc<dyn ContentStore>, SourceError> {
        self.store
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable(self.key, "no backing store configured".into()))
    }
}

#[async_trait]
impl SourceAdapter for StoreAdapter {
    fn key(&self) -> SourceKey {
        self.key
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch_all(&self, identity: &Identity) -> Result<Vec<RawRecord>, SourceError> {
        let store = self.store()?;
        Ok(store.list(identity).await?)
    }

    async fn delete_one(
        &self,
        id: &str,
        identity: &Identity,
    ) -> Result<DeleteOutcome, SourceError> {
        let store = self.store()?;
        match store.delete(id, identity).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source = %self.key,
                    store = %store.describe(),
                    id,
                    "store delete failed"
                );
                Ok(DeleteOutcome::TransientFailure)
            }
        }
    }

    fn normalize(
        &self,
        raw: &RawRecord,
        owner: OwnerHints,
    ) -> Result<NormalizedRecord, RecordError> {
        self.fields.normalize(self.key, &self.label, raw, owner)
    }
}
