// src/store/local.rs
//! Locally persisted key/value blob: one JSON file holding the array of
//! every record ever posted in a category, by any user.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::ContentStore;
use crate::error::StoreError;
use crate::identity::Identity;
use crate::ownership::OwnershipResolver;
use crate::record::{first_scalar, DeleteOutcome, RawRecord, ID_ALIASES};

pub struct LocalBlobStore {
    path: PathBuf,
    resolver: OwnershipResolver,
    write_lock: Mutex<()>,
}

impl LocalBlobStore {
    pub fn new(path: impl Into<PathBuf>, resolver: OwnershipResolver) -> Self {
        Self {
            path: path.into(),
            resolver,
            write_lock: Mutex::new(()),
        }
    }

    /// The blob exactly as stored, foreign and junk entries included.
    async fn read_entries(&self) -> Result<Vec<Value>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| StoreError::Decode(format!("{}: {e}", self.path.display())))?;
        let Value::Array(items) = parsed else {
            return Err(StoreError::Decode(format!(
                "{}: expected a JSON array",
                self.path.display()
            )));
        };
        Ok(items)
    }

    async fn write_entries(&self, entries: &[Value]) -> Result<(), StoreError> {
        let body = serde_json::to_vec(entries)
            .map_err(|e| StoreError::Decode(format!("serializing blob: {e}")))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalBlobStore {
    async fn list(&self, _owner: &Identity) -> Result<Vec<RawRecord>, StoreError> {
        // Non-object entries are junk from older writers: not listed, but
        // left in the blob untouched.
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect())
    }

    async fn delete(&self, id: &str, owner: &Identity) -> Result<DeleteOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;

        let Some((pos, record)) = entries.iter().enumerate().find_map(|(i, v)| {
            v.as_object()
                .filter(|r| first_scalar(r, &ID_ALIASES).as_deref() == Some(id))
                .map(|r| (i, r))
        }) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if !self.resolver.matches(record, owner) {
            return Ok(DeleteOutcome::Forbidden);
        }

        entries.remove(pos);
        self.write_entries(&entries).await?;
        Ok(DeleteOutcome::Deleted)
    }

    fn describe(&self) -> String {
        format!("local:{}", self.path.display())
    }
}
