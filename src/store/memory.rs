// src/store/memory.rs
//! In-process store for tests and demos, with call counters and fault injection.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::ContentStore;
use crate::error::StoreError;
use crate::identity::Identity;
use crate::ownership::OwnershipResolver;
use crate::record::{first_scalar, DeleteOutcome, RawRecord, ID_ALIASES};

pub struct MemoryStore {
    records: Mutex<Vec<RawRecord>>,
    resolver: OwnershipResolver,
    fail_list: Option<String>,
    forced_delete: Option<DeleteOutcome>,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            resolver: OwnershipResolver::default(),
            fail_list: None,
            forced_delete: None,
            list_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Build from JSON objects; anything that isn't an object is skipped.
    pub fn from_json(values: Vec<serde_json::Value>) -> Self {
        Self::new(
            values
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::Object(m) => Some(m),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Every `list` call fails with this message.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_list = Some(reason.into());
        self
    }

    /// Every `delete` call reports `outcome` without touching the records.
    pub fn with_delete_outcome(mut self, outcome: DeleteOutcome) -> Self {
        self.forced_delete = Some(outcome);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(&self, _owner: &Identity) -> Result<Vec<RawRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail_list {
            return Err(StoreError::Status {
                status: 503,
                body: reason.clone(),
            });
        }
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn delete(&self, id: &str, owner: &Identity) -> Result<DeleteOutcome, StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(outcome) = self.forced_delete {
            return Ok(outcome);
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pos) = records
            .iter()
            .position(|r| first_scalar(r, &ID_ALIASES).as_deref() == Some(id))
        else {
            return Ok(DeleteOutcome::NotFound);
        };
        if !self.resolver.matches(&records[pos], owner) {
            return Ok(DeleteOutcome::Forbidden);
        }
        records.remove(pos);
        Ok(DeleteOutcome::Deleted)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
