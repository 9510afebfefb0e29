// src/source/mod.rs
pub mod adapter;
pub mod fields;

use async_trait::async_trait;

use crate::error::{RecordError, SourceError};
use crate::identity::Identity;
use crate::ownership::OwnerHints;
use crate::record::{DeleteOutcome, NormalizedRecord, RawRecord, SourceKey};

pub use adapter::StoreAdapter;
pub use fields::FieldMap;

/// One content category's view of its backing store.
///
/// Expected conditions (nothing stored, record already gone) are never errors.
/// `Err` is reserved for adapter-level failure, which degrades this source
/// only.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn key(&self) -> SourceKey;

    fn label(&self) -> &str;

    async fn fetch_all(&self, identity: &Identity) -> Result<Vec<RawRecord>, SourceError>;

    async fn delete_one(&self, id: &str, identity: &Identity)
        -> Result<DeleteOutcome, SourceError>;

    /// Pure mapping into the common shape; ownership has already been decided.
    fn normalize(&self, raw: &RawRecord, owner: OwnerHints)
        -> Result<NormalizedRecord, RecordError>;
}
