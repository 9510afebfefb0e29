use std::time::Duration;

use thiserror::Error;

use crate::record::SourceKey;

/// Transient failure talking to a backing store. Forbidden / not-found are
/// delete outcomes, not errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store payload: {0}")]
    Decode(String),
}

/// Failure scoped to one source adapter.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source {0} unavailable: {1}")]
    Unavailable(SourceKey, String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record has no id")]
    MissingId,
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("no signed-in user")]
    Unauthenticated,
    #[error("identity provider failed: {0:#}")]
    Identity(anyhow::Error),
}
