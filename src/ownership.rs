//! # Ownership Resolver
//!
//! Decides whether a raw record belongs to the current identity.
//!
//! Sources have used different field names for the owner over time
//! (`userId`, `user_id`, `ownerId`, ...). Instead of per-source branches the
//! resolver holds one ordered alias list per field class:
//!
//! - id class: the first alias present on the record supplies the owner id.
//! - email class: the first alias present supplies the owner email.
//!
//! A record matches when the owner id equals the identity id, or the owner
//! email equals the identity email. Comparison is exact and case-sensitive.
//! A record with no value under any alias never matches.

use serde::Deserialize;

use crate::identity::Identity;
use crate::record::{first_scalar, RawRecord};

/// Ownership values found on a raw record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerHints {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl OwnerHints {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnershipResolver {
    #[serde(default = "default_id_aliases")]
    pub id_aliases: Vec<String>,
    #[serde(default = "default_email_aliases")]
    pub email_aliases: Vec<String>,
}

fn default_id_aliases() -> Vec<String> {
    ["userId", "user_id", "ownerId", "owner_id", "uid"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_email_aliases() -> Vec<String> {
    ["userEmail", "user_email", "ownerEmail", "owner_email", "email"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for OwnershipResolver {
    fn default() -> Self {
        Self {
            id_aliases: default_id_aliases(),
            email_aliases: default_email_aliases(),
        }
    }
}

impl OwnershipResolver {
    pub fn new(id_aliases: Vec<String>, email_aliases: Vec<String>) -> Self {
        Self {
            id_aliases,
            email_aliases,
        }
    }

    /// Owner id/email as recorded on `raw`, first present alias per class.
    pub fn hints(&self, raw: &RawRecord) -> OwnerHints {
        OwnerHints {
            id: first_scalar(raw, &self.id_aliases),
            email: first_scalar(raw, &self.email_aliases),
        }
    }

    pub fn hints_match(hints: &OwnerHints, identity: &Identity) -> bool {
        let by_id = hints.id.as_deref() == Some(identity.id.as_str());
        let by_email = match (&hints.email, &identity.email) {
            (Some(h), Some(e)) => h == e,
            _ => false,
        };
        by_id || by_email
    }

    pub fn matches(&self, raw: &RawRecord, identity: &Identity) -> bool {
        Self::hints_match(&self.hints(raw), identity)
    }
}
