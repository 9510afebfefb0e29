// src/store/rest.rs
//! Table on the managed REST backend (PostgREST dialect).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::ContentStore;
use crate::error::StoreError;
use crate::identity::Identity;
use crate::record::{DeleteOutcome, RawRecord};

pub struct RestTableStore {
    client: Client,
    base_url: String,
    table: String,
    owner_column: String,
    id_column: String,
    api_key: String,
    bearer: Option<String>,
}

impl RestTableStore {
    pub fn new(
        base_url: impl Into<String>,
        table: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("content-hub/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
            owner_column: "user_id".to_string(),
            id_column: "id".to_string(),
            api_key: api_key.into(),
            bearer: None,
        })
    }

    pub fn with_owner_column(mut self, column: impl Into<String>) -> Self {
        self.owner_column = column.into();
        self
    }

    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Session token; without one the api key doubles as the bearer.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.bearer.as_deref().unwrap_or(&self.api_key);
        req.header("apikey", &self.api_key).bearer_auth(bearer)
    }
}

async fn status_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Status { status, body }
}

#[async_trait]
impl ContentStore for RestTableStore {
    async fn list(&self, owner: &Identity) -> Result<Vec<RawRecord>, StoreError> {
        let owner_filter = format!("eq.{}", owner.id);
        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&[("select", "*"), (self.owner_column.as_str(), owner_filter.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let rows: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{}: {e}", self.table)))?;
        Ok(rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect())
    }

    async fn delete(&self, id: &str, owner: &Identity) -> Result<DeleteOutcome, StoreError> {
        let id_filter = format!("eq.{id}");
        let owner_filter = format!("eq.{}", owner.id);
        let resp = self
            .authed(self.client.delete(self.table_url()))
            .header("Prefer", "return=representation")
            .query(&[
                (self.id_column.as_str(), id_filter.as_str()),
                (self.owner_column.as_str(), owner_filter.as_str()),
            ])
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(DeleteOutcome::Forbidden),
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            s if s.is_success() => {
                // Row-level security hides rows the caller doesn't own, so an
                // empty representation only tells us nothing was removed.
                // Anything that isn't a representation confirms nothing.
                let removed: Vec<Value> = resp.json().await.map_err(|e| {
                    StoreError::Decode(format!(
                        "delete on {}: unreadable representation: {e}",
                        self.table
                    ))
                })?;
                if removed.is_empty() {
                    Ok(DeleteOutcome::NotFound)
                } else {
                    Ok(DeleteOutcome::Deleted)
                }
            }
            _ => Err(status_error(resp).await),
        }
    }

    fn describe(&self) -> String {
        format!("rest:{}", self.table)
    }
}
