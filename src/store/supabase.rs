//! Supabase Storage backend for the snapshot store.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{SnapshotStore, StoreError, StoredObject};

/// Supabase Storage client configuration.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseStore {
    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("SUPABASE_URL").map_err(|_| anyhow!("SUPABASE_URL not set"))?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| anyhow!("SUPABASE_SERVICE_ROLE_KEY not set"))?;
        let bucket =
            std::env::var("ROSTER_BUCKET").unwrap_or_else(|_| "hospital-roster-data".to_string());

        Ok(Self {
            client: Client::new(),
            base_url,
            service_role_key,
            bucket,
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
    }
}

/// Listing row returned by the Storage API. Folder placeholders carry no
/// metadata and list with zero size.
#[derive(Debug, Deserialize)]
struct ObjectRow {
    name: String,
    updated_at: Option<DateTime<Utc>>,
    metadata: Option<ObjectRowMetadata>,
}

#[derive(Debug, Deserialize)]
struct ObjectRowMetadata {
    size: Option<u64>,
}

#[async_trait::async_trait]
impl SnapshotStore for SupabaseStore {
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StoreError> {
        let prefix = prefix.trim_end_matches('/');
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let body = json!({
            "prefix": prefix,
            "limit": 1000,
            "sortBy": { "column": "name", "order": "asc" },
        });

        let list_err = |message: String| StoreError::List {
            prefix: prefix.to_string(),
            message,
        };

        let resp = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| list_err(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(list_err(format!("{} - {}", status, text)));
        }

        let rows: Vec<ObjectRow> = resp.json().await.map_err(|e| list_err(e.to_string()))?;
        debug!("listed {} objects under {}/", rows.len(), prefix);

        Ok(rows
            .into_iter()
            .map(|row| StoredObject {
                key: format!("{}/{}", prefix, row.name),
                size_bytes: row.metadata.and_then(|m| m.size).unwrap_or(0),
                last_modified: row.updated_at,
            })
            .collect())
    }

    async fn fetch_json(&self, key: &str) -> Result<Value, StoreError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);

        let retrieve_err = |message: String| StoreError::Retrieve {
            key: key.to_string(),
            message,
        };

        let resp = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| retrieve_err(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(retrieve_err(format!("{} - {}", status, text)));
        }

        let bytes = resp.bytes().await.map_err(|e| retrieve_err(e.to_string()))?;
        debug!("fetched {} ({} bytes)", key, bytes.len());

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}
