//! Object-store access for roster snapshots and nurse profiles.
//!
//! Defines the [`SnapshotStore`] trait so storage backends can be swapped
//! behind the same seam, plus the batch fetch helpers that implement the
//! partial-failure policy: one file's retrieval or parse failure is
//! reported and omitted, never allowed to abort the batch.

pub mod supabase;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::schema::NurseProfile;

/// Listing entry for one stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One successfully fetched and parsed snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub content: Value,
}

/// Store failure taxonomy: listing, per-object retrieval, and per-object
/// JSON parsing are distinct conditions with distinct handling upstream.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("listing objects under '{prefix}' failed: {message}")]
    List { prefix: String, message: String },
    #[error("retrieving '{key}' failed: {message}")]
    Retrieve { key: String, message: String },
    #[error("'{key}' is not valid JSON: {message}")]
    Parse { key: String, message: String },
}

/// Async storage backend implemented by each object-store client.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// List objects under a key prefix, in the store's discovery order.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StoreError>;

    /// Retrieve one object and parse it as JSON.
    async fn fetch_json(&self, key: &str) -> Result<Value, StoreError>;
}

/// List and fetch every usable snapshot under `prefix`.
///
/// Only `.json` objects with content are considered (folder placeholders
/// list with zero size). Objects that fail to retrieve or parse are
/// logged and omitted so the aggregation engine only ever sees
/// successfully parsed documents.
pub async fn fetch_snapshots(
    store: &dyn SnapshotStore,
    prefix: &str,
) -> Result<Vec<SnapshotFile>, StoreError> {
    let listed = store.list(prefix).await?;
    info!(
        "found {} objects under {}/",
        listed.len(),
        prefix.trim_end_matches('/')
    );

    let mut files = Vec::new();
    for object in listed {
        if !object.key.ends_with(".json") || object.size_bytes == 0 {
            continue;
        }
        match store.fetch_json(&object.key).await {
            Ok(content) => files.push(SnapshotFile {
                key: object.key,
                size_bytes: object.size_bytes,
                last_modified: object.last_modified,
                content,
            }),
            Err(err) => warn!("skipping snapshot: {}", err),
        }
    }

    info!("fetched {} snapshot files from {}/", files.len(), prefix.trim_end_matches('/'));
    Ok(files)
}

/// Fetch the flat nurse-profile document and decode its rows leniently.
pub async fn fetch_profiles(
    store: &dyn SnapshotStore,
    key: &str,
) -> Result<Vec<NurseProfile>, StoreError> {
    let document = store.fetch_json(key).await?;
    let Some(rows) = document.as_array() else {
        return Err(StoreError::Parse {
            key: key.to_string(),
            message: "expected a top-level array of nurse profiles".to_string(),
        });
    };

    let mut profiles = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<NurseProfile>(row.clone()) {
            Ok(profile) => profiles.push(profile),
            Err(err) => warn!("skipping malformed nurse profile: {}", err),
        }
    }

    info!("loaded {} nurse profiles from {}", profiles.len(), key);
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    /// In-memory store where some keys fail on purpose.
    struct MemStore {
        objects: Vec<StoredObject>,
        payloads: HashMap<String, Value>,
    }

    #[async_trait::async_trait]
    impl SnapshotStore for MemStore {
        async fn list(&self, _prefix: &str) -> Result<Vec<StoredObject>, StoreError> {
            Ok(self.objects.clone())
        }

        async fn fetch_json(&self, key: &str) -> Result<Value, StoreError> {
            self.payloads
                .get(key)
                .cloned()
                .ok_or_else(|| StoreError::Retrieve {
                    key: key.to_string(),
                    message: "object missing".to_string(),
                })
        }
    }

    fn object(key: &str, size: u64) -> StoredObject {
        StoredObject {
            key: key.to_string(),
            size_bytes: size,
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_snapshots_partial_failure() {
        let store = MemStore {
            objects: vec![
                object("roster_history/roster_01092025.json", 64),
                object("roster_history/", 0),
                object("roster_history/notes.txt", 12),
                object("roster_history/missing.json", 64),
            ],
            payloads: HashMap::from([(
                "roster_history/roster_01092025.json".to_string(),
                json!({"departments": []}),
            )]),
        };

        let files = fetch_snapshots(&store, "roster_history/").await.unwrap();
        // The folder placeholder, the non-JSON object, and the failing
        // fetch are all omitted; the batch itself still succeeds.
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].key, "roster_history/roster_01092025.json");
    }

    #[tokio::test]
    async fn test_fetch_profiles_skips_bad_rows() {
        let store = MemStore {
            objects: vec![],
            payloads: HashMap::from([(
                "raw_data/nurse_data/nurse.json".to_string(),
                json!([
                    {"nurse_id": "N1", "name": "Alice", "skills": [], "experience_years": 3, "seniority_level": "mid"},
                    {"name": "broken row"},
                ]),
            )]),
        };

        let profiles = fetch_profiles(&store, "raw_data/nurse_data/nurse.json")
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, "N1");
    }

    #[tokio::test]
    async fn test_fetch_profiles_rejects_non_array() {
        let store = MemStore {
            objects: vec![],
            payloads: HashMap::from([("nurse.json".to_string(), json!({"count": 0}))]),
        };

        let err = fetch_profiles(&store, "nurse.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
