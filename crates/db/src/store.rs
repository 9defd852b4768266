//! Collection storage using Apache OpenDAL.
//!
//! Each collection is one pretty-printed JSON array at `<name>.json`. A
//! missing file reads as an empty collection. The backend (local directory,
//! process memory, S3-compatible bucket) comes from configuration.

use opendal::{ErrorKind, Operator, services};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use timebill_core::ledger::Collection;
use timebill_shared::config::StorageProvider;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be built.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend read or write failed.
    #[error("storage operation failed on {collection}: {source}")]
    Operation {
        /// Collection being accessed.
        collection: Collection,
        /// Underlying error.
        #[source]
        source: opendal::Error,
    },

    /// Stored JSON does not match the record type.
    #[error("collection {collection} is corrupt: {source}")]
    Corrupt {
        /// Collection being decoded.
        collection: Collection,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Reads and writes whole entity collections.
///
/// Cloning is cheap and clones share the same backend.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    operator: Operator,
}

impl CollectionStore {
    /// Builds a store for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StoreError> {
        let operator = match provider {
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StoreError::configuration("invalid storage root path"))?;
                Operator::new(services::Fs::default().root(root))
                    .map_err(|e| StoreError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StoreError::configuration(e.to_string()))?
                .finish(),
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder)
                    .map_err(|e| StoreError::configuration(e.to_string()))?
                    .finish()
            }
        };
        Ok(Self { operator })
    }

    /// A fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be initialized.
    pub fn memory() -> Result<Self, StoreError> {
        Self::from_provider(&StorageProvider::Memory)
    }

    /// Object path of a collection.
    #[must_use]
    pub fn path(collection: Collection) -> String {
        format!("{}.json", collection.name())
    }

    /// Loads every record of a collection. A missing collection is empty.
    ///
    /// # Errors
    ///
    /// `Operation` on backend failure, `Corrupt` on undecodable JSON.
    pub async fn load<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, StoreError> {
        let bytes = match self.operator.read(&Self::path(collection)).await {
            Ok(buffer) => buffer.to_vec(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Operation { collection, source }),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { collection, source })
    }

    /// Replaces a collection with `records`.
    ///
    /// # Errors
    ///
    /// `Operation` on backend failure.
    pub async fn save<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|source| StoreError::Corrupt { collection, source })?;
        self.operator
            .write(&Self::path(collection), bytes)
            .await
            .map(|_| ())
            .map_err(|source| StoreError::Operation { collection, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
        name: String,
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let store = CollectionStore::memory().unwrap();
        let rows: Vec<Row> = store.load(Collection::Clients).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = CollectionStore::memory().unwrap();
        let rows = vec![
            Row { id: 1, name: "Acme".into() },
            Row { id: 2, name: "Globex".into() },
        ];
        store.save(Collection::Clients, &rows).await.unwrap();

        let loaded: Vec<Row> = store.load(Collection::Clients).await.unwrap();
        assert_eq!(loaded, rows);

        // Clones share the backend.
        let other: Vec<Row> = store.clone().load(Collection::Clients).await.unwrap();
        assert_eq!(other.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_collection_reported() {
        let store = CollectionStore::memory().unwrap();
        store
            .operator
            .write("payments.json", b"{not json".to_vec())
            .await
            .unwrap();
        let result: Result<Vec<Row>, _> = store.load(Collection::Payments).await;
        assert!(matches!(
            result,
            Err(StoreError::Corrupt {
                collection: Collection::Payments,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_local_fs_writes_pretty_json() {
        let root = std::env::temp_dir().join(format!("timebill-store-{}", std::process::id()));
        let store = CollectionStore::from_provider(&StorageProvider::LocalFs { root: root.clone() })
            .unwrap();
        store
            .save(Collection::Categories, &[Row { id: 1, name: "General".into() }])
            .await
            .unwrap();

        let text = std::fs::read_to_string(root.join("categories.json")).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"General\""));
        let _ = std::fs::remove_dir_all(root);
    }
}
