use crate::domain::ports::StateStore;
use crate::error::{Result, ShipmentError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the global state, keyed by address.
pub const CF_STATE: &str = "state";

/// A persistent state store backed by RocksDB.
///
/// Addresses are stored as their UTF-8 hex text, values as the raw state bytes.
/// Writes of one call go through a single `WriteBatch` so a committed batch of
/// transactions lands atomically.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStateStore {
    db: Arc<DB>,
}

impl RocksDBStateStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "state" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_state = ColumnFamilyDescriptor::new(CF_STATE, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_state])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn missing_cf() -> ShipmentError {
        ShipmentError::InternalError(Box::new(std::io::Error::other(
            "State column family not found",
        )))
    }
}

#[async_trait]
impl StateStore for RocksDBStateStore {
    async fn get(&self, address: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.db.cf_handle(CF_STATE).ok_or_else(Self::missing_cf)?;
        Ok(self.db.get_cf(&cf, address.as_bytes())?)
    }

    async fn put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let cf = self.db.cf_handle(CF_STATE).ok_or_else(Self::missing_cf)?;

        let mut batch = WriteBatch::default();
        for (address, value) in entries {
            batch.put_cf(&cf, address.as_bytes(), value);
        }
        self.db.write(batch)?;

        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let cf = self.db.cf_handle(CF_STATE).ok_or_else(Self::missing_cf)?;

        let mut entries = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (key, value) = item?;
            let address = String::from_utf8(key.to_vec()).map_err(|e| {
                ShipmentError::InternalError(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Address is not UTF-8: {}", e),
                )))
            })?;
            entries.push((address, value.to_vec()));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStateStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_STATE).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_state_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStateStore::open(dir.path()).unwrap();

        store
            .put(vec![
                ("bb".to_string(), b"two".to_vec()),
                ("aa".to_string(), b"one".to_vec()),
            ])
            .await
            .unwrap();

        assert_eq!(store.get("aa").await.unwrap(), Some(b"one".to_vec()));
        assert!(store.get("cc").await.unwrap().is_none());

        let all = store.entries().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "aa");
    }

    #[tokio::test]
    async fn test_rocksdb_reopen_keeps_state() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStateStore::open(dir.path()).unwrap();
            store
                .put(vec![("aa".to_string(), b"one".to_vec())])
                .await
                .unwrap();
        }
        let store = RocksDBStateStore::open(dir.path()).unwrap();
        assert_eq!(store.get("aa").await.unwrap(), Some(b"one".to_vec()));
    }
}
