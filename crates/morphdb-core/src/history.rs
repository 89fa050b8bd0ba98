//! Versioned log of schema snapshots.

use crate::error::StoreError;
use morphdb_schema::SchemaSnapshot;
use sled::{Db, Tree};
use std::sync::atomic::{AtomicU64, Ordering};

/// Tree name for recorded snapshots.
const HISTORY_TREE: &str = "schema:history";

/// Tree name for history metadata.
const META_TREE: &str = "schema:meta";

/// Key for the newest recorded version in the meta tree.
const LATEST_VERSION_KEY: &[u8] = b"latest_version";

/// Append-only log of the schema versions a store has been through.
///
/// The history is a convenience for callers that want their snapshots
/// durable next to the data; the resolver and engine always take snapshots
/// as explicit parameters and never consult shared state.
pub struct SchemaHistory {
    /// Recorded snapshots, keyed by big-endian version.
    history_tree: Tree,
    /// Metadata tree.
    meta_tree: Tree,
    /// Newest recorded version (cached, 0 when empty).
    latest_version: AtomicU64,
}

impl SchemaHistory {
    /// Open or create a history using the given sled database.
    pub fn open(db: &Db) -> Result<Self, StoreError> {
        let history_tree = db.open_tree(HISTORY_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        let latest_version = match meta_tree.get(LATEST_VERSION_KEY)? {
            Some(bytes) => {
                if bytes.len() != 8 {
                    return Err(StoreError::InvalidKey);
                }
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                u64::from_be_bytes(buf)
            }
            None => 0,
        };

        Ok(Self {
            history_tree,
            meta_tree,
            latest_version: AtomicU64::new(latest_version),
        })
    }

    /// The newest recorded version, 0 when the history is empty.
    pub fn latest_version(&self) -> u64 {
        self.latest_version.load(Ordering::SeqCst)
    }

    /// Record a snapshot.
    ///
    /// The snapshot's declared version must exceed everything recorded so
    /// far. Returns the recorded version.
    pub fn record(&self, snapshot: &SchemaSnapshot) -> Result<u64, StoreError> {
        let latest = self.latest_version();
        if snapshot.version <= latest {
            return Err(StoreError::StaleSchema {
                version: snapshot.version,
                latest,
            });
        }

        let key = snapshot.version.to_be_bytes();
        let value = snapshot_to_bytes(snapshot)?;
        self.history_tree.insert(key, value)?;
        self.meta_tree.insert(LATEST_VERSION_KEY, &key)?;
        self.latest_version.store(snapshot.version, Ordering::SeqCst);

        Ok(snapshot.version)
    }

    /// Load the snapshot recorded under a specific version.
    pub fn snapshot_at(&self, version: u64) -> Result<Option<SchemaSnapshot>, StoreError> {
        let key = version.to_be_bytes();
        match self.history_tree.get(key)? {
            Some(bytes) => Ok(Some(snapshot_from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load the newest recorded snapshot.
    pub fn latest(&self) -> Result<Option<SchemaSnapshot>, StoreError> {
        match self.latest_version() {
            0 => Ok(None),
            version => self.snapshot_at(version),
        }
    }

    /// All recorded versions, ascending.
    pub fn versions(&self) -> Result<Vec<u64>, StoreError> {
        let mut versions = Vec::new();
        for result in self.history_tree.iter() {
            let (key, _) = result?;
            if key.len() != 8 {
                return Err(StoreError::InvalidKey);
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&key);
            versions.push(u64::from_be_bytes(buf));
        }
        versions.sort();
        Ok(versions)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.history_tree.flush()?;
        self.meta_tree.flush()?;
        Ok(())
    }
}

fn snapshot_to_bytes(snapshot: &SchemaSnapshot) -> Result<Vec<u8>, StoreError> {
    rkyv::to_bytes::<rkyv::rancor::Error>(snapshot)
        .map(|v| v.to_vec())
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn snapshot_from_bytes(bytes: &[u8]) -> Result<SchemaSnapshot, StoreError> {
    // Copy to an aligned buffer for rkyv; sled keeps small values inline
    // and returns them at arbitrary offsets.
    let mut aligned: rkyv::util::AlignedVec<16> = rkyv::util::AlignedVec::new();
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<SchemaSnapshot, rkyv::rancor::Error>(&aligned)
        .map_err(|e| StoreError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphdb_schema::{AttributeDef, AttributeType, EntityDesc, ScalarType};

    fn sample_snapshot(version: u64) -> SchemaSnapshot {
        let person = EntityDesc::new("Person")
            .with_identity("person")
            .with_attribute(AttributeDef::new(
                "name",
                AttributeType::scalar(ScalarType::String),
            ));
        SchemaSnapshot::new(version).with_entity(person)
    }

    fn test_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn test_history_open_empty() {
        let db = test_db();
        let history = SchemaHistory::open(&db).unwrap();

        assert_eq!(history.latest_version(), 0);
        assert!(history.latest().unwrap().is_none());
        assert!(history.versions().unwrap().is_empty());
    }

    #[test]
    fn test_record_and_reload() {
        let db = test_db();
        let history = SchemaHistory::open(&db).unwrap();

        let version = history.record(&sample_snapshot(1)).unwrap();
        assert_eq!(version, 1);

        let reloaded = history.snapshot_at(1).unwrap().unwrap();
        assert_eq!(reloaded, sample_snapshot(1));
        assert!(history.snapshot_at(2).unwrap().is_none());
    }

    #[test]
    fn test_minimal_snapshot_roundtrips() {
        // An entity-less snapshot archives below sled's inline-value
        // threshold, so its bytes come back at an unaligned offset.
        let db = test_db();
        let history = SchemaHistory::open(&db).unwrap();
        history.record(&SchemaSnapshot::new(1)).unwrap();

        let reloaded = history.snapshot_at(1).unwrap().unwrap();
        assert_eq!(reloaded.version, 1);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_stale_version_rejected() {
        let db = test_db();
        let history = SchemaHistory::open(&db).unwrap();
        history.record(&sample_snapshot(3)).unwrap();

        let err = history.record(&sample_snapshot(3)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleSchema {
                version: 3,
                latest: 3
            }
        ));
        assert!(history.record(&sample_snapshot(2)).is_err());
        assert!(history.record(&sample_snapshot(4)).is_ok());
    }

    #[test]
    fn test_versions_are_listed_ascending() {
        let db = test_db();
        let history = SchemaHistory::open(&db).unwrap();
        history.record(&sample_snapshot(1)).unwrap();
        history.record(&sample_snapshot(5)).unwrap();
        history.record(&sample_snapshot(12)).unwrap();

        assert_eq!(history.versions().unwrap(), vec![1, 5, 12]);
        assert_eq!(history.latest().unwrap().unwrap().version, 12);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());

        {
            let db = config.clone().open().unwrap();
            let history = SchemaHistory::open(&db).unwrap();
            history.record(&sample_snapshot(1)).unwrap();
            history.record(&sample_snapshot(2)).unwrap();
            history.flush().unwrap();
        }

        {
            let db = config.open().unwrap();
            let history = SchemaHistory::open(&db).unwrap();

            assert_eq!(history.latest_version(), 2);
            let snapshot = history.latest().unwrap().unwrap();
            assert_eq!(snapshot.version, 2);
            assert!(snapshot.entity_named("Person").is_some());
        }
    }
}
