//! Disk-backed record store with staged atomic commit.

use super::{current_timestamp, ReadableStore, StoreConfig, StoreLocation, WritableStore};
use crate::error::StoreError;
use morphdb_schema::{EntityId, FieldValue, InstanceId};
use rkyv::{Archive, Deserialize, Serialize};
use sled::{Db, Tree};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tree name for instance records.
const RECORD_TREE: &str = "records";

/// Tree name for the entity membership index.
const ENTITY_INDEX_TREE: &str = "index:entity";

/// One instance's stored state.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
struct StoredRecord {
    /// Attribute values by name.
    attributes: Vec<(String, FieldValue)>,
    /// Relationship target lists by name, in stored order.
    relationships: Vec<(String, Vec<InstanceId>)>,
}

impl StoredRecord {
    fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        // Copy to an aligned buffer for rkyv; sled keeps small values inline
        // and returns them at arbitrary offsets.
        let mut aligned: rkyv::util::AlignedVec<16> = rkyv::util::AlignedVec::new();
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn set_attribute(&mut self, name: &str, value: FieldValue) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    fn relationship(&self, name: &str) -> Option<&[InstanceId]> {
        self.relationships
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, targets)| targets.as_slice())
    }

    fn set_relationship(&mut self, name: &str, targets: &[InstanceId]) {
        match self.relationships.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = targets.to_vec(),
            None => self
                .relationships
                .push((name.to_string(), targets.to_vec())),
        }
    }
}

struct Handle {
    db: Db,
    records: Tree,
    entity_index: Tree,
}

impl Handle {
    fn open(config: &StoreConfig, path: &Path) -> Result<Self, StoreError> {
        let db = config.to_sled_config(path).open()?;
        let records = db.open_tree(RECORD_TREE)?;
        let entity_index = db.open_tree(ENTITY_INDEX_TREE)?;
        Ok(Self {
            db,
            records,
            entity_index,
        })
    }
}

enum Role {
    /// Opened over an existing live store; reads only.
    Source,
    /// Building the next store in a staging directory beside the live one.
    Staging {
        live: PathBuf,
        staging: PathBuf,
    },
}

/// A sled-backed record store.
///
/// A store opened with [`open`](Self::open) serves reads against existing
/// data and rejects writes. A store created with [`stage`](Self::stage)
/// accumulates writes in a `<live>.staging` directory; [`commit`] retires the
/// previous live directory and moves the staging directory into its place, so
/// a crash anywhere before the swap leaves the live store untouched.
///
/// [`commit`]: WritableStore::commit
pub struct DiskStore {
    handle: Option<Handle>,
    role: Role,
    next_seq: u64,
}

impl DiskStore {
    /// Open an existing store for reading.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let path = config.path.clone();
        let handle = Handle::open(&config, &path)?;
        Ok(Self {
            handle: Some(handle),
            role: Role::Source,
            next_seq: 0,
        })
    }

    /// Create a writable store staged beside the live path in `config.path`.
    ///
    /// The staging directory is `<live>.staging`. A leftover staging
    /// directory from an interrupted earlier run is removed first.
    pub fn stage(config: StoreConfig) -> Result<Self, StoreError> {
        let live = config.path.clone();
        let staging = suffixed_path(&live, ".staging");

        if staging.exists() {
            debug!(path = %staging.display(), "removing orphaned staging directory");
            fs::remove_dir_all(&staging)?;
        }

        let handle = Handle::open(&config, &staging)?;
        Ok(Self {
            handle: Some(handle),
            role: Role::Staging { live, staging },
            next_seq: 0,
        })
    }

    fn handle(&self) -> Result<&Handle, StoreError> {
        self.handle.as_ref().ok_or(StoreError::Closed)
    }

    fn writable_handle(&mut self) -> Result<&Handle, StoreError> {
        if matches!(self.role, Role::Source) {
            return Err(StoreError::ReadOnly);
        }
        self.handle.as_ref().ok_or(StoreError::Closed)
    }

    fn load_record(&self, instance: InstanceId) -> Result<StoredRecord, StoreError> {
        let handle = self.handle()?;
        match handle.records.get(instance.as_bytes())? {
            Some(bytes) => StoredRecord::from_bytes(&bytes),
            None => Err(StoreError::UnknownInstance { instance }),
        }
    }

    fn save_record(&self, instance: InstanceId, record: &StoredRecord) -> Result<(), StoreError> {
        let handle = self.handle()?;
        handle
            .records
            .insert(instance.as_bytes(), record.to_bytes()?)?;
        Ok(())
    }
}

impl ReadableStore for DiskStore {
    fn instances(&self, entity: EntityId) -> Result<Vec<InstanceId>, StoreError> {
        let handle = self.handle()?;
        let mut out = Vec::new();
        for item in handle.entity_index.scan_prefix(entity.as_bytes()) {
            let (key, _) = item?;
            if key.len() != 32 {
                return Err(StoreError::InvalidKey);
            }
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(&key[16..]);
            out.push(InstanceId::from_bytes(bytes));
        }
        Ok(out)
    }

    fn read_attribute(
        &self,
        instance: InstanceId,
        attribute: &str,
    ) -> Result<FieldValue, StoreError> {
        let record = self.load_record(instance)?;
        Ok(record.attribute(attribute).cloned().unwrap_or(FieldValue::Null))
    }

    fn read_relationship(
        &self,
        instance: InstanceId,
        relationship: &str,
    ) -> Result<Vec<InstanceId>, StoreError> {
        let record = self.load_record(instance)?;
        Ok(record
            .relationship(relationship)
            .map(|t| t.to_vec())
            .unwrap_or_default())
    }
}

impl WritableStore for DiskStore {
    fn create_instance(&mut self, entity: EntityId) -> Result<InstanceId, StoreError> {
        self.writable_handle()?;
        self.next_seq += 1;
        let instance = InstanceId::from_sequence(self.next_seq);

        self.save_record(instance, &StoredRecord::default())?;

        let handle = self.handle()?;
        let mut index_key = [0u8; 32];
        index_key[..16].copy_from_slice(entity.as_bytes());
        index_key[16..].copy_from_slice(instance.as_bytes());
        handle.entity_index.insert(&index_key, &[])?;

        Ok(instance)
    }

    fn write_attribute(
        &mut self,
        instance: InstanceId,
        attribute: &str,
        value: FieldValue,
    ) -> Result<(), StoreError> {
        self.writable_handle()?;
        let mut record = self.load_record(instance)?;
        record.set_attribute(attribute, value);
        self.save_record(instance, &record)
    }

    fn write_relationship(
        &mut self,
        instance: InstanceId,
        relationship: &str,
        targets: &[InstanceId],
    ) -> Result<(), StoreError> {
        self.writable_handle()?;
        let mut record = self.load_record(instance)?;
        record.set_relationship(relationship, targets);
        self.save_record(instance, &record)
    }

    fn commit(&mut self) -> Result<StoreLocation, StoreError> {
        let (live, staging) = match &self.role {
            Role::Staging { live, staging } => (live.clone(), staging.clone()),
            Role::Source => return Err(StoreError::ReadOnly),
        };
        let handle = self.handle.take().ok_or(StoreError::Closed)?;

        handle.db.flush()?;
        drop(handle);

        // Swap order: retire live first, then promote staging into its place.
        if live.exists() {
            let retired = suffixed_path(&live, &format!(".old-{}", current_timestamp()));
            fs::rename(&live, &retired)?;
            if let Err(e) = fs::rename(&staging, &live) {
                // Put the previous store back so the live path stays valid.
                if let Err(restore) = fs::rename(&retired, &live) {
                    warn!(error = %restore, "failed to restore previous store after aborted swap");
                }
                return Err(StoreError::Commit {
                    reason: e.to_string(),
                });
            }
            if let Err(e) = fs::remove_dir_all(&retired) {
                warn!(path = %retired.display(), error = %e, "failed to remove retired store");
            }
        } else {
            fs::rename(&staging, &live)?;
        }

        debug!(path = %live.display(), "store committed");
        Ok(StoreLocation::Path(live))
    }

    fn discard(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);
        }
        if let Role::Staging { staging, .. } = &self.role {
            if staging.exists() {
                if let Err(e) = fs::remove_dir_all(staging) {
                    warn!(path = %staging.display(), error = %e, "failed to remove staging directory");
                }
            }
        }
    }
}

/// Append a suffix to a path's final component.
fn suffixed_path(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
