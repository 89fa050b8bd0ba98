//! Core error types.

use morphdb_schema::InstanceId;
use thiserror::Error;

/// Errors raised by record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Backend(#[from] sled::Error),

    /// Filesystem error while staging or swapping a store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// The store holds no record under this handle.
    #[error("unknown instance {instance}")]
    UnknownInstance {
        /// The handle that resolved to nothing.
        instance: InstanceId,
    },

    /// Write attempted on a store opened for reading.
    #[error("store is read-only")]
    ReadOnly,

    /// Operation attempted after the store was committed or discarded.
    #[error("store is closed")]
    Closed,

    /// The commit swap could not complete.
    #[error("commit failed: {reason}")]
    Commit {
        /// What went wrong during the swap.
        reason: String,
    },

    /// A snapshot recorded into the history does not advance it.
    #[error("schema version {version} does not advance the history (latest is {latest})")]
    StaleSchema {
        /// The rejected snapshot version.
        version: u64,
        /// The newest version already recorded.
        latest: u64,
    },
}
