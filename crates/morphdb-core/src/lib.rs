//! MorphDB Core - Mapping resolution, migration execution, and record stores.
//!
//! This crate provides the schema migration machinery for MorphDB.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod error;
pub mod history;
pub mod migration;
pub mod store;

pub use error::StoreError;
pub use history::SchemaHistory;
pub use migration::{
    AssociationEntry, AssociationTable, IdentityTransformer, MappingError, MappingOperation,
    MappingResolver, MigrationEngine, MigrationError, MigrationPlan, PlanSummary,
    RecordTransformer, TransformContext, TransformError,
};
pub use store::{
    DiskStore, MemoryStore, ReadableStore, StoreConfig, StoreLocation, WritableStore,
};

/// Re-export schema description types.
pub use morphdb_schema as schema;
