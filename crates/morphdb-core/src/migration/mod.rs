//! Migration engine for MorphDB.
//!
//! This module carries a store from one schema version to the next:
//! - Mapping resolution: diff two snapshots into a complete operation set
//! - Plan validation: every entity claimed exactly once per side
//! - Two-phase execution: attributes first, relationships second
//! - All-or-nothing commit into a staged destination store
//!
//! # Example
//!
//! ```ignore
//! use morphdb_core::migration::{MappingResolver, MigrationEngine};
//!
//! // Diff the snapshots, with one hand-written operation for the rename
//! let plan = MappingResolver::resolve(from_snapshot, to_snapshot, vec![
//!     MappingOperation::transform(old_id, new_id, my_transformer),
//! ])?;
//!
//! // Preview what the plan will do
//! println!("{:?}", plan.summary());
//!
//! // Run it; the destination is only published if every record migrates
//! let engine = MigrationEngine::new();
//! let location = engine.execute(&plan, &source_store, &mut destination_store)?;
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod operation;
pub mod plan;
pub mod resolver;
pub mod table;

// Re-export main types

// Operation types
pub use operation::{
    AttributePairing, IdentityTransformer, MappingOperation, OperationKind, RecordTransformer,
};

// Error types
pub use error::{MappingError, MigrationError, TransformError};

// Plan types
pub use plan::{MigrationPlan, PlanSummary};

// Resolver types
pub use resolver::MappingResolver;

// Execution types
pub use context::TransformContext;
pub use engine::MigrationEngine;
pub use table::{AssociationEntry, AssociationTable};
