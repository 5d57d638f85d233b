//! Drydock build-log store.
//!
//! Persistence layer for the CI build log: one immutable record per
//! built commit, keyed uniquely by commit hash. The uniqueness
//! invariant is enforced by a storage-level UNIQUE index, not by
//! application logic alone.
//!
//! ## Key components
//!
//! - [`BuildLog`]: async storage trait the orchestrator programs against
//! - [`SurrealBuildLog`]: SurrealDB-backed implementation (surrealkv on
//!   disk, in-memory engine for tests)
//! - [`fakes::MemoryBuildLog`]: dependency-free fake with the same
//!   uniqueness and id semantics

mod entry;
mod error;
pub mod fakes;
mod migrations;
mod schema;
mod store_traits;
mod surreal_store;

pub use entry::{today, BuildLogEntry, BUILD_DATE_FORMAT};
pub use error::StoreError;
pub use store_traits::{BuildLog, StoreResult};
pub use surreal_store::SurrealBuildLog;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
