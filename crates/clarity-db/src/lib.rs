//! # clarity-db
//!
//! Runtime model schemas and the persistence port used by the admin.
//!
//! - [`schema`]: [`ModelSchema`], [`FieldDef`] and friends
//! - [`filter`]: backend neutral [`Filter`] / [`FilterCondition`] / [`ListQuery`]
//! - [`store`]: the [`ModelStore`] trait with all-or-nothing [`ModelStore::atomic`] batches
//! - [`memory`]: [`MemoryStore`], an in-process backend
//! - `sqlite` (feature `sqlite`): `SqliteStore` on top of `sqlx`

pub mod error;
pub mod filter;
pub mod memory;
pub mod record;
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;

pub use error::{DbError, DbResult};
pub use filter::{Filter, FilterCondition, FilterOperator, ListQuery, OrderBy};
pub use memory::MemoryStore;
pub use record::{PK_FIELD, Record};
pub use schema::{FieldDef, FieldKind, ModelKey, ModelSchema, OnDelete};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use store::{ModelStore, WriteOp, WriteOutcome};
