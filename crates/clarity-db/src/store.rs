//! Persistence port used by the admin views

use crate::error::DbResult;
use crate::filter::{FilterCondition, ListQuery};
use crate::record::Record;
use crate::schema::ModelSchema;
use async_trait::async_trait;
use std::sync::Arc;

/// One write in an atomic batch
#[derive(Debug, Clone)]
pub enum WriteOp {
	/// Insert a row; a missing or null `id` is assigned by the store
	Insert {
		schema: Arc<ModelSchema>,
		values: Record,
	},
	/// Overwrite the given fields of an existing row
	Update {
		schema: Arc<ModelSchema>,
		pk: i64,
		values: Record,
	},
	/// Delete a row, applying the `on_delete` rule of every referencing key
	Delete { schema: Arc<ModelSchema>, pk: i64 },
}

impl WriteOp {
	pub fn schema(&self) -> &ModelSchema {
		match self {
			WriteOp::Insert { schema, .. }
			| WriteOp::Update { schema, .. }
			| WriteOp::Delete { schema, .. } => schema,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
	Inserted(i64),
	Updated(i64),
	Deleted(i64),
}

impl WriteOutcome {
	pub fn pk(&self) -> i64 {
		match self {
			WriteOutcome::Inserted(pk) | WriteOutcome::Updated(pk) | WriteOutcome::Deleted(pk) => *pk,
		}
	}
}

/// Storage backend for model records
///
/// Implementations must make [`atomic`](ModelStore::atomic) all-or-nothing:
/// when any operation fails none of the batch is visible afterwards.
#[async_trait]
pub trait ModelStore: Send + Sync {
	async fn list(&self, schema: &ModelSchema, query: &ListQuery) -> DbResult<Vec<Record>>;

	async fn count(
		&self,
		schema: &ModelSchema,
		condition: Option<&FilterCondition>,
	) -> DbResult<usize>;

	async fn get(&self, schema: &ModelSchema, pk: i64) -> DbResult<Option<Record>>;

	/// Apply `ops` in order inside one transaction
	async fn atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteOutcome>>;

	async fn insert(&self, schema: Arc<ModelSchema>, values: Record) -> DbResult<i64> {
		let outcomes = self.atomic(vec![WriteOp::Insert { schema, values }]).await?;
		Ok(outcomes.first().map(WriteOutcome::pk).unwrap_or_default())
	}

	async fn update(&self, schema: Arc<ModelSchema>, pk: i64, values: Record) -> DbResult<()> {
		self.atomic(vec![WriteOp::Update { schema, pk, values }])
			.await
			.map(|_| ())
	}

	async fn delete(&self, schema: Arc<ModelSchema>, pk: i64) -> DbResult<()> {
		self.atomic(vec![WriteOp::Delete { schema, pk }])
			.await
			.map(|_| ())
	}
}
