//! In-process store
//!
//! Rows live in per-model tables behind a `parking_lot::RwLock`. An atomic
//! batch is applied to a copy of the tables, which replaces the live tables
//! only once every operation succeeded.

use crate::error::{DbError, DbResult};
use crate::filter::{FilterCondition, ListQuery, compare_values, values_equal};
use crate::record::{PK_FIELD, Record};
use crate::schema::{FieldKind, ModelKey, ModelSchema, OnDelete};
use crate::store::{ModelStore, WriteOp, WriteOutcome};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Table {
	last_id: i64,
	rows: BTreeMap<i64, Record>,
}

type Tables = HashMap<ModelKey, Table>;

#[derive(Debug, Default)]
pub struct MemoryStore {
	schemas: RwLock<HashMap<ModelKey, Arc<ModelSchema>>>,
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make a model known to the store, creating its empty table
	///
	/// Registering a model again replaces its schema and keeps its rows.
	pub fn register(&self, schema: Arc<ModelSchema>) -> DbResult<()> {
		schema.validate()?;
		self.tables.write().entry(schema.key.clone()).or_default();
		self.schemas.write().insert(schema.key.clone(), schema);
		Ok(())
	}

	/// Build a store with every schema of `schemas` registered
	pub fn with_models(schemas: impl IntoIterator<Item = Arc<ModelSchema>>) -> DbResult<Self> {
		let store = Self::new();
		for schema in schemas {
			store.register(schema)?;
		}
		Ok(store)
	}

	fn check_fields(schema: &ModelSchema, condition: Option<&FilterCondition>) -> DbResult<()> {
		if let Some(condition) = condition {
			for field in condition.fields() {
				schema.field_or_err(field)?;
			}
		}
		Ok(())
	}

	fn filtered(
		&self,
		schema: &ModelSchema,
		condition: Option<&FilterCondition>,
	) -> DbResult<Vec<Record>> {
		Self::check_fields(schema, condition)?;
		let tables = self.tables.read();
		let table = tables
			.get(&schema.key)
			.ok_or_else(|| DbError::UnknownModel(schema.key.to_string()))?;
		Ok(table
			.rows
			.values()
			.filter(|row| condition.is_none_or(|c| c.matches(row)))
			.cloned()
			.collect())
	}

	fn apply(&self, ops: &[WriteOp]) -> DbResult<Vec<WriteOutcome>> {
		let schemas = self.schemas.read().clone();
		let mut tables = self.tables.write();
		let mut batch = Batch {
			schemas: &schemas,
			tables: tables.clone(),
		};

		let mut outcomes = Vec::with_capacity(ops.len());
		for op in ops {
			let outcome = match op {
				WriteOp::Insert { schema, values } => batch.insert(schema, values)?,
				WriteOp::Update { schema, pk, values } => batch.update(schema, *pk, values)?,
				WriteOp::Delete { schema, pk } => batch.delete(schema, *pk)?,
			};
			outcomes.push(outcome);
		}

		*tables = batch.tables;
		Ok(outcomes)
	}
}

/// Staged copy of the tables for one atomic batch
struct Batch<'a> {
	schemas: &'a HashMap<ModelKey, Arc<ModelSchema>>,
	tables: Tables,
}

impl Batch<'_> {
	fn table_mut(&mut self, key: &ModelKey) -> DbResult<&mut Table> {
		self.tables
			.get_mut(key)
			.ok_or_else(|| DbError::UnknownModel(key.to_string()))
	}

	fn insert(&mut self, schema: &ModelSchema, values: &Record) -> DbResult<WriteOutcome> {
		for field in values.keys() {
			schema.field_or_err(field)?;
		}

		let table = self.table_mut(&schema.key)?;
		let pk = match values.get(PK_FIELD) {
			None | Some(Value::Null) => table.last_id + 1,
			Some(value) => value.as_i64().ok_or_else(|| {
				DbError::Constraint(format!("datatype mismatch: {}.{PK_FIELD}", schema.table_name()))
			})?,
		};
		if table.rows.contains_key(&pk) {
			return Err(DbError::Constraint(format!(
				"UNIQUE constraint failed: {}.{PK_FIELD}",
				schema.table_name()
			)));
		}

		let mut row = Record::new();
		for field in &schema.fields {
			let value = if field.is_primary_key() {
				Value::from(pk)
			} else {
				values
					.get(&field.name)
					.cloned()
					.or_else(|| field.default.clone())
					.unwrap_or(Value::Null)
			};
			row.set(field.name.clone(), value);
		}
		self.check_row(schema, &row, pk)?;

		let table = self.table_mut(&schema.key)?;
		table.last_id = table.last_id.max(pk);
		table.rows.insert(pk, row);
		Ok(WriteOutcome::Inserted(pk))
	}

	fn update(&mut self, schema: &ModelSchema, pk: i64, values: &Record) -> DbResult<WriteOutcome> {
		for field in values.keys() {
			schema.field_or_err(field)?;
		}
		let mut row = self
			.table_mut(&schema.key)?
			.rows
			.get(&pk)
			.cloned()
			.ok_or_else(|| DbError::NotFound {
				model: schema.key.to_string(),
				pk,
			})?;

		let mut changes = values.clone();
		changes.remove(PK_FIELD);
		row.merge(&changes);
		self.check_row(schema, &row, pk)?;

		self.table_mut(&schema.key)?.rows.insert(pk, row);
		Ok(WriteOutcome::Updated(pk))
	}

	fn delete(&mut self, schema: &ModelSchema, pk: i64) -> DbResult<WriteOutcome> {
		if !self.table_mut(&schema.key)?.rows.contains_key(&pk) {
			return Err(DbError::NotFound {
				model: schema.key.to_string(),
				pk,
			});
		}
		self.delete_cascading(&schema.key, pk)?;
		Ok(WriteOutcome::Deleted(pk))
	}

	fn delete_cascading(&mut self, key: &ModelKey, pk: i64) -> DbResult<()> {
		if self.table_mut(key)?.rows.remove(&pk).is_none() {
			return Ok(());
		}

		let schemas: Vec<Arc<ModelSchema>> = self.schemas.values().cloned().collect();
		for referencing in schemas {
			for field in referencing.foreign_keys_to(key) {
				let FieldKind::ForeignKey { on_delete, .. } = &field.kind else {
					continue;
				};
				let target = Value::from(pk);
				let dependents: Vec<i64> = self
					.table_mut(&referencing.key)?
					.rows
					.iter()
					.filter(|(_, row)| row.get(&field.name).is_some_and(|v| values_equal(v, &target)))
					.map(|(dependent, _)| *dependent)
					.collect();
				if dependents.is_empty() {
					continue;
				}

				match on_delete {
					OnDelete::Protect => {
						return Err(DbError::Constraint(format!(
							"cannot delete {key} {pk}: referenced through protected foreign key {}.{}",
							referencing.key, field.name
						)));
					}
					OnDelete::Cascade => {
						for dependent in dependents {
							self.delete_cascading(&referencing.key, dependent)?;
						}
					}
					OnDelete::SetNull => {
						if !field.null {
							return Err(DbError::Constraint(format!(
								"NOT NULL constraint failed: {}.{}",
								referencing.table_name(),
								field.name
							)));
						}
						let table = self.table_mut(&referencing.key)?;
						for dependent in dependents {
							if let Some(row) = table.rows.get_mut(&dependent) {
								row.set(field.name.clone(), Value::Null);
							}
						}
					}
				}
			}
		}
		Ok(())
	}

	/// NOT NULL, UNIQUE and FOREIGN KEY checks for a row about to be stored
	fn check_row(&mut self, schema: &ModelSchema, row: &Record, pk: i64) -> DbResult<()> {
		let table_name = schema.table_name();
		for field in schema.fields.iter().filter(|f| !f.is_primary_key()) {
			let value = row.get(&field.name).unwrap_or(&Value::Null);
			if value.is_null() {
				if !field.null {
					return Err(DbError::Constraint(format!(
						"NOT NULL constraint failed: {table_name}.{}",
						field.name
					)));
				}
				continue;
			}

			if field.unique {
				let clash = self.table_mut(&schema.key)?.rows.iter().any(|(other, existing)| {
					*other != pk
						&& existing
							.get(&field.name)
							.is_some_and(|v| values_equal(v, value))
				});
				if clash {
					return Err(DbError::Constraint(format!(
						"UNIQUE constraint failed: {table_name}.{}",
						field.name
					)));
				}
			}

			if let FieldKind::ForeignKey { to, .. } = &field.kind {
				let exists = match value.as_i64() {
					Some(target) => self.table_mut(to)?.rows.contains_key(&target),
					None => false,
				};
				if !exists {
					return Err(DbError::Constraint(format!(
						"FOREIGN KEY constraint failed: {table_name}.{} -> {to}",
						field.name
					)));
				}
			}
		}
		Ok(())
	}
}

#[async_trait]
impl ModelStore for MemoryStore {
	async fn list(&self, schema: &ModelSchema, query: &ListQuery) -> DbResult<Vec<Record>> {
		for order in &query.ordering {
			schema.field_or_err(&order.field)?;
		}
		let mut rows = self.filtered(schema, query.condition.as_ref())?;
		if !query.ordering.is_empty() {
			rows.sort_by(|a, b| {
				query
					.ordering
					.iter()
					.map(|order| {
						let left = a.get(&order.field).unwrap_or(&Value::Null);
						let right = b.get(&order.field).unwrap_or(&Value::Null);
						let ordering = compare_values(left, right);
						if order.descending {
							ordering.reverse()
						} else {
							ordering
						}
					})
					.find(|ordering| ordering.is_ne())
					.unwrap_or(std::cmp::Ordering::Equal)
			});
		}
		Ok(rows
			.into_iter()
			.skip(query.offset)
			.take(query.limit.unwrap_or(usize::MAX))
			.collect())
	}

	async fn count(
		&self,
		schema: &ModelSchema,
		condition: Option<&FilterCondition>,
	) -> DbResult<usize> {
		Ok(self.filtered(schema, condition)?.len())
	}

	async fn get(&self, schema: &ModelSchema, pk: i64) -> DbResult<Option<Record>> {
		let tables = self.tables.read();
		let table = tables
			.get(&schema.key)
			.ok_or_else(|| DbError::UnknownModel(schema.key.to_string()))?;
		Ok(table.rows.get(&pk).cloned())
	}

	async fn atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteOutcome>> {
		match self.apply(&ops) {
			Ok(outcomes) => {
				tracing::debug!(operations = ops.len(), "memory transaction committed");
				Ok(outcomes)
			}
			Err(err) => {
				tracing::warn!(operations = ops.len(), error = %err, "memory transaction rolled back");
				Err(err)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::{Filter, OrderBy};
	use crate::schema::FieldDef;
	use rstest::{fixture, rstest};
	use serde_json::json;

	struct Blog {
		store: MemoryStore,
		author: Arc<ModelSchema>,
		article: Arc<ModelSchema>,
		comment: Arc<ModelSchema>,
	}

	#[fixture]
	fn blog() -> Blog {
		let author = Arc::new(
			ModelSchema::new("blog", "Author").field(FieldDef::char("name", 50).unique(true)),
		);
		let article = Arc::new(
			ModelSchema::new("blog", "Article")
				.field(FieldDef::char("title", 100))
				.field(
					FieldDef::foreign_key("author", author.key.clone(), OnDelete::Protect)
						.null(true),
				),
		);
		let comment = Arc::new(
			ModelSchema::new("blog", "Comment")
				.field(FieldDef::foreign_key(
					"article",
					article.key.clone(),
					OnDelete::Cascade,
				))
				.field(FieldDef::text("body")),
		);
		let store =
			MemoryStore::with_models([author.clone(), article.clone(), comment.clone()]).unwrap();
		Blog {
			store,
			author,
			article,
			comment,
		}
	}

	fn article(title: &str) -> Record {
		Record::from_pairs([("title", json!(title))])
	}

	#[rstest]
	#[tokio::test]
	async fn test_insert_assigns_increasing_ids(blog: Blog) {
		let first = blog.store.insert(blog.article.clone(), article("a")).await.unwrap();
		let second = blog.store.insert(blog.article.clone(), article("b")).await.unwrap();
		assert_eq!((first, second), (1, 2));

		let row = blog.store.get(&blog.article, 2).await.unwrap().unwrap();
		assert_eq!(row.get("author"), Some(&Value::Null));
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_batch_leaves_no_trace(blog: Blog) {
		// Arrange
		blog.store
			.insert(blog.author.clone(), Record::from_pairs([("name", json!("Ann"))]))
			.await
			.unwrap();

		// Act
		let result = blog
			.store
			.atomic(vec![
				WriteOp::Insert {
					schema: blog.article.clone(),
					values: article("kept?"),
				},
				WriteOp::Insert {
					schema: blog.author.clone(),
					values: Record::from_pairs([("name", json!("Ann"))]),
				},
			])
			.await;

		// Assert
		assert!(result.unwrap_err().is_constraint());
		assert_eq!(blog.store.count(&blog.article, None).await.unwrap(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_cascades_to_children(blog: Blog) {
		let pk = blog.store.insert(blog.article.clone(), article("a")).await.unwrap();
		for body in ["x", "y"] {
			blog.store
				.insert(
					blog.comment.clone(),
					Record::from_pairs([("article", json!(pk)), ("body", json!(body))]),
				)
				.await
				.unwrap();
		}

		blog.store.delete(blog.article.clone(), pk).await.unwrap();

		assert_eq!(blog.store.count(&blog.comment, None).await.unwrap(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_protected_delete_is_refused(blog: Blog) {
		let author = blog
			.store
			.insert(blog.author.clone(), Record::from_pairs([("name", json!("Bo"))]))
			.await
			.unwrap();
		let mut values = article("a");
		values.set("author", author);
		blog.store.insert(blog.article.clone(), values).await.unwrap();

		let result = blog.store.delete(blog.author.clone(), author).await;

		assert!(result.unwrap_err().is_constraint());
		assert!(blog.store.get(&blog.author, author).await.unwrap().is_some());
	}

	#[rstest]
	#[tokio::test]
	async fn test_foreign_key_must_exist(blog: Blog) {
		let result = blog
			.store
			.insert(
				blog.comment.clone(),
				Record::from_pairs([("article", json!(99)), ("body", json!("x"))]),
			)
			.await;
		assert!(result.unwrap_err().is_constraint());
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_row_errors(blog: Blog) {
		let update = blog.store.update(blog.article.clone(), 5, article("z")).await;
		let delete = blog.store.delete(blog.article.clone(), 5).await;
		assert!(matches!(update, Err(DbError::NotFound { pk: 5, .. })));
		assert!(matches!(delete, Err(DbError::NotFound { pk: 5, .. })));
	}

	#[rstest]
	#[tokio::test]
	async fn test_list_filters_orders_and_slices(blog: Blog) {
		for title in ["b rust", "a rust", "c go", "d rust"] {
			blog.store.insert(blog.article.clone(), article(title)).await.unwrap();
		}
		let query = ListQuery::new()
			.filter(FilterCondition::Single(Filter::icontains("title", "RUST")))
			.order_by(OrderBy::desc("title"))
			.offset(1)
			.limit(5);

		let rows = blog.store.list(&blog.article, &query).await.unwrap();

		let titles: Vec<&Value> = rows.iter().filter_map(|r| r.get("title")).collect();
		assert_eq!(titles, vec![&json!("b rust"), &json!("a rust")]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unknown_filter_field(blog: Blog) {
		let query = ListQuery::new().filter(FilterCondition::Single(Filter::eq("nope", 1)));
		let result = blog.store.list(&blog.article, &query).await;
		assert!(matches!(result, Err(DbError::UnknownField { .. })));
	}

	#[rstest]
	#[tokio::test]
	async fn test_unregistered_model() {
		let store = MemoryStore::new();
		let schema = ModelSchema::new("x", "Y");
		let result = store.get(&schema, 1).await;
		assert!(matches!(result, Err(DbError::UnknownModel(_))));
	}
}
