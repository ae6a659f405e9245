//! SQLite backend built on `sqlx`
//!
//! Statements are assembled with `sqlx::QueryBuilder`. Every identifier comes
//! from a [`ModelSchema`] and is checked against it before being quoted, and
//! every value is bound as a parameter.

use crate::error::{DbError, DbResult};
use crate::filter::{Filter, FilterCondition, FilterOperator, ListQuery};
use crate::record::{PK_FIELD, Record};
use crate::schema::{FieldDef, FieldKind, ModelSchema, OnDelete};
use crate::store::{ModelStore, WriteOp, WriteOutcome};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::str::FromStr;

/// Store backed by a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
	pool: SqlitePool,
}

impl SqliteStore {
	/// Connect to `url`, creating the database file when missing
	///
	/// In-memory databases (`sqlite::memory:`) are private to a connection,
	/// so they get a single-connection pool.
	pub async fn connect(url: &str) -> DbResult<Self> {
		let options = SqliteConnectOptions::from_str(url)?
			.create_if_missing(true)
			.foreign_keys(true);
		let max_connections = if url.contains(":memory:") { 1 } else { 5 };
		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections)
			.connect_with(options)
			.await?;
		tracing::info!(url, "connected to sqlite");
		Ok(Self { pool })
	}

	pub fn from_pool(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// `CREATE TABLE IF NOT EXISTS` for `schema`
	pub async fn create_table(&self, schema: &ModelSchema) -> DbResult<()> {
		schema.validate()?;
		let ddl = create_table_sql(schema);
		tracing::debug!(table = %schema.table_name(), "creating table");
		sqlx::query(&ddl).execute(&self.pool).await?;
		Ok(())
	}

	async fn insert_in(
		conn: &mut SqliteConnection,
		schema: &ModelSchema,
		values: &Record,
	) -> DbResult<i64> {
		let mut columns = Vec::new();
		for (name, value) in values.iter() {
			let field = schema.field_or_err(name)?;
			if field.is_primary_key() && value.is_null() {
				continue;
			}
			columns.push((field, value));
		}
		for field in &schema.fields {
			if !field.is_primary_key()
				&& !values.contains(&field.name)
				&& let Some(default) = &field.default
			{
				columns.push((field, default));
			}
		}

		let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO ");
		builder.push(quote(&schema.table_name()));
		if columns.is_empty() {
			builder.push(" DEFAULT VALUES");
		} else {
			builder.push(" (");
			let mut names = builder.separated(", ");
			for (field, _) in &columns {
				names.push(quote(&field.name));
			}
			builder.push(") VALUES (");
			for (i, (field, value)) in columns.iter().enumerate() {
				if i > 0 {
					builder.push(", ");
				}
				push_value(&mut builder, field, value);
			}
			builder.push(")");
		}

		let result = builder.build().execute(&mut *conn).await?;
		Ok(result.last_insert_rowid())
	}

	async fn update_in(
		conn: &mut SqliteConnection,
		schema: &ModelSchema,
		pk: i64,
		values: &Record,
	) -> DbResult<()> {
		let mut assignments = Vec::new();
		for (name, value) in values.iter() {
			let field = schema.field_or_err(name)?;
			if !field.is_primary_key() {
				assignments.push((field, value));
			}
		}

		let mut builder = QueryBuilder::<Sqlite>::new("UPDATE ");
		builder.push(quote(&schema.table_name()));
		builder.push(" SET ");
		if assignments.is_empty() {
			builder.push(format!("{pk_col} = {pk_col}", pk_col = quote(PK_FIELD)));
		}
		for (i, (field, value)) in assignments.iter().enumerate() {
			if i > 0 {
				builder.push(", ");
			}
			builder.push(quote(&field.name));
			builder.push(" = ");
			push_value(&mut builder, field, value);
		}
		builder.push(" WHERE ");
		builder.push(quote(PK_FIELD));
		builder.push(" = ");
		builder.push_bind(pk);

		let result = builder.build().execute(&mut *conn).await?;
		if result.rows_affected() == 0 {
			return Err(DbError::NotFound {
				model: schema.key.to_string(),
				pk,
			});
		}
		Ok(())
	}

	async fn delete_in(conn: &mut SqliteConnection, schema: &ModelSchema, pk: i64) -> DbResult<()> {
		let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM ");
		builder.push(quote(&schema.table_name()));
		builder.push(" WHERE ");
		builder.push(quote(PK_FIELD));
		builder.push(" = ");
		builder.push_bind(pk);

		let result = builder.build().execute(&mut *conn).await?;
		if result.rows_affected() == 0 {
			return Err(DbError::NotFound {
				model: schema.key.to_string(),
				pk,
			});
		}
		Ok(())
	}
}

#[async_trait]
impl ModelStore for SqliteStore {
	async fn list(&self, schema: &ModelSchema, query: &ListQuery) -> DbResult<Vec<Record>> {
		let mut builder = select(schema);
		push_where(&mut builder, schema, query.condition.as_ref())?;
		if !query.ordering.is_empty() {
			builder.push(" ORDER BY ");
			for (i, order) in query.ordering.iter().enumerate() {
				schema.field_or_err(&order.field)?;
				if i > 0 {
					builder.push(", ");
				}
				builder.push(quote(&order.field));
				builder.push(if order.descending { " DESC" } else { " ASC" });
			}
		}
		builder.push(" LIMIT ");
		builder.push_bind(query.limit.map(|l| l as i64).unwrap_or(-1));
		builder.push(" OFFSET ");
		builder.push_bind(query.offset as i64);

		let rows = builder.build().fetch_all(&self.pool).await?;
		rows.iter().map(|row| decode_row(schema, row)).collect()
	}

	async fn count(
		&self,
		schema: &ModelSchema,
		condition: Option<&FilterCondition>,
	) -> DbResult<usize> {
		let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
		builder.push(quote(&schema.table_name()));
		push_where(&mut builder, schema, condition)?;
		let row = builder.build().fetch_one(&self.pool).await?;
		let count: i64 = row.try_get(0)?;
		Ok(usize::try_from(count).unwrap_or_default())
	}

	async fn get(&self, schema: &ModelSchema, pk: i64) -> DbResult<Option<Record>> {
		let mut builder = select(schema);
		builder.push(" WHERE ");
		builder.push(quote(PK_FIELD));
		builder.push(" = ");
		builder.push_bind(pk);
		let row = builder.build().fetch_optional(&self.pool).await?;
		row.map(|row| decode_row(schema, &row)).transpose()
	}

	async fn atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteOutcome>> {
		let mut tx = self.pool.begin().await?;
		let mut outcomes = Vec::with_capacity(ops.len());
		for op in &ops {
			let outcome = match op {
				WriteOp::Insert { schema, values } => {
					Self::insert_in(&mut tx, schema, values).await.map(WriteOutcome::Inserted)
				}
				WriteOp::Update { schema, pk, values } => Self::update_in(&mut tx, schema, *pk, values)
					.await
					.map(|_| WriteOutcome::Updated(*pk)),
				WriteOp::Delete { schema, pk } => Self::delete_in(&mut tx, schema, *pk)
					.await
					.map(|_| WriteOutcome::Deleted(*pk)),
			};
			match outcome {
				Ok(outcome) => outcomes.push(outcome),
				Err(err) => {
					tracing::warn!(operations = ops.len(), error = %err, "sqlite transaction rolled back");
					tx.rollback().await?;
					return Err(err);
				}
			}
		}
		tx.commit().await?;
		tracing::debug!(operations = ops.len(), "sqlite transaction committed");
		Ok(outcomes)
	}
}

/// Quote an identifier
fn quote(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

fn select(schema: &ModelSchema) -> QueryBuilder<'static, Sqlite> {
	let columns: Vec<String> = schema.fields.iter().map(|f| quote(&f.name)).collect();
	let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
	builder.push(columns.join(", "));
	builder.push(" FROM ");
	builder.push(quote(&schema.table_name()));
	builder
}

fn push_where(
	builder: &mut QueryBuilder<'static, Sqlite>,
	schema: &ModelSchema,
	condition: Option<&FilterCondition>,
) -> DbResult<()> {
	if let Some(condition) = condition {
		builder.push(" WHERE ");
		push_condition(builder, schema, condition)?;
	}
	Ok(())
}

fn push_condition(
	builder: &mut QueryBuilder<'static, Sqlite>,
	schema: &ModelSchema,
	condition: &FilterCondition,
) -> DbResult<()> {
	match condition {
		FilterCondition::Single(filter) => push_filter(builder, schema, filter),
		FilterCondition::And(conditions) | FilterCondition::Or(conditions) => {
			if conditions.is_empty() {
				let neutral = if matches!(condition, FilterCondition::And(_)) { "1 = 1" } else { "1 = 0" };
				builder.push(neutral);
				return Ok(());
			}
			let joiner = if matches!(condition, FilterCondition::And(_)) { " AND " } else { " OR " };
			builder.push("(");
			for (i, inner) in conditions.iter().enumerate() {
				if i > 0 {
					builder.push(joiner);
				}
				push_condition(builder, schema, inner)?;
			}
			builder.push(")");
			Ok(())
		}
	}
}

fn push_filter(
	builder: &mut QueryBuilder<'static, Sqlite>,
	schema: &ModelSchema,
	filter: &Filter,
) -> DbResult<()> {
	let field = schema.field_or_err(&filter.field)?;
	let column = quote(&field.name);
	match filter.operator {
		FilterOperator::Eq if filter.value.is_null() => {
			builder.push(format!("{column} IS NULL"));
		}
		FilterOperator::Eq => {
			builder.push(format!("{column} = "));
			push_value(builder, field, &filter.value);
		}
		FilterOperator::IContains => {
			let needle = match &filter.value {
				Value::String(s) => s.to_ascii_lowercase(),
				other => other.to_string().to_ascii_lowercase(),
			};
			builder.push(format!("LOWER(CAST({column} AS TEXT)) LIKE "));
			builder.push_bind(format!("%{}%", escape_like(&needle)));
			builder.push(" ESCAPE '\\'");
		}
		FilterOperator::In => {
			let candidates = filter.value.as_array().cloned().unwrap_or_default();
			if candidates.is_empty() {
				builder.push("1 = 0");
				return Ok(());
			}
			builder.push(format!("{column} IN ("));
			for (i, candidate) in candidates.iter().enumerate() {
				if i > 0 {
					builder.push(", ");
				}
				push_value(builder, field, candidate);
			}
			builder.push(")");
		}
	}
	Ok(())
}

fn escape_like(value: &str) -> String {
	value
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_")
}

/// Bind a JSON value with the SQLite type matching the field
fn push_value<'q>(builder: &mut QueryBuilder<'q, Sqlite>, field: &FieldDef, value: &Value) {
	match value {
		Value::Null => {
			builder.push_bind(None::<String>);
		}
		Value::Bool(b) => {
			builder.push_bind(*b);
		}
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				builder.push_bind(i);
			} else {
				builder.push_bind(n.as_f64().unwrap_or_default());
			}
		}
		Value::String(s) => match field.kind {
			FieldKind::Integer | FieldKind::AutoId | FieldKind::ForeignKey { .. } => {
				match s.parse::<i64>() {
					Ok(i) => builder.push_bind(i),
					Err(_) => builder.push_bind(s.clone()),
				};
			}
			_ => {
				builder.push_bind(s.clone());
			}
		},
		other => {
			builder.push_bind(other.to_string());
		}
	}
}

fn decode_row(schema: &ModelSchema, row: &SqliteRow) -> DbResult<Record> {
	let mut record = Record::new();
	for field in &schema.fields {
		let name = field.name.as_str();
		let decode_err = |e: sqlx::Error| DbError::Decode {
			column: name.to_string(),
			reason: e.to_string(),
		};
		let value = match field.kind {
			FieldKind::AutoId | FieldKind::Integer | FieldKind::ForeignKey { .. } => row
				.try_get::<Option<i64>, _>(name)
				.map_err(decode_err)?
				.map(Value::from),
			FieldKind::Float => row
				.try_get::<Option<f64>, _>(name)
				.map_err(decode_err)?
				.map(Value::from),
			FieldKind::Boolean => row
				.try_get::<Option<bool>, _>(name)
				.map_err(decode_err)?
				.map(Value::from),
			FieldKind::Char { .. } | FieldKind::Text | FieldKind::Date | FieldKind::DateTime => row
				.try_get::<Option<String>, _>(name)
				.map_err(decode_err)?
				.map(Value::from),
		};
		record.set(name, value.unwrap_or(Value::Null));
	}
	Ok(record)
}

/// DDL for one model
pub fn create_table_sql(schema: &ModelSchema) -> String {
	let columns: Vec<String> = schema.fields.iter().map(column_sql).collect();
	format!(
		"CREATE TABLE IF NOT EXISTS {} ({})",
		quote(&schema.table_name()),
		columns.join(", ")
	)
}

fn column_sql(field: &FieldDef) -> String {
	let name = quote(&field.name);
	if field.is_primary_key() {
		return format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT");
	}
	let sql_type = match &field.kind {
		FieldKind::Char { max_length } => format!("VARCHAR({max_length})"),
		FieldKind::Text => "TEXT".to_string(),
		FieldKind::Integer | FieldKind::AutoId | FieldKind::ForeignKey { .. } => "INTEGER".to_string(),
		FieldKind::Float => "REAL".to_string(),
		FieldKind::Boolean => "BOOLEAN".to_string(),
		FieldKind::Date => "DATE".to_string(),
		FieldKind::DateTime => "DATETIME".to_string(),
	};
	let mut sql = format!("{name} {sql_type} {}", if field.null { "NULL" } else { "NOT NULL" });
	if field.unique {
		sql.push_str(" UNIQUE");
	}
	if let FieldKind::ForeignKey { to, on_delete } = &field.kind {
		let action = match on_delete {
			OnDelete::Cascade => "CASCADE",
			OnDelete::Protect => "RESTRICT",
			OnDelete::SetNull => "SET NULL",
		};
		sql.push_str(&format!(
			" REFERENCES {}({}) ON DELETE {action}",
			quote(&format!("{}_{}", to.app_label, to.model_name)),
			quote(PK_FIELD)
		));
	}
	sql
}
