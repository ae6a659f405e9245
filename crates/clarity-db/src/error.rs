use clarity_core::exception::Error;
use thiserror::Error as ThisError;

/// Persistence errors
#[derive(Debug, ThisError)]
pub enum DbError {
	#[error("{model} with pk {pk} does not exist")]
	NotFound { model: String, pk: i64 },

	/// A NOT NULL, UNIQUE, FOREIGN KEY or PROTECT rule rejected the write
	#[error("Constraint failed: {0}")]
	Constraint(String),

	#[error("{model} has no field named '{field}'")]
	UnknownField { model: String, field: String },

	#[error("Model '{0}' is not registered with this store")]
	UnknownModel(String),

	#[error("Invalid schema for {model}: {reason}")]
	InvalidSchema { model: String, reason: String },

	#[error("Could not decode column '{column}': {reason}")]
	Decode { column: String, reason: String },

	#[cfg(feature = "sqlite")]
	#[error(transparent)]
	Sqlx(sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
	pub fn is_constraint(&self) -> bool {
		matches!(self, DbError::Constraint(_))
	}
}

impl From<DbError> for Error {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound { .. } => Error::NotFound(err.to_string()),
			other => Error::Database(other.to_string()),
		}
	}
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for DbError {
	fn from(err: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db) = &err
			&& (db.is_unique_violation()
				|| db.is_foreign_key_violation()
				|| db.is_check_violation()
				|| db.message().contains("constraint failed"))
		{
			return DbError::Constraint(db.message().to_string());
		}
		DbError::Sqlx(err)
	}
}
