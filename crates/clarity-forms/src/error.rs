use clarity_core::exception::Error;
use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FormError {
	#[error("Unknown field(s) ({field}) specified for {model}")]
	UnknownField { model: String, field: String },

	#[error("'{field}' cannot be specified for {model} model form as it is a non-editable field")]
	NonEditableField { model: String, field: String },

	/// Raised by a clean hook for the form as a whole
	#[error("{0}")]
	Validation(String),

	/// Raised by a clean hook for one field
	#[error("{message}")]
	Field { field: String, message: String },
}

pub type FormResult<T> = Result<T, FormError>;

impl From<FormError> for Error {
	fn from(err: FormError) -> Self {
		match err {
			FormError::Validation(_) | FormError::Field { .. } => Error::Validation(err.to_string()),
			other => Error::ImproperlyConfigured(other.to_string()),
		}
	}
}
