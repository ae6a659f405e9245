use clarity_core::exception::Error;
use thiserror::Error as ThisError;

/// Errors raised while parsing patterns or reversing route names
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UrlError {
	#[error("Invalid path pattern '{pattern}': {reason}")]
	InvalidPattern { pattern: String, reason: String },

	#[error("Reverse for '{0}' not found")]
	NoReverseMatch(String),

	#[error("Reverse for '{name}' is missing parameter '{param}'")]
	MissingParameter { name: String, param: String },

	#[error("Parameter '{param}' of '{name}' does not accept value '{value}'")]
	InvalidParameter {
		name: String,
		param: String,
		value: String,
	},

	#[error("Route name '{0}' is already registered")]
	DuplicateName(String),
}

impl From<UrlError> for Error {
	fn from(err: UrlError) -> Self {
		Error::ImproperlyConfigured(err.to_string())
	}
}
