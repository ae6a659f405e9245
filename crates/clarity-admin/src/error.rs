//! Error types for the admin

use clarity_core::exception::Error;
use clarity_db::DbError;
use clarity_forms::FormError;
use clarity_urls::UrlError;
use thiserror::Error as ThisError;

/// Misconfiguration detected while building forms, layouts, routes or views
///
/// Raised once, when the admin is assembled; never per request.
#[derive(Debug, ThisError)]
pub enum ConfigurationError {
	#[error("{view}() missing required argument: '{argument}'")]
	MissingArgument { view: String, argument: String },

	#[error("Unknown field(s) ({field}) specified for {model}")]
	UnknownField { model: String, field: String },

	#[error("Read-only field '{field}' of {model} is not listed in fields")]
	ReadOnlyNotInFields { model: String, field: String },

	#[error("'{child}' has no ForeignKey to '{parent}'")]
	NoForeignKey { parent: String, child: String },

	#[error("'{child}' has more than one ForeignKey to '{parent}'; set fk_name")]
	AmbiguousForeignKey { parent: String, child: String },

	#[error("fk_name '{fk_name}' is not a ForeignKey from '{child}' to '{parent}'")]
	InvalidForeignKey {
		parent: String,
		child: String,
		fk_name: String,
	},

	#[error("Ordering refers to unknown field '{field}' of {model}")]
	UnknownOrderingField { model: String, field: String },

	#[error("Field '{field}' of {model} references unknown model '{target}'")]
	UnknownRelatedModel {
		model: String,
		field: String,
		target: String,
	},

	#[error(transparent)]
	Form(#[from] FormError),

	#[error(transparent)]
	Url(#[from] UrlError),

	#[error(transparent)]
	Schema(#[from] DbError),
}

pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

impl From<ConfigurationError> for Error {
	fn from(err: ConfigurationError) -> Self {
		Error::ImproperlyConfigured(err.to_string())
	}
}

/// Request-time failures of the admin views
#[derive(Debug, ThisError)]
pub enum AdminError {
	#[error("No {model} matches id {pk}")]
	ObjectNotFound { model: String, pk: String },

	#[error("Model '{0}' is not registered with admin")]
	ModelNotRegistered(String),

	#[error("Template rendering error: {0}")]
	Render(String),

	#[error(transparent)]
	Database(#[from] DbError),

	#[error(transparent)]
	Configuration(#[from] ConfigurationError),
}

pub type AdminResult<T> = Result<T, AdminError>;

impl From<AdminError> for Error {
	fn from(err: AdminError) -> Self {
		match err {
			AdminError::ObjectNotFound { .. } | AdminError::ModelNotRegistered(_) => {
				Error::NotFound(err.to_string())
			}
			AdminError::Render(msg) => Error::Other(anyhow::anyhow!(msg)),
			AdminError::Database(db) => db.into(),
			AdminError::Configuration(config) => config.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_missing_argument_message() {
		let err = ConfigurationError::MissingArgument {
			view: "UpdateView".into(),
			argument: "form_layout".into(),
		};
		assert_eq!(err.to_string(), "UpdateView() missing required argument: 'form_layout'");
	}

	#[rstest]
	#[case(AdminError::ObjectNotFound { model: "Article".into(), pk: "7".into() }, 404)]
	#[case(AdminError::Render("boom".into()), 500)]
	#[case(AdminError::Database(DbError::Constraint("UNIQUE".into())), 500)]
	fn test_status_codes(#[case] err: AdminError, #[case] status: u16) {
		assert_eq!(Error::from(err).status_code(), status);
	}
}
