//! Framework-wide error type
//!
//! Every crate in the workspace defines its own domain error and converts it
//! into [`Error`] at the request boundary. The HTTP layer maps each variant to
//! a status code through [`Error::status_code`].

use thiserror::Error as ThisError;

/// Framework error returned by request handlers
#[derive(Debug, ThisError)]
pub enum Error {
	/// The requested resource does not exist (404)
	#[error("Not found: {0}")]
	NotFound(String),

	/// The HTTP method is not supported by the handler (405)
	#[error("Method not allowed: {0}")]
	MethodNotAllowed(String),

	/// The request could not be understood (400)
	#[error("Bad request: {0}")]
	BadRequest(String),

	/// Input failed validation outside of form handling (400)
	#[error("Validation error: {0}")]
	Validation(String),

	/// A persistence operation failed (500)
	#[error("Database error: {0}")]
	Database(String),

	/// The application is misconfigured (500)
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	/// Any other failure (500)
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

/// Result alias used by handlers
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// HTTP status code for this error
	///
	/// # Examples
	///
	/// ```
	/// use clarity_core::exception::Error;
	///
	/// assert_eq!(Error::NotFound("article 7".into()).status_code(), 404);
	/// assert_eq!(Error::Database("locked".into()).status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::NotFound(_) => 404,
			Error::MethodNotAllowed(_) => 405,
			Error::BadRequest(_) | Error::Validation(_) => 400,
			Error::Database(_) | Error::ImproperlyConfigured(_) | Error::Other(_) => 500,
		}
	}

	/// Whether the error is caused by the client rather than the server
	pub fn is_client_error(&self) -> bool {
		(400..500).contains(&self.status_code())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::NotFound("x".into()), 404)]
	#[case(Error::MethodNotAllowed("PUT".into()), 405)]
	#[case(Error::BadRequest("x".into()), 400)]
	#[case(Error::Validation("x".into()), 400)]
	#[case(Error::Database("x".into()), 500)]
	#[case(Error::ImproperlyConfigured("x".into()), 500)]
	#[case(Error::Other(anyhow::anyhow!("boom")), 500)]
	fn test_status_code_mapping(#[case] error: Error, #[case] expected: u16) {
		assert_eq!(error.status_code(), expected);
	}

	#[rstest]
	fn test_client_error_classification() {
		assert!(Error::NotFound("a".into()).is_client_error());
		assert!(!Error::Database("a".into()).is_client_error());
	}

	#[rstest]
	fn test_display_includes_detail() {
		let error = Error::NotFound("blog.article 7".into());
		assert_eq!(error.to_string(), "Not found: blog.article 7");
	}
}
