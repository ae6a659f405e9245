use clarity_core::exception::Error;
use thiserror::Error as ThisError;

/// Errors raised while loading or validating settings
#[derive(Debug, ThisError)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error(".env error: {0}")]
	DotEnv(String),

	/// The merged sources do not deserialize into [`Settings`](crate::Settings)
	#[error("Parse error: {0}")]
	Parse(String),

	#[error("Invalid setting '{key}': {reason}")]
	Invalid { key: String, reason: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

impl From<dotenv::Error> for SettingsError {
	fn from(err: dotenv::Error) -> Self {
		SettingsError::DotEnv(err.to_string())
	}
}

impl From<SettingsError> for Error {
	fn from(err: SettingsError) -> Self {
		Error::ImproperlyConfigured(err.to_string())
	}
}
