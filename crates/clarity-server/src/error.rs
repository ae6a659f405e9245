use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("Failed to bind {addr}: {source}")]
	Bind {
		addr: std::net::SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("Invalid log filter '{directive}': {reason}")]
	LogFilter { directive: String, reason: String },

	#[error("Logging already initialized: {0}")]
	LoggingInit(String),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;
