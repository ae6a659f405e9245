//! Global `tracing` subscriber setup

use crate::error::{ServerError, ServerResult};
use clarity_conf::{LogFormat, LoggingSettings};
use std::io;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Noisy dependencies kept at `warn` unless the directive names them
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "sqlx", "reqwest"];

/// Parse an `EnvFilter` directive such as `info` or `clarity_admin=debug,info`
///
/// Dependencies in [`QUIET_TARGETS`] are capped at `warn` unless the
/// directive mentions them.
///
/// # Examples
///
/// ```
/// use clarity_server::logging::build_filter;
///
/// assert!(build_filter("clarity_admin=debug,info").is_ok());
/// assert!(build_filter("clarity_admin=loud").is_err());
/// ```
pub fn build_filter(directive: &str) -> ServerResult<EnvFilter> {
	let invalid = |reason: String| ServerError::LogFilter {
		directive: directive.to_string(),
		reason,
	};
	let mut filter = EnvFilter::builder()
		.parse(directive)
		.map_err(|e| invalid(e.to_string()))?;
	for target in QUIET_TARGETS {
		if directive.contains(target) {
			continue;
		}
		let quiet = format!("{target}=warn")
			.parse()
			.map_err(|e: tracing_subscriber::filter::ParseError| invalid(e.to_string()))?;
		filter = filter.add_directive(quiet);
	}
	Ok(filter)
}

/// Install the global subscriber
///
/// `RUST_LOG`, when set, takes precedence over `settings.level`. Fails when a
/// global subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> ServerResult<()> {
	let directive = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| settings.level.clone());
	let filter = build_filter(&directive)?;
	let registry = tracing_subscriber::registry().with(filter);

	let installed = match settings.format {
		LogFormat::Json => registry
			.with(
				fmt::layer()
					.json()
					.with_target(true)
					.with_current_span(false)
					.with_writer(io::stdout),
			)
			.try_init(),
		LogFormat::Pretty => registry
			.with(fmt::layer().with_target(true).with_writer(io::stdout))
			.try_init(),
	};
	installed.map_err(|e| ServerError::LoggingInit(e.to_string()))?;

	tracing::debug!(level = %directive, format = ?settings.format, "logging initialized");
	Ok(())
}
