//! # clarity-conf
//!
//! Layered configuration for Clarity applications.
//!
//! Values are merged from, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`clarity.toml`)
//! 3. A `.env` file
//! 4. `CLARITY_*` environment variables, nested with `__`
//!    (`CLARITY_ADMIN__ITEMS_PER_PAGE=25`)

pub mod error;
pub mod settings;
pub mod sources;

pub use error::{SettingsError, SettingsResult};
pub use settings::{
	AdminSettings, DatabaseSettings, LogFormat, LoggingSettings, ServerSettings, Settings,
	SettingsBuilder,
};
pub use sources::{ConfigSource, DefaultSource, DotEnvSource, EnvSource, TomlFileSource};
