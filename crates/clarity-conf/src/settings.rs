//! Settings structure and the layered builder that fills it

use crate::error::{SettingsError, SettingsResult};
use crate::sources::{
	ConfigSource, DefaultSource, DotEnvSource, EnvSource, TomlFileSource, coerce,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "CLARITY_";
pub const DEFAULT_CONFIG_FILE: &str = "clarity.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub debug: bool,
	pub server: ServerSettings,
	pub database: DatabaseSettings,
	pub admin: AdminSettings,
	pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
	pub bind_address: String,
	/// Seconds to wait for open connections on shutdown
	pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
	/// Mount point of the admin routes
	pub url_prefix: String,
	/// Route namespace, the first segment of every route name
	pub namespace: String,
	/// Default page size of list views
	pub items_per_page: usize,
	/// Blank forms per inline when the inline does not set its own count
	pub inline_extra: usize,
	/// Submitted values treated as empty, such as the markup an empty
	/// rich-text editor posts
	pub empty_editor_values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Pretty,
	Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// `EnvFilter` directive, e.g. `info` or `clarity_admin=debug,info`
	pub level: String,
	pub format: LogFormat,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			server: ServerSettings::default(),
			database: DatabaseSettings::default(),
			admin: AdminSettings::default(),
			logging: LoggingSettings::default(),
		}
	}
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			bind_address: "127.0.0.1:8000".to_string(),
			shutdown_timeout_secs: 30,
		}
	}
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: "sqlite::memory:".to_string(),
		}
	}
}

impl Default for AdminSettings {
	fn default() -> Self {
		Self {
			url_prefix: "/admin/".to_string(),
			namespace: "clarity".to_string(),
			items_per_page: 10,
			inline_extra: 3,
			empty_editor_values: vec!["<p>&nbsp;</p>".to_string()],
		}
	}
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
		}
	}
}

impl Settings {
	/// Load from `clarity.toml`, `.env` and `CLARITY_*` variables
	pub fn load() -> SettingsResult<Self> {
		SettingsBuilder::new()
			.toml_file(DEFAULT_CONFIG_FILE)
			.dotenv_file(".env")
			.env()
			.build()
	}

	pub fn builder() -> SettingsBuilder {
		SettingsBuilder::new()
	}

	/// Check values the types alone cannot guarantee
	///
	/// # Examples
	///
	/// ```
	/// use clarity_conf::Settings;
	///
	/// let mut settings = Settings::default();
	/// assert!(settings.validate().is_ok());
	///
	/// settings.admin.items_per_page = 0;
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> SettingsResult<()> {
		let invalid = |key: &str, reason: &str| SettingsError::Invalid {
			key: key.to_string(),
			reason: reason.to_string(),
		};
		if self.admin.items_per_page == 0 {
			return Err(invalid("admin.items_per_page", "must be greater than 0"));
		}
		if !self.admin.url_prefix.starts_with('/') {
			return Err(invalid("admin.url_prefix", "must start with '/'"));
		}
		if self.admin.namespace.is_empty() || self.admin.namespace.contains(':') {
			return Err(invalid("admin.namespace", "must be non-empty and contain no ':'"));
		}
		if self.database.url.is_empty() {
			return Err(invalid("database.url", "must not be empty"));
		}
		self.bind_address()?;
		Ok(())
	}

	pub fn bind_address(&self) -> SettingsResult<SocketAddr> {
		self.server
			.bind_address
			.parse()
			.map_err(|e: std::net::AddrParseError| SettingsError::Invalid {
				key: "server.bind_address".to_string(),
				reason: e.to_string(),
			})
	}
}

/// Collects sources and merges them into [`Settings`]
///
/// Defaults are always the lowest layer.
///
/// # Examples
///
/// ```
/// use clarity_conf::SettingsBuilder;
///
/// let settings = SettingsBuilder::new()
///     .set("admin.items_per_page", 25)
///     .build()
///     .unwrap();
/// assert_eq!(settings.admin.items_per_page, 25);
/// assert_eq!(settings.admin.namespace, "clarity");
/// ```
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
	overrides: IndexMap<String, Value>,
}

impl Default for SettingsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self {
			sources: Vec::new(),
			overrides: IndexMap::new(),
		}
	}

	pub fn source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	pub fn toml_file(self, path: impl Into<PathBuf>) -> Self {
		self.source(TomlFileSource::new(path))
	}

	pub fn dotenv_file(self, path: impl Into<PathBuf>) -> Self {
		self.source(DotEnvSource::new(path, ENV_PREFIX))
	}

	pub fn env(self) -> Self {
		self.source(EnvSource::new(ENV_PREFIX))
	}

	/// Set a dotted key above every source
	pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.overrides.insert(key.into(), value.into());
		self
	}

	/// Merge the sources, deserialize and validate
	pub fn build(mut self) -> SettingsResult<Settings> {
		let defaults = serde_json::to_value(Settings::default())
			.map_err(|e| SettingsError::Parse(e.to_string()))?;
		let mut tree = defaults.clone();

		let mut layers: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultSource::from_value(&defaults))];
		layers.append(&mut self.sources);
		layers.sort_by_key(|source| source.priority());

		for source in &layers {
			let values = source.load()?;
			tracing::debug!(source = %source.description(), keys = values.len(), "settings source loaded");
			for (key, value) in values {
				insert_dotted(&mut tree, &key, value);
			}
		}
		for (key, value) in self.overrides {
			insert_dotted(&mut tree, &key, value);
		}

		let settings: Settings =
			serde_json::from_value(tree).map_err(|e| SettingsError::Parse(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}
}

/// Set `a.b.c` in a JSON tree; raw strings take the type of the value they replace
fn insert_dotted(tree: &mut Value, key: &str, value: Value) {
	let mut node = tree;
	let mut parts = key.split('.').peekable();
	while let Some(part) = parts.next() {
		if !node.is_object() {
			*node = Value::Object(Map::new());
		}
		let Value::Object(map) = node else {
			return;
		};
		if parts.peek().is_none() {
			let value = match value {
				Value::String(raw) => coerce(&raw, map.get(part)),
				other => other,
			};
			map.insert(part.to_string(), value);
			return;
		}
		node = map
			.entry(part.to_string())
			.or_insert_with(|| Value::Object(Map::new()));
	}
}
