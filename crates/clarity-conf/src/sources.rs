//! Configuration sources for layered settings
//!
//! Each source yields a map of dotted keys (`admin.items_per_page`) to JSON
//! values. Sources are merged in priority order: environment variables >
//! .env file > TOML file > defaults.

use crate::error::{SettingsError, SettingsResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::PathBuf;

/// Separator between nesting levels in environment variable names
pub const ENV_NESTING: &str = "__";

pub trait ConfigSource: Send + Sync {
	/// Load `dotted.key -> value` pairs
	fn load(&self) -> SettingsResult<IndexMap<String, Value>>;

	/// Higher wins when two sources set the same key
	fn priority(&self) -> u8;

	fn description(&self) -> String;
}

/// Flatten a JSON object into dotted keys
fn flatten(prefix: &str, value: &Value, out: &mut IndexMap<String, Value>) {
	match value {
		Value::Object(map) => {
			for (key, nested) in map {
				let dotted = if prefix.is_empty() {
					key.clone()
				} else {
					format!("{prefix}.{key}")
				};
				flatten(&dotted, nested, out);
			}
		}
		other => {
			out.insert(prefix.to_string(), other.clone());
		}
	}
}

/// Turn `CLARITY_ADMIN__ITEMS_PER_PAGE` into `admin.items_per_page`
fn env_key(name: &str, prefix: &str) -> Option<String> {
	let rest = name.strip_prefix(prefix)?;
	if rest.is_empty() {
		return None;
	}
	Some(rest.to_lowercase().replace(ENV_NESTING, "."))
}

/// Values from an already serialized settings tree
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn from_value(tree: &Value) -> Self {
		let mut values = IndexMap::new();
		flatten("", tree, &mut values);
		Self { values }
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Defaults".to_string()
	}
}

/// A TOML file; a missing file contributes nothing
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}
		let content = std::fs::read_to_string(&self.path)?;
		let table: toml::Table = toml::from_str(&content)?;
		let tree = serde_json::to_value(table).map_err(|e| SettingsError::Parse(e.to_string()))?;
		let mut values = IndexMap::new();
		flatten("", &tree, &mut values);
		Ok(values)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// A `.env` file, read without touching the process environment
///
/// Only variables starting with the prefix are considered.
pub struct DotEnvSource {
	path: PathBuf,
	prefix: String,
}

impl DotEnvSource {
	pub fn new(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			prefix: prefix.into(),
		}
	}
}

impl ConfigSource for DotEnvSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}
		let mut values = IndexMap::new();
		for item in dotenv::from_path_iter(&self.path)? {
			let (name, raw) = item?;
			if let Some(key) = env_key(&name, &self.prefix) {
				values.insert(key, Value::String(raw));
			}
		}
		Ok(values)
	}

	fn priority(&self) -> u8 {
		90
	}

	fn description(&self) -> String {
		format!(".env file: {}", self.path.display())
	}
}

/// Process environment variables with a prefix
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> SettingsResult<IndexMap<String, Value>> {
		let mut values = IndexMap::new();
		for (name, raw) in std::env::vars() {
			if let Some(key) = env_key(&name, &self.prefix) {
				values.insert(key, Value::String(raw));
			}
		}
		Ok(values)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// Convert raw text from an env source to the type of the value it replaces
///
/// Booleans accept `1/0`, `yes/no`, `on/off`; arrays are comma separated.
/// Text that does not fit is kept as a string so deserialization reports it.
pub(crate) fn coerce(raw: &str, current: Option<&Value>) -> Value {
	let trimmed = raw.trim();
	match current {
		Some(Value::Bool(_)) => match trimmed.to_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Value::Bool(true),
			"false" | "0" | "no" | "off" => Value::Bool(false),
			_ => Value::String(raw.to_string()),
		},
		Some(Value::Number(_)) => {
			if let Ok(int) = trimmed.parse::<i64>() {
				Value::from(int)
			} else if let Ok(float) = trimmed.parse::<f64>() {
				Value::from(float)
			} else {
				Value::String(raw.to_string())
			}
		}
		Some(Value::Array(_)) => Value::Array(
			raw.split(',')
				.map(str::trim)
				.filter(|item| !item.is_empty())
				.map(|item| Value::String(item.to_string()))
				.collect(),
		),
		_ => Value::String(raw.to_string()),
	}
}
