use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the primary key column of every model
pub const PK_FIELD: &str = "id";

/// One stored row: field name to JSON value, in field order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
	values: IndexMap<String, Value>,
}

impl Record {
	pub fn new() -> Self {
		Self::default()
	}

	/// # Examples
	///
	/// ```
	/// use clarity_db::Record;
	/// use serde_json::json;
	///
	/// let record = Record::from_pairs([("id", json!(1)), ("title", json!("Hi"))]);
	/// assert_eq!(record.pk(), Some(1));
	/// assert_eq!(record.get("title"), Some(&json!("Hi")));
	/// ```
	pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
		Self {
			values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
		}
	}

	/// Primary key, when present and integral
	pub fn pk(&self) -> Option<i64> {
		self.values.get(PK_FIELD).and_then(Value::as_i64)
	}

	pub fn get(&self, field: &str) -> Option<&Value> {
		self.values.get(field)
	}

	pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
		self.values.insert(field.into(), value.into());
	}

	pub fn remove(&mut self, field: &str) -> Option<Value> {
		self.values.shift_remove(field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.values.contains_key(field)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.values.iter()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Overwrite fields with the values of `other`
	pub fn merge(&mut self, other: &Record) {
		for (field, value) in other.iter() {
			self.values.insert(field.clone(), value.clone());
		}
	}

	pub fn into_map(self) -> IndexMap<String, Value> {
		self.values
	}
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
	fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
		Self::from_pairs(iter)
	}
}

impl From<Record> for Value {
	fn from(record: Record) -> Self {
		Value::Object(record.values.into_iter().collect())
	}
}
