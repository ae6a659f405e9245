//! Query filters
//!
//! Filters are backend neutral: the memory store evaluates them against
//! records and the SQLite store compiles them to SQL.

use crate::record::Record;
use crate::schema::display_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
	/// Equal
	Eq,
	/// Case-insensitive substring match on the text form of the value
	IContains,
	/// Member of the array given as value
	In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
	pub field: String,
	pub operator: FilterOperator,
	pub value: Value,
}

impl Filter {
	pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
		Self {
			field: field.into(),
			operator,
			value: value.into(),
		}
	}

	pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::new(field, FilterOperator::Eq, value)
	}

	/// Substring match ignoring ASCII case
	///
	/// Only `A-Z` fold, the way SQLite's `LOWER()` does, so every store
	/// answers the same: `"CAFÉ"` does not match `"café"`.
	pub fn icontains(field: impl Into<String>, needle: impl Into<String>) -> Self {
		Self::new(field, FilterOperator::IContains, Value::String(needle.into()))
	}

	pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
		Self::new(field, FilterOperator::In, Value::Array(values))
	}

	/// Evaluate against a record; a missing field compares as NULL
	pub fn matches(&self, record: &Record) -> bool {
		let actual = record.get(&self.field).unwrap_or(&Value::Null);
		match self.operator {
			FilterOperator::Eq => values_equal(actual, &self.value),
			FilterOperator::IContains => {
				if actual.is_null() {
					return false;
				}
				let needle = display_value(&self.value).to_ascii_lowercase();
				display_value(actual).to_ascii_lowercase().contains(&needle)
			}
			FilterOperator::In => match &self.value {
				Value::Array(candidates) => candidates.iter().any(|c| values_equal(actual, c)),
				_ => false,
			},
		}
	}
}

/// Composite filter condition supporting AND/OR logic
///
/// # Examples
///
/// ```
/// use clarity_db::{Filter, FilterCondition, Record};
/// use serde_json::json;
///
/// let search = FilterCondition::or_filters(vec![
///     Filter::icontains("title", "rust"),
///     Filter::icontains("body", "rust"),
/// ]);
///
/// let record = Record::from_pairs([("title", json!("Learning Rust")), ("body", json!(""))]);
/// assert!(search.matches(&record));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
	Single(Filter),
	And(Vec<FilterCondition>),
	Or(Vec<FilterCondition>),
}

impl FilterCondition {
	pub fn or_filters(filters: Vec<Filter>) -> Self {
		Self::Or(filters.into_iter().map(FilterCondition::Single).collect())
	}

	pub fn and_filters(filters: Vec<Filter>) -> Self {
		Self::And(filters.into_iter().map(FilterCondition::Single).collect())
	}

	/// An empty AND matches everything, an empty OR matches nothing
	pub fn matches(&self, record: &Record) -> bool {
		match self {
			FilterCondition::Single(filter) => filter.matches(record),
			FilterCondition::And(conditions) => conditions.iter().all(|c| c.matches(record)),
			FilterCondition::Or(conditions) => conditions.iter().any(|c| c.matches(record)),
		}
	}

	/// Every field referenced by the condition
	pub fn fields(&self) -> Vec<&str> {
		match self {
			FilterCondition::Single(filter) => vec![filter.field.as_str()],
			FilterCondition::And(conditions) | FilterCondition::Or(conditions) => {
				conditions.iter().flat_map(|c| c.fields()).collect()
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
	pub field: String,
	pub descending: bool,
}

impl OrderBy {
	pub fn asc(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			descending: false,
		}
	}

	pub fn desc(field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			descending: true,
		}
	}

	/// Parse `"field"` or `"-field"`
	///
	/// # Examples
	///
	/// ```
	/// use clarity_db::OrderBy;
	///
	/// assert_eq!(OrderBy::parse("-created"), OrderBy::desc("created"));
	/// assert_eq!(OrderBy::parse("id"), OrderBy::asc("id"));
	/// ```
	pub fn parse(spec: &str) -> Self {
		match spec.strip_prefix('-') {
			Some(field) => Self::desc(field),
			None => Self::asc(spec),
		}
	}
}

/// Filtering, ordering and slicing for [`ModelStore::list`](crate::ModelStore::list)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
	pub condition: Option<FilterCondition>,
	pub ordering: Vec<OrderBy>,
	pub offset: usize,
	pub limit: Option<usize>,
}

impl ListQuery {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn filter(mut self, condition: FilterCondition) -> Self {
		self.condition = Some(condition);
		self
	}

	pub fn order_by(mut self, order: OrderBy) -> Self {
		self.ordering.push(order);
		self
	}

	pub fn offset(mut self, offset: usize) -> Self {
		self.offset = offset;
		self
	}

	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);
		self
	}
}

/// Equality with integer and float values comparing numerically
pub fn values_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
			(Some(x), Some(y)) => x == y,
			_ => x.as_f64() == y.as_f64(),
		},
		_ => a == b,
	}
}

/// Total order used for sorting: NULL first, then booleans, numbers, strings
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
	fn rank(value: &Value) -> u8 {
		match value {
			Value::Null => 0,
			Value::Bool(_) => 1,
			Value::Number(_) => 2,
			Value::String(_) => 3,
			Value::Array(_) => 4,
			Value::Object(_) => 5,
		}
	}
	match (a, b) {
		(Value::Bool(x), Value::Bool(y)) => x.cmp(y),
		(Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
			(Some(x), Some(y)) => x.cmp(&y),
			_ => x
				.as_f64()
				.partial_cmp(&y.as_f64())
				.unwrap_or(Ordering::Equal),
		},
		(Value::String(x), Value::String(y)) => x.cmp(y),
		_ => rank(a).cmp(&rank(b)),
	}
}
