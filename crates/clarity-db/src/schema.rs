//! Model schemas
//!
//! A [`ModelSchema`] is the runtime description of a persisted entity: its
//! identity, its ordered fields and their relations. Schemas are built once
//! with the builder methods below and shared behind an `Arc`.

use crate::error::{DbError, DbResult};
use crate::record::Record;
use clarity_core::text::{capfirst, humanize_field_name, pluralize, verbose_name_from_model};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Identity of a model: `app_label.model_name`, model name lowercased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelKey {
	pub app_label: String,
	pub model_name: String,
}

impl ModelKey {
	/// # Examples
	///
	/// ```
	/// use clarity_db::ModelKey;
	///
	/// let key = ModelKey::new("blog", "Article");
	/// assert_eq!(key.model_name, "article");
	/// assert_eq!(key.to_string(), "blog.article");
	/// ```
	pub fn new(app_label: impl Into<String>, model_name: impl AsRef<str>) -> Self {
		Self {
			app_label: app_label.into(),
			model_name: model_name.as_ref().to_lowercase(),
		}
	}
}

impl fmt::Display for ModelKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.app_label, self.model_name)
	}
}

/// Behavior of a foreign key when the referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDelete {
	Cascade,
	Protect,
	SetNull,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
	AutoId,
	Char { max_length: usize },
	Text,
	Integer,
	Float,
	Boolean,
	/// ISO 8601 date, stored as text
	Date,
	/// ISO 8601 date and time, stored as text
	DateTime,
	ForeignKey { to: ModelKey, on_delete: OnDelete },
}

impl FieldKind {
	pub fn is_relation(&self) -> bool {
		matches!(self, FieldKind::ForeignKey { .. })
	}

	pub fn related_model(&self) -> Option<&ModelKey> {
		match self {
			FieldKind::ForeignKey { to, .. } => Some(to),
			_ => None,
		}
	}

	/// Whether values of this kind are stored as text
	pub fn is_textual(&self) -> bool {
		matches!(
			self,
			FieldKind::Char { .. } | FieldKind::Text | FieldKind::Date | FieldKind::DateTime
		)
	}
}

/// A single model field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
	pub name: String,
	pub verbose_name: Option<String>,
	pub kind: FieldKind,
	pub editable: bool,
	pub null: bool,
	pub blank: bool,
	pub unique: bool,
	pub choices: Vec<(Value, String)>,
	pub default: Option<Value>,
	pub help_text: Option<String>,
}

impl FieldDef {
	pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			verbose_name: None,
			kind,
			editable: true,
			null: false,
			blank: false,
			unique: false,
			choices: Vec::new(),
			default: None,
			help_text: None,
		}
	}

	/// Auto-incrementing integer primary key
	pub fn auto_id(name: impl Into<String>) -> Self {
		let mut field = Self::new(name, FieldKind::AutoId);
		field.editable = false;
		field.blank = true;
		field.unique = true;
		field
	}

	pub fn char(name: impl Into<String>, max_length: usize) -> Self {
		Self::new(name, FieldKind::Char { max_length })
	}

	pub fn text(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Text)
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Integer)
	}

	pub fn float(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Float)
	}

	/// Boolean fields are never required by forms: an unchecked box means false
	pub fn boolean(name: impl Into<String>) -> Self {
		let mut field = Self::new(name, FieldKind::Boolean);
		field.blank = true;
		field.default = Some(Value::Bool(false));
		field
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::Date)
	}

	pub fn datetime(name: impl Into<String>) -> Self {
		Self::new(name, FieldKind::DateTime)
	}

	pub fn foreign_key(name: impl Into<String>, to: ModelKey, on_delete: OnDelete) -> Self {
		Self::new(name, FieldKind::ForeignKey { to, on_delete })
	}

	pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	/// Allow NULL in storage
	pub fn null(mut self, null: bool) -> Self {
		self.null = null;
		self
	}

	/// Allow an empty value in forms
	pub fn blank(mut self, blank: bool) -> Self {
		self.blank = blank;
		self
	}

	pub fn unique(mut self, unique: bool) -> Self {
		self.unique = unique;
		self
	}

	pub fn editable(mut self, editable: bool) -> Self {
		self.editable = editable;
		self
	}

	/// Restrict values to `choices` (stored value, label)
	pub fn choices<V: Into<Value>, L: Into<String>>(
		mut self,
		choices: impl IntoIterator<Item = (V, L)>,
	) -> Self {
		self.choices = choices
			.into_iter()
			.map(|(value, label)| (value.into(), label.into()))
			.collect();
		self
	}

	pub fn default_value(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self
	}

	pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
		self.help_text = Some(help_text.into());
		self
	}

	/// Human readable label
	///
	/// # Examples
	///
	/// ```
	/// use clarity_db::FieldDef;
	///
	/// assert_eq!(FieldDef::char("title", 100).label(), "Title");
	/// assert_eq!(FieldDef::date("pub_date").label(), "Pub date");
	/// assert_eq!(FieldDef::text("body").verbose_name("content").label(), "Content");
	/// ```
	pub fn label(&self) -> String {
		match &self.verbose_name {
			Some(name) => capfirst(name),
			None => capfirst(&humanize_field_name(&self.name)),
		}
	}

	pub fn is_primary_key(&self) -> bool {
		self.kind == FieldKind::AutoId
	}

	/// Label of the choice matching `value`, if this field has choices
	pub fn choice_label(&self, value: &Value) -> Option<&str> {
		self.choices
			.iter()
			.find(|(choice, _)| crate::filter::values_equal(choice, value))
			.map(|(_, label)| label.as_str())
	}
}

/// Runtime description of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
	pub key: ModelKey,
	/// CamelCase name, e.g. `OrderLine`
	pub object_name: String,
	pub verbose_name: String,
	pub verbose_name_plural: String,
	pub fields: Vec<FieldDef>,
	pub display_field: Option<String>,
}

impl ModelSchema {
	/// Start a schema; an `id` primary key is always the first field
	///
	/// # Examples
	///
	/// ```
	/// use clarity_db::{FieldDef, ModelSchema};
	///
	/// let schema = ModelSchema::new("blog", "Article")
	///     .field(FieldDef::char("title", 200))
	///     .field(FieldDef::text("body"));
	///
	/// assert_eq!(schema.key.to_string(), "blog.article");
	/// assert_eq!(schema.verbose_name, "article");
	/// assert_eq!(schema.verbose_name_plural, "articles");
	/// assert_eq!(schema.field_names(), vec!["id", "title", "body"]);
	/// ```
	pub fn new(app_label: impl Into<String>, object_name: impl Into<String>) -> Self {
		let object_name = object_name.into();
		let verbose_name = verbose_name_from_model(&object_name);
		Self {
			key: ModelKey::new(app_label, &object_name),
			verbose_name_plural: pluralize(&verbose_name),
			verbose_name,
			object_name,
			fields: vec![FieldDef::auto_id("id")],
			display_field: None,
		}
	}

	pub fn field(mut self, field: FieldDef) -> Self {
		self.fields.push(field);
		self
	}

	/// Set the verbose name; the plural is re-derived unless set afterwards
	pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = verbose_name.into();
		self.verbose_name_plural = pluralize(&self.verbose_name);
		self
	}

	pub fn verbose_name_plural(mut self, plural: impl Into<String>) -> Self {
		self.verbose_name_plural = plural.into();
		self
	}

	/// Field whose value is the string form of an instance
	pub fn display_field(mut self, field: impl Into<String>) -> Self {
		self.display_field = Some(field.into());
		self
	}

	/// Storage table name: `{app_label}_{model_name}`
	pub fn table_name(&self) -> String {
		format!("{}_{}", self.key.app_label, self.key.model_name)
	}

	pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Like [`get_field`](Self::get_field) but failing with [`DbError::UnknownField`]
	pub fn field_or_err(&self, name: &str) -> DbResult<&FieldDef> {
		self.get_field(name).ok_or_else(|| DbError::UnknownField {
			model: self.key.to_string(),
			field: name.to_string(),
		})
	}

	pub fn field_names(&self) -> Vec<&str> {
		self.fields.iter().map(|f| f.name.as_str()).collect()
	}

	/// Editable fields in declaration order, primary key excluded
	pub fn editable_fields(&self) -> impl Iterator<Item = &FieldDef> {
		self.fields.iter().filter(|f| f.editable && !f.is_primary_key())
	}

	/// Foreign key fields pointing at `target`
	pub fn foreign_keys_to(&self, target: &ModelKey) -> Vec<&FieldDef> {
		self.fields
			.iter()
			.filter(|f| f.kind.related_model() == Some(target))
			.collect()
	}

	/// Label of the choice stored in `field`, if any
	pub fn choice_label(&self, field: &str, value: &Value) -> Option<&str> {
		self.get_field(field)?.choice_label(value)
	}

	/// String form of an instance
	///
	/// Uses the display field when configured and non-empty, otherwise
	/// `"{ObjectName} object ({pk})"`.
	///
	/// # Examples
	///
	/// ```
	/// use clarity_db::{FieldDef, ModelSchema, Record};
	/// use serde_json::json;
	///
	/// let schema = ModelSchema::new("blog", "Article").field(FieldDef::char("title", 200));
	/// let record = Record::from_pairs([("id", json!(3)), ("title", json!("Hello"))]);
	/// assert_eq!(schema.display_record(&record), "Article object (3)");
	///
	/// let schema = schema.display_field("title");
	/// assert_eq!(schema.display_record(&record), "Hello");
	/// ```
	pub fn display_record(&self, record: &Record) -> String {
		if let Some(field) = &self.display_field {
			let text = display_value(record.get(field).unwrap_or(&Value::Null));
			if !text.is_empty() {
				return text;
			}
		}
		match record.pk() {
			Some(pk) => format!("{} object ({})", self.object_name, pk),
			None => format!("{} object (None)", self.object_name),
		}
	}

	/// Check the schema is internally consistent
	pub fn validate(&self) -> DbResult<()> {
		let invalid = |reason: String| DbError::InvalidSchema {
			model: self.key.to_string(),
			reason,
		};
		let mut seen = HashSet::new();
		for field in &self.fields {
			if !seen.insert(field.name.as_str()) {
				return Err(invalid(format!("duplicate field '{}'", field.name)));
			}
			if field.name.is_empty()
				|| !field.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
			{
				return Err(invalid(format!("invalid field name '{}'", field.name)));
			}
			if let FieldKind::Char { max_length: 0 } = field.kind {
				return Err(invalid(format!("'{}' needs a positive max_length", field.name)));
			}
		}
		if self.fields.iter().filter(|f| f.is_primary_key()).count() != 1 {
			return Err(invalid("exactly one primary key is required".into()));
		}
		if let Some(display) = &self.display_field
			&& self.get_field(display).is_none()
		{
			return Err(invalid(format!("unknown display field '{display}'")));
		}
		Ok(())
	}
}

/// Plain string rendering of a stored value
///
/// # Examples
///
/// ```
/// use clarity_db::schema::display_value;
/// use serde_json::json;
///
/// assert_eq!(display_value(&json!(null)), "");
/// assert_eq!(display_value(&json!("x")), "x");
/// assert_eq!(display_value(&json!(2.5)), "2.5");
/// assert_eq!(display_value(&json!(true)), "True");
/// ```
pub fn display_value(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		Value::Bool(true) => "True".to_string(),
		Value::Bool(false) => "False".to_string(),
		other => other.to_string(),
	}
}
