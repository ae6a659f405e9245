//! Form fields and value cleaning

use crate::widget::{Widget, WidgetKind};
use chrono::{NaiveDate, NaiveDateTime};
use clarity_db::schema::display_value;
use serde::Serialize;
use serde_json::Value;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const INVALID_NUMBER: &str = "Enter a number.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_DATETIME: &str = "Enter a valid date/time.";
pub const INVALID_MODEL_CHOICE: &str =
	"Select a valid choice. That choice is not one of the available choices.";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_OUTPUT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_INPUTS: &[&str] = &[
	"%Y-%m-%d %H:%M:%S",
	"%Y-%m-%dT%H:%M:%S",
	"%Y-%m-%d %H:%M",
	"%Y-%m-%dT%H:%M",
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
	Char,
	Text,
	Integer,
	Float,
	Boolean,
	Date,
	DateTime,
	/// Fixed choices declared on the field
	Choice,
	/// Primary key of a row of another model
	ModelChoice,
}

/// One selectable row for a [`FieldType::ModelChoice`] field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
	pub pk: i64,
	pub label: String,
}

/// A form field definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
	pub name: String,
	pub label: String,
	pub field_type: FieldType,
	pub widget: Widget,
	pub required: bool,
	/// Empty input cleans to NULL instead of an empty string
	pub null: bool,
	pub max_length: Option<usize>,
	pub choices: Vec<(Value, String)>,
	pub help_text: Option<String>,
	pub initial: Option<Value>,
}

impl FieldSpec {
	/// A field with the default widget for `field_type`
	///
	/// # Examples
	///
	/// ```
	/// use clarity_forms::{FieldSpec, FieldType, WidgetKind};
	///
	/// let field = FieldSpec::new("title", FieldType::Char).with_max_length(5);
	/// assert_eq!(field.label, "Title");
	/// assert_eq!(field.widget.kind, WidgetKind::TextInput);
	/// assert!(field.required);
	/// ```
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		let name = name.into();
		let widget = match field_type {
			FieldType::Char => WidgetKind::TextInput,
			FieldType::Text => WidgetKind::Textarea,
			FieldType::Integer | FieldType::Float => WidgetKind::NumberInput,
			FieldType::Boolean => WidgetKind::CheckboxInput,
			FieldType::Date => WidgetKind::DateInput,
			FieldType::DateTime => WidgetKind::DateTimeInput,
			FieldType::Choice | FieldType::ModelChoice => WidgetKind::Select,
		};
		Self {
			label: clarity_core::text::humanize_field_name(&name),
			name,
			field_type,
			widget: Widget::new(widget),
			required: field_type != FieldType::Boolean,
			null: false,
			max_length: None,
			choices: Vec::new(),
			help_text: None,
			initial: None,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn with_widget(mut self, widget: impl Into<Widget>) -> Self {
		self.widget = widget.into();
		self
	}

	pub fn required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}

	pub fn with_null(mut self, null: bool) -> Self {
		self.null = null;
		self
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn with_choices(mut self, choices: Vec<(Value, String)>) -> Self {
		self.choices = choices;
		self
	}

	pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
		self.help_text = Some(help_text.into());
		self
	}

	pub fn with_initial(mut self, initial: impl Into<Value>) -> Self {
		self.initial = Some(initial.into());
		self
	}

	fn empty_value(&self) -> Value {
		match self.field_type {
			FieldType::Char | FieldType::Text if !self.null => Value::String(String::new()),
			FieldType::Boolean => Value::Bool(false),
			_ => Value::Null,
		}
	}

	/// Validate raw submitted text and convert it to a stored value
	///
	/// `options` lists the valid rows for model choice fields and is ignored
	/// otherwise.
	///
	/// # Examples
	///
	/// ```
	/// use clarity_forms::{FieldSpec, FieldType};
	/// use serde_json::json;
	///
	/// let field = FieldSpec::new("count", FieldType::Integer);
	/// assert_eq!(field.clean(Some(" 12 "), &[]), Ok(json!(12)));
	/// assert_eq!(field.clean(Some("x"), &[]), Err("Enter a whole number.".to_string()));
	/// assert_eq!(field.clean(None, &[]), Err("This field is required.".to_string()));
	/// ```
	pub fn clean(&self, raw: Option<&str>, options: &[ChoiceOption]) -> Result<Value, String> {
		if self.field_type == FieldType::Boolean {
			let checked = raw.is_some_and(is_truthy);
			if self.required && !checked {
				return Err(REQUIRED.to_string());
			}
			return Ok(Value::Bool(checked));
		}

		let text = raw.map(str::trim).unwrap_or("");
		if text.is_empty() {
			if self.required {
				return Err(REQUIRED.to_string());
			}
			return Ok(self.empty_value());
		}

		match self.field_type {
			FieldType::Char | FieldType::Text => {
				let length = text.chars().count();
				if let Some(max) = self.max_length
					&& length > max
				{
					return Err(format!(
						"Ensure this value has at most {max} characters (it has {length})."
					));
				}
				Ok(Value::String(text.to_string()))
			}
			FieldType::Integer => text
				.parse::<i64>()
				.map(Value::from)
				.map_err(|_| INVALID_INTEGER.to_string()),
			FieldType::Float => match text.parse::<f64>() {
				Ok(number) if number.is_finite() => Ok(Value::from(number)),
				_ => Err(INVALID_NUMBER.to_string()),
			},
			FieldType::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
				.map(|date| Value::String(date.format(DATE_FORMAT).to_string()))
				.map_err(|_| INVALID_DATE.to_string()),
			FieldType::DateTime => DATETIME_INPUTS
				.iter()
				.find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
				.map(|dt| Value::String(dt.format(DATETIME_OUTPUT).to_string()))
				.ok_or_else(|| INVALID_DATETIME.to_string()),
			FieldType::Choice => self
				.choices
				.iter()
				.find(|(value, _)| display_value(value) == text)
				.map(|(value, _)| value.clone())
				.ok_or_else(|| {
					format!("Select a valid choice. {text} is not one of the available choices.")
				}),
			FieldType::ModelChoice => text
				.parse::<i64>()
				.ok()
				.filter(|pk| options.iter().any(|option| option.pk == *pk))
				.map(Value::from)
				.ok_or_else(|| INVALID_MODEL_CHOICE.to_string()),
			FieldType::Boolean => Ok(Value::Bool(true)),
		}
	}

	/// Text form of a stored value, as it would be submitted back
	///
	/// # Examples
	///
	/// ```
	/// use clarity_forms::{FieldSpec, FieldType};
	/// use serde_json::json;
	///
	/// let field = FieldSpec::new("done", FieldType::Boolean);
	/// assert_eq!(field.prepare_value(&json!(true)), "on");
	/// assert_eq!(field.prepare_value(&json!(false)), "");
	/// ```
	pub fn prepare_value(&self, value: &Value) -> String {
		match (self.field_type, value) {
			(FieldType::Boolean, Value::Bool(true)) => "on".to_string(),
			(FieldType::Boolean, _) => String::new(),
			_ => display_value(value),
		}
	}

	/// Whether `raw` differs from `initial`
	///
	/// Input that does not clean counts as changed; NULL and the empty
	/// string are treated alike.
	pub fn has_changed(&self, initial: Option<&Value>, raw: Option<&str>) -> bool {
		let initial = initial.cloned().unwrap_or_else(|| self.empty_value());
		let lenient = Self {
			required: false,
			..self.clone()
		};
		match lenient.clean_lenient(raw) {
			Some(value) => normalize(&value) != normalize(&initial),
			None => true,
		}
	}

	fn clean_lenient(&self, raw: Option<&str>) -> Option<Value> {
		match self.field_type {
			// Any integer counts for change detection, whatever the options
			FieldType::ModelChoice => {
				let text = raw.map(str::trim).unwrap_or("");
				if text.is_empty() {
					Some(Value::Null)
				} else {
					text.parse::<i64>().ok().map(Value::from)
				}
			}
			_ => self.clean(raw, &[]).ok(),
		}
	}
}

fn normalize(value: &Value) -> Value {
	match value {
		Value::String(s) if s.is_empty() => Value::Null,
		Value::Number(n) => n
			.as_i64()
			.map(Value::from)
			.unwrap_or_else(|| value.clone()),
		other => other.clone(),
	}
}

/// Checkbox semantics for submitted text
pub fn is_truthy(raw: &str) -> bool {
	!matches!(
		raw.trim().to_ascii_lowercase().as_str(),
		"" | "false" | "0" | "off" | "no"
	)
}
