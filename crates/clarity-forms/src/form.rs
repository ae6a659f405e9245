//! Form definitions and bound forms

use crate::error::{FormError, FormResult};
use crate::field::{ChoiceOption, FieldSpec};
use crate::model_form::fields_for_model;
use crate::widget::Widget;
use clarity_db::{ModelSchema, PK_FIELD, Record};
use clarity_http::{FileDict, QueryDict, UploadedFile};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Object-level validation run after the fields are cleaned
///
/// Receives the cleaned data (fields that failed to clean are absent).
pub type CleanHook = Arc<dyn Fn(&Record) -> FormResult<()> + Send + Sync>;

/// Valid rows for every model choice field, keyed by field name
pub type ModelChoices = HashMap<String, Vec<ChoiceOption>>;

/// A form type: the fields of one model a form edits
#[derive(Clone)]
pub struct FormConfig {
	pub model: Arc<ModelSchema>,
	pub fields: Vec<FieldSpec>,
	clean_hooks: Vec<CleanHook>,
}

impl FormConfig {
	pub fn new(model: Arc<ModelSchema>, fields: Vec<FieldSpec>) -> Self {
		Self {
			model,
			fields,
			clean_hooks: Vec::new(),
		}
	}

	/// Form type editing `names` of `model`, with per-field widget overrides
	///
	/// # Examples
	///
	/// ```
	/// use clarity_db::{FieldDef, ModelSchema};
	/// use clarity_forms::FormConfig;
	/// use indexmap::IndexMap;
	/// use std::sync::Arc;
	///
	/// let schema = Arc::new(
	///     ModelSchema::new("blog", "Article")
	///         .field(FieldDef::char("title", 200))
	///         .field(FieldDef::text("body")),
	/// );
	/// let config = FormConfig::for_model(schema, &["title".to_string()], &IndexMap::new()).unwrap();
	/// assert_eq!(config.field_names(), vec!["title"]);
	/// ```
	pub fn for_model(
		model: Arc<ModelSchema>,
		names: &[String],
		widgets: &IndexMap<String, Widget>,
	) -> FormResult<Self> {
		let fields = fields_for_model(&model, names, widgets)?;
		Ok(Self::new(model, fields))
	}

	/// Add an object-level clean hook
	pub fn with_clean_hook(mut self, hook: CleanHook) -> Self {
		self.clean_hooks.push(hook);
		self
	}

	pub fn field(&self, name: &str) -> Option<&FieldSpec> {
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn field_names(&self) -> Vec<&str> {
		self.fields.iter().map(|f| f.name.as_str()).collect()
	}

	/// Label for `name`, falling back to the model field label and then the name
	pub fn label_for(&self, name: &str) -> String {
		if let Some(field) = self.field(name) {
			return field.label.clone();
		}
		match self.model.get_field(name) {
			Some(field) => field.label(),
			None => name.to_string(),
		}
	}
}

impl fmt::Debug for FormConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormConfig")
			.field("model", &self.model.key)
			.field("fields", &self.field_names())
			.field("clean_hooks", &self.clean_hooks.len())
			.finish()
	}
}

/// A field bound to a form, ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
	pub name: String,
	pub html_name: String,
	pub label: String,
	pub field_type: crate::field::FieldType,
	pub widget: Widget,
	pub required: bool,
	pub help_text: Option<String>,
	pub value: String,
	pub choices: Vec<(String, String)>,
	pub errors: Vec<String>,
}

/// A form bound to optional submitted data and an optional instance
#[derive(Debug, Clone)]
pub struct Form {
	config: Arc<FormConfig>,
	prefix: Option<String>,
	data: Option<QueryDict>,
	files: FileDict,
	instance: Option<Record>,
	choices: Arc<ModelChoices>,
	errors: IndexMap<String, Vec<String>>,
	non_field_errors: Vec<String>,
	cleaned: Record,
	cleaned_once: bool,
}

impl Form {
	pub fn new(config: Arc<FormConfig>) -> Self {
		Self {
			config,
			prefix: None,
			data: None,
			files: FileDict::new(),
			instance: None,
			choices: Arc::new(ModelChoices::new()),
			errors: IndexMap::new(),
			non_field_errors: Vec::new(),
			cleaned: Record::new(),
			cleaned_once: false,
		}
	}

	/// Bind submitted data
	pub fn with_data(mut self, data: QueryDict) -> Self {
		self.data = Some(data);
		self.cleaned_once = false;
		self
	}

	/// Bind uploaded files, keyed by input name like the data
	pub fn with_files(mut self, files: FileDict) -> Self {
		self.files = files;
		self.cleaned_once = false;
		self
	}

	/// Edit an existing row
	pub fn with_instance(mut self, instance: Record) -> Self {
		self.instance = Some(instance);
		self
	}

	/// Namespace input names as `{prefix}-{field}`
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	pub fn with_choices(mut self, choices: Arc<ModelChoices>) -> Self {
		self.choices = choices;
		self
	}

	pub fn config(&self) -> &FormConfig {
		&self.config
	}

	pub fn instance(&self) -> Option<&Record> {
		self.instance.as_ref()
	}

	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_deref()
	}

	pub fn is_bound(&self) -> bool {
		self.data.is_some()
	}

	/// Input name of a field
	///
	/// # Examples
	///
	/// ```
	/// # use clarity_db::{FieldDef, ModelSchema};
	/// # use clarity_forms::{Form, FormConfig};
	/// # use indexmap::IndexMap;
	/// # use std::sync::Arc;
	/// # let schema = Arc::new(ModelSchema::new("blog", "Comment").field(FieldDef::text("body")));
	/// # let config = Arc::new(FormConfig::for_model(schema, &["body".into()], &IndexMap::new()).unwrap());
	/// let form = Form::new(config).with_prefix("comment_set-0");
	/// assert_eq!(form.add_prefix("body"), "comment_set-0-body");
	/// ```
	pub fn add_prefix(&self, name: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{prefix}-{name}"),
			None => name.to_string(),
		}
	}

	/// Submitted text for a field, if bound
	pub fn raw_value(&self, name: &str) -> Option<&str> {
		self.data.as_ref()?.get(&self.add_prefix(name))
	}

	/// File uploaded for a field
	pub fn file(&self, name: &str) -> Option<&UploadedFile> {
		self.files.get(&self.add_prefix(name))
	}

	pub fn files(&self) -> &FileDict {
		&self.files
	}

	/// Initial value of a field: the instance value, else the field initial
	pub fn initial_value(&self, name: &str) -> Option<Value> {
		if let Some(instance) = &self.instance
			&& let Some(value) = instance.get(name)
		{
			return Some(value.clone());
		}
		self.config.field(name).and_then(|f| f.initial.clone())
	}

	fn options_for(&self, name: &str) -> &[ChoiceOption] {
		self.choices.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Clean every field and run the clean hooks, once per binding
	pub fn full_clean(&mut self) {
		if self.cleaned_once {
			return;
		}
		self.cleaned_once = true;
		self.errors.clear();
		self.non_field_errors.clear();
		self.cleaned = Record::new();
		if !self.is_bound() {
			return;
		}

		let config = Arc::clone(&self.config);
		for field in &config.fields {
			let raw = self.raw_value(&field.name).map(str::to_string);
			match field.clean(raw.as_deref(), self.options_for(&field.name)) {
				Ok(value) => self.cleaned.set(field.name.clone(), value),
				Err(message) => self.add_error(Some(&field.name), message),
			}
		}

		for hook in &config.clean_hooks {
			if let Err(err) = hook(&self.cleaned) {
				match err {
					FormError::Field { field, message } => self.add_error(Some(&field), message),
					other => self.add_error(None, other.to_string()),
				}
			}
		}
	}

	/// Whether the form is bound and every field cleaned without error
	pub fn is_valid(&mut self) -> bool {
		self.full_clean();
		self.is_bound() && self.errors.is_empty() && self.non_field_errors.is_empty()
	}

	/// Record an error; `None` targets the form as a whole
	///
	/// A field error removes the field from the cleaned data.
	pub fn add_error(&mut self, field: Option<&str>, message: impl Into<String>) {
		match field {
			Some(name) => {
				self.cleaned.remove(name);
				self.errors
					.entry(name.to_string())
					.or_default()
					.push(message.into());
			}
			None => self.non_field_errors.push(message.into()),
		}
	}

	/// Field errors in the order they were raised
	pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
		&self.errors
	}

	pub fn non_field_errors(&self) -> &[String] {
		&self.non_field_errors
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty() || !self.non_field_errors.is_empty()
	}

	pub fn cleaned_data(&self) -> &Record {
		&self.cleaned
	}

	/// Whether the submitted data differs from the initial values
	pub fn has_changed(&self) -> bool {
		if !self.is_bound() {
			return false;
		}
		self.config.fields.iter().any(|field| {
			let initial = self.initial_value(&field.name);
			field.has_changed(initial.as_ref(), self.raw_value(&field.name))
		})
	}

	/// Display text of a field: submitted text when bound, else the initial value
	pub fn value_for(&self, name: &str) -> String {
		let Some(field) = self.config.field(name) else {
			return String::new();
		};
		if self.is_bound() {
			return self.raw_value(name).unwrap_or_default().to_string();
		}
		self.initial_value(name)
			.map(|value| field.prepare_value(&value))
			.unwrap_or_default()
	}

	/// Values to persist: the cleaned data of the form fields
	///
	/// Only meaningful after [`is_valid`](Self::is_valid) returned true.
	pub fn to_record(&self) -> Record {
		let mut record = Record::new();
		for field in &self.config.fields {
			if let Some(value) = self.cleaned.get(&field.name) {
				record.set(field.name.clone(), value.clone());
			}
		}
		record
	}

	/// Primary key of the bound instance
	pub fn instance_pk(&self) -> Option<i64> {
		self.instance.as_ref().and_then(Record::pk)
	}

	/// Rendering data for one field
	pub fn bound_field(&self, name: &str) -> Option<BoundField> {
		let field = self.config.field(name)?;
		let choices = match field.field_type {
			crate::field::FieldType::Choice => field
				.choices
				.iter()
				.map(|(value, label)| (field.prepare_value(value), label.clone()))
				.collect(),
			crate::field::FieldType::ModelChoice => self
				.options_for(name)
				.iter()
				.map(|option| (option.pk.to_string(), option.label.clone()))
				.collect(),
			_ => Vec::new(),
		};
		Some(BoundField {
			name: field.name.clone(),
			html_name: self.add_prefix(&field.name),
			label: field.label.clone(),
			field_type: field.field_type,
			widget: field.widget.clone(),
			required: field.required,
			help_text: field.help_text.clone(),
			value: self.value_for(name),
			choices,
			errors: self.errors.get(name).cloned().unwrap_or_default(),
		})
	}

	/// Every field, rendered, in form order
	pub fn bound_fields(&self) -> Vec<BoundField> {
		self.config
			.fields
			.iter()
			.filter_map(|field| self.bound_field(&field.name))
			.collect()
	}

	/// Hidden primary key input name for formset forms
	pub fn pk_input_name(&self) -> String {
		self.add_prefix(PK_FIELD)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clarity_db::FieldDef;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn config() -> Arc<FormConfig> {
		let schema = Arc::new(
			ModelSchema::new("blog", "Article")
				.field(FieldDef::char("title", 10))
				.field(FieldDef::integer("rating").blank(true).null(true)),
		);
		Arc::new(
			FormConfig::for_model(
				schema,
				&["title".to_string(), "rating".to_string()],
				&IndexMap::new(),
			)
			.unwrap(),
		)
	}

	fn data(pairs: &[(&str, &str)]) -> QueryDict {
		pairs.iter().map(|(k, v)| (*k, *v)).collect()
	}

	#[rstest]
	fn test_unbound_form_is_not_valid(config: Arc<FormConfig>) {
		let mut form = Form::new(config);
		assert!(!form.is_valid());
		assert!(!form.has_errors());
	}

	#[rstest]
	fn test_valid_form_cleans_values(config: Arc<FormConfig>) {
		// Arrange
		let mut form = Form::new(config).with_data(data(&[("title", "Hi"), ("rating", "4")]));

		// Act
		let valid = form.is_valid();

		// Assert
		assert!(valid);
		assert_eq!(form.to_record().get("rating"), Some(&json!(4)));
	}

	#[rstest]
	fn test_errors_follow_field_order(config: Arc<FormConfig>) {
		let mut form = Form::new(config).with_data(data(&[("rating", "x")]));
		assert!(!form.is_valid());
		let fields: Vec<&String> = form.errors().keys().collect();
		assert_eq!(fields, vec!["title", "rating"]);
		assert_eq!(form.errors()["title"], vec![crate::field::REQUIRED.to_string()]);
	}

	#[rstest]
	fn test_clean_hook_errors(config: Arc<FormConfig>) {
		// Arrange
		let config = Arc::new((*config).clone().with_clean_hook(Arc::new(|data: &Record| {
			if data.get("title") == Some(&json!("bad")) {
				return Err(FormError::Validation("Title is bad".into()));
			}
			Ok(())
		})));
		let mut form = Form::new(config).with_data(data(&[("title", "bad")]));

		// Act
		let valid = form.is_valid();

		// Assert
		assert!(!valid);
		assert_eq!(form.non_field_errors(), ["Title is bad".to_string()]);
	}

	#[rstest]
	fn test_prefixed_binding_and_change_detection(config: Arc<FormConfig>) {
		let instance = Record::from_pairs([
			("id", json!(1)),
			("title", json!("Hi")),
			("rating", Value::Null),
		]);
		let unchanged = Form::new(config.clone())
			.with_prefix("p-0")
			.with_instance(instance.clone())
			.with_data(data(&[("p-0-title", "Hi"), ("p-0-rating", "")]));
		let changed = Form::new(config)
			.with_prefix("p-0")
			.with_instance(instance)
			.with_data(data(&[("p-0-title", "Hey")]));

		assert!(!unchanged.has_changed());
		assert!(changed.has_changed());
	}

	#[rstest]
	fn test_uploaded_file_follows_prefix(config: Arc<FormConfig>) {
		// Arrange
		let mut files = FileDict::new();
		files.append(
			"p-0-cover",
			UploadedFile {
				filename: "cover.png".into(),
				content_type: Some("image/png".into()),
				data: "PNG".into(),
			},
		);

		// Act
		let form = Form::new(config)
			.with_prefix("p-0")
			.with_data(data(&[("p-0-title", "Hi")]))
			.with_files(files);

		// Assert
		assert_eq!(form.file("cover").map(|f| f.filename.as_str()), Some("cover.png"));
		assert!(form.file("title").is_none());
		assert_eq!(form.files().len(), 1);
	}

	#[rstest]
	fn test_value_for_unbound_uses_instance(config: Arc<FormConfig>) {
		let form = Form::new(config)
			.with_instance(Record::from_pairs([("title", json!("Hi")), ("rating", json!(3))]));
		assert_eq!(form.value_for("title"), "Hi");
		assert_eq!(form.value_for("rating"), "3");
		assert_eq!(form.bound_field("title").unwrap().html_name, "title");
	}
}
