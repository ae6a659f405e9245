//! Inline formsets: child rows edited together with their parent
//!
//! Input names follow the management form convention:
//!
//! - `{prefix}-TOTAL_FORMS`, `{prefix}-INITIAL_FORMS`,
//!   `{prefix}-MIN_NUM_FORMS`, `{prefix}-MAX_NUM_FORMS`
//! - `{prefix}-{i}-{field}` for the fields of form `i`
//! - `{prefix}-{i}-id` for the primary key of an existing child
//! - `{prefix}-{i}-DELETE` to delete that child

use crate::field::{INVALID_MODEL_CHOICE, is_truthy};
use crate::form::{Form, FormConfig, ModelChoices};
use clarity_db::{ModelSchema, PK_FIELD, Record, WriteOp};
use clarity_http::{FileDict, QueryDict};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const TOTAL_FORMS: &str = "TOTAL_FORMS";
pub const INITIAL_FORMS: &str = "INITIAL_FORMS";
pub const MIN_NUM_FORMS: &str = "MIN_NUM_FORMS";
pub const MAX_NUM_FORMS: &str = "MAX_NUM_FORMS";
pub const DELETION_FIELD: &str = "DELETE";

pub const DEFAULT_EXTRA: usize = 3;
pub const DEFAULT_MAX_NUM: usize = 1000;

pub const MANAGEMENT_FORM_ERROR: &str = "ManagementForm data is missing or has been tampered with.";

/// A formset type: child model, the key back to the parent, and its form
#[derive(Debug, Clone)]
pub struct FormsetConfig {
	pub child: Arc<ModelSchema>,
	pub fk_name: String,
	pub form: Arc<FormConfig>,
	pub prefix: String,
	pub extra: usize,
	pub can_delete: bool,
	pub max_num: usize,
}

impl FormsetConfig {
	/// Formset type with the default prefix `{child model}_set`
	///
	/// # Examples
	///
	/// ```
	/// use clarity_db::{FieldDef, ModelKey, ModelSchema, OnDelete};
	/// use clarity_forms::{FormConfig, FormsetConfig};
	/// use indexmap::IndexMap;
	/// use std::sync::Arc;
	///
	/// let child = Arc::new(
	///     ModelSchema::new("blog", "Comment")
	///         .field(FieldDef::foreign_key("article", ModelKey::new("blog", "Article"), OnDelete::Cascade))
	///         .field(FieldDef::text("body")),
	/// );
	/// let form = Arc::new(FormConfig::for_model(child.clone(), &["body".into()], &IndexMap::new()).unwrap());
	/// let config = FormsetConfig::new(child, "article", form);
	///
	/// assert_eq!(config.prefix, "comment_set");
	/// assert_eq!(config.extra, 3);
	/// ```
	pub fn new(child: Arc<ModelSchema>, fk_name: impl Into<String>, form: Arc<FormConfig>) -> Self {
		Self {
			prefix: format!("{}_set", child.key.model_name),
			child,
			fk_name: fk_name.into(),
			form,
			extra: DEFAULT_EXTRA,
			can_delete: true,
			max_num: DEFAULT_MAX_NUM,
		}
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	pub fn with_extra(mut self, extra: usize) -> Self {
		self.extra = extra;
		self
	}

	pub fn with_can_delete(mut self, can_delete: bool) -> Self {
		self.can_delete = can_delete;
		self
	}

	pub fn with_max_num(mut self, max_num: usize) -> Self {
		self.max_num = max_num;
		self
	}

	fn key(&self, name: &str) -> String {
		format!("{}-{}", self.prefix, name)
	}
}

/// Management form values, as rendered into hidden inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagementForm {
	pub total_forms: usize,
	pub initial_forms: usize,
	pub min_num_forms: usize,
	pub max_num_forms: usize,
}

/// Child forms of one parent instance
#[derive(Debug, Clone)]
pub struct InlineFormSet {
	config: Arc<FormsetConfig>,
	data: Option<QueryDict>,
	forms: Vec<Form>,
	initial_count: usize,
	/// Initial forms whose submitted id matched no existing child
	unmatched: Vec<usize>,
	non_form_errors: Vec<String>,
	validated: Option<bool>,
}

impl InlineFormSet {
	/// Build the formset for the children of a parent
	///
	/// `existing` are the current child rows. Unbound formsets render one
	/// form per existing child followed by `extra` blank forms; bound
	/// formsets take the form count from the management form.
	pub fn new(
		config: Arc<FormsetConfig>,
		existing: Vec<Record>,
		data: Option<QueryDict>,
		choices: Arc<ModelChoices>,
	) -> Self {
		let mut formset = Self {
			config,
			data: None,
			forms: Vec::new(),
			initial_count: 0,
			unmatched: Vec::new(),
			non_form_errors: Vec::new(),
			validated: None,
		};
		match data {
			None => formset.build_unbound(existing, choices),
			Some(data) => formset.build_bound(existing, data, choices),
		}
		formset
	}

	fn new_form(&self, index: usize, choices: &Arc<ModelChoices>) -> Form {
		Form::new(Arc::clone(&self.config.form))
			.with_prefix(format!("{}-{}", self.config.prefix, index))
			.with_choices(Arc::clone(choices))
	}

	fn build_unbound(&mut self, existing: Vec<Record>, choices: Arc<ModelChoices>) {
		let existing: Vec<Record> = existing.into_iter().take(self.config.max_num).collect();
		self.initial_count = existing.len();
		let extra = self
			.config
			.extra
			.min(self.config.max_num.saturating_sub(self.initial_count));
		for (index, child) in existing.into_iter().enumerate() {
			let form = self.new_form(index, &choices).with_instance(child);
			self.forms.push(form);
		}
		for offset in 0..extra {
			let form = self.new_form(self.initial_count + offset, &choices);
			self.forms.push(form);
		}
	}

	fn build_bound(&mut self, existing: Vec<Record>, data: QueryDict, choices: Arc<ModelChoices>) {
		let count = |name: &str| data.get(&self.config.key(name))?.trim().parse::<usize>().ok();
		let (Some(total), Some(initial)) = (count(TOTAL_FORMS), count(INITIAL_FORMS)) else {
			tracing::debug!(prefix = %self.config.prefix, "management form missing from submission");
			self.non_form_errors.push(MANAGEMENT_FORM_ERROR.to_string());
			self.data = Some(data);
			return;
		};

		let max_num = self.config.max_num;
		if total > max_num {
			self.non_form_errors
				.push(format!("Please submit at most {max_num} forms."));
		}
		let total = total.min(max_num);
		self.initial_count = initial.min(total);

		for index in 0..total {
			let mut form = self.new_form(index, &choices).with_data(data.clone());
			if index < self.initial_count {
				let submitted_pk = data
					.get(&format!("{}-{}-{}", self.config.prefix, index, PK_FIELD))
					.and_then(|raw| raw.trim().parse::<i64>().ok());
				match submitted_pk.and_then(|pk| existing.iter().find(|c| c.pk() == Some(pk))) {
					Some(child) => form = form.with_instance(child.clone()),
					None => self.unmatched.push(index),
				}
			}
			self.forms.push(form);
		}
		self.data = Some(data);
	}

	/// Bind uploaded files to every form
	pub fn with_files(mut self, files: &FileDict) -> Self {
		self.forms = self
			.forms
			.into_iter()
			.map(|form| form.with_files(files.clone()))
			.collect();
		self.validated = None;
		self
	}

	pub fn config(&self) -> &FormsetConfig {
		&self.config
	}

	pub fn prefix(&self) -> &str {
		&self.config.prefix
	}

	pub fn is_bound(&self) -> bool {
		self.data.is_some()
	}

	pub fn forms(&self) -> &[Form] {
		&self.forms
	}

	pub fn initial_form_count(&self) -> usize {
		self.initial_count
	}

	pub fn management_form(&self) -> ManagementForm {
		ManagementForm {
			total_forms: self.forms.len(),
			initial_forms: self.initial_count,
			min_num_forms: 0,
			max_num_forms: self.config.max_num,
		}
	}

	pub fn non_form_errors(&self) -> &[String] {
		&self.non_form_errors
	}

	/// Whether form `index` is flagged for deletion
	pub fn is_deleted(&self, index: usize) -> bool {
		if !self.config.can_delete {
			return false;
		}
		self.forms
			.get(index)
			.and_then(|form| form.raw_value(DELETION_FIELD))
			.is_some_and(is_truthy)
	}

	fn is_extra(&self, index: usize) -> bool {
		index >= self.initial_count
	}

	/// Whether form `index` takes part in validation and saving
	fn is_active(&self, index: usize) -> bool {
		match self.forms.get(index) {
			Some(form) => !self.is_deleted(index) && (!self.is_extra(index) || form.has_changed()),
			None => false,
		}
	}

	/// Validate every active form
	///
	/// Deleted forms and untouched extra forms are skipped.
	pub fn is_valid(&mut self) -> bool {
		if let Some(valid) = self.validated {
			return valid;
		}
		if !self.is_bound() {
			return false;
		}
		let mut valid = self.non_form_errors.is_empty();
		for index in 0..self.forms.len() {
			if !self.is_active(index) {
				continue;
			}
			let form = &mut self.forms[index];
			let mut form_valid = form.is_valid();
			if self.unmatched.contains(&index) {
				form.add_error(None, INVALID_MODEL_CHOICE);
				form_valid = false;
			}
			valid &= form_valid;
		}
		self.validated = Some(valid);
		valid
	}

	/// Whether any active form carries errors
	pub fn has_errors(&self) -> bool {
		!self.non_form_errors.is_empty() || self.forms.iter().any(Form::has_errors)
	}

	/// Writes that bring the children of `parent_pk` in line with the submission
	///
	/// Deleted existing children are deleted, changed ones updated and changed
	/// extra forms inserted with the foreign key set to the parent. Call after
	/// [`is_valid`](Self::is_valid) returned true.
	pub fn save_ops(&self, parent_pk: i64) -> Vec<WriteOp> {
		let mut ops = Vec::new();
		for (index, form) in self.forms.iter().enumerate() {
			let existing_pk = if self.is_extra(index) { None } else { form.instance_pk() };
			if self.is_deleted(index) {
				if let Some(pk) = existing_pk {
					ops.push(WriteOp::Delete {
						schema: Arc::clone(&self.config.child),
						pk,
					});
				}
				continue;
			}
			if !form.has_changed() {
				continue;
			}
			let mut values = form.to_record();
			values.set(self.config.fk_name.clone(), Value::from(parent_pk));
			match existing_pk {
				Some(pk) => ops.push(WriteOp::Update {
					schema: Arc::clone(&self.config.child),
					pk,
					values,
				}),
				None => ops.push(WriteOp::Insert {
					schema: Arc::clone(&self.config.child),
					values,
				}),
			}
		}
		ops
	}
}
