//! Field layouts: which fields a page shows, in which order, and which of
//! them are read-only

use crate::error::{ConfigurationError, ConfigurationResult};
use crate::options::FieldSelection;
use clarity_db::schema::display_value;
use clarity_db::{FieldDef, ModelKey, ModelSchema};
use clarity_forms::{BoundField, Form};
use serde::Serialize;
use serde_json::Value;

pub const COL_MD_WIDTH_ATTR: &str = "col_md_width";
const FULL_WIDTH: &str = "12";
const HALF_WIDTH: &str = "6";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutEntry {
	/// Rendered through the form
	Field { name: String },
	/// Displayed from the instance; never bound to submitted data
	ReadOnly { name: String, label: String },
}

impl LayoutEntry {
	pub fn name(&self) -> &str {
		match self {
			LayoutEntry::Field { name } | LayoutEntry::ReadOnly { name, .. } => name,
		}
	}

	pub fn is_readonly(&self) -> bool {
		matches!(self, LayoutEntry::ReadOnly { .. })
	}
}

/// Ordered layout entries; immutable once resolved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldLayout {
	entries: Vec<LayoutEntry>,
}

/// One rendered layout position for a specific form
#[derive(Debug, Clone, Serialize)]
pub struct LayoutCell {
	pub name: String,
	pub label: String,
	pub readonly: bool,
	pub col_md_width: String,
	/// The bound form field, for editable entries
	pub field: Option<BoundField>,
	/// The display value, for read-only entries
	pub value: Option<String>,
}

impl FieldLayout {
	pub fn new(entries: Vec<LayoutEntry>) -> Self {
		Self { entries }
	}

	pub fn entries(&self) -> &[LayoutEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn names(&self) -> Vec<&str> {
		self.entries.iter().map(LayoutEntry::name).collect()
	}

	/// Names the form edits
	pub fn editable_names(&self) -> Vec<String> {
		self.entries
			.iter()
			.filter(|entry| !entry.is_readonly())
			.map(|entry| entry.name().to_string())
			.collect()
	}

	/// Render the layout for `form`
	///
	/// Read-only values come from the form's instance. The width hint is the
	/// widget's `col_md_width` attribute when set, else `12` for the last cell
	/// of an odd-length layout and `6` otherwise.
	pub fn cells(&self, form: &Form) -> Vec<LayoutCell> {
		let model = &form.config().model;
		let visible: Vec<(&LayoutEntry, Option<BoundField>)> = self
			.entries
			.iter()
			.filter_map(|entry| match entry {
				LayoutEntry::Field { name } => form.bound_field(name).map(|bf| (entry, Some(bf))),
				LayoutEntry::ReadOnly { .. } => Some((entry, None)),
			})
			.collect();
		let count = visible.len();

		visible
			.into_iter()
			.enumerate()
			.map(|(index, (entry, field))| {
				let default_width = if count % 2 == 1 && index == count - 1 {
					FULL_WIDTH
				} else {
					HALF_WIDTH
				};
				let col_md_width = field
					.as_ref()
					.and_then(|bf| bf.widget.attr(COL_MD_WIDTH_ATTR))
					.unwrap_or(default_width)
					.to_string();
				match entry {
					LayoutEntry::Field { name } => LayoutCell {
						name: name.clone(),
						label: field.as_ref().map(|bf| bf.label.clone()).unwrap_or_default(),
						readonly: false,
						col_md_width,
						field,
						value: None,
					},
					LayoutEntry::ReadOnly { name, label } => LayoutCell {
						name: name.clone(),
						label: label.clone(),
						readonly: true,
						col_md_width,
						field: None,
						value: Some(readonly_value(model, form, name)),
					},
				}
			})
			.collect()
	}
}

fn readonly_value(model: &ModelSchema, form: &Form, name: &str) -> String {
	let value = form
		.instance()
		.and_then(|instance| instance.get(name))
		.unwrap_or(&Value::Null);
	match model.choice_label(name, value) {
		Some(label) => label.to_string(),
		None => display_value(value),
	}
}

fn points_to(field: &FieldDef, parent: Option<&ModelKey>) -> bool {
	parent.is_some_and(|parent| field.kind.related_model() == Some(parent))
}

/// Resolve the layout of `model` for a field selection
///
/// `parent` is set for inlines: fields pointing back to it are left out, as
/// is the primary key.
///
/// # Examples
///
/// ```
/// use clarity_admin::{FieldSelection, LayoutEntry, resolve_layout};
/// use clarity_db::{FieldDef, ModelSchema};
///
/// let model = ModelSchema::new("blog", "Article")
///     .field(FieldDef::char("title", 200))
///     .field(FieldDef::datetime("created").editable(false));
///
/// let layout = resolve_layout(&model, &FieldSelection::All, &[], None).unwrap();
/// assert_eq!(layout.names(), vec!["title"]);
///
/// let fields = FieldSelection::explicit(["created", "title"]);
/// let layout = resolve_layout(&model, &fields, &["created".to_string()], None).unwrap();
/// assert!(layout.entries()[0].is_readonly());
/// assert_eq!(layout.entries()[1], LayoutEntry::Field { name: "title".into() });
/// ```
pub fn resolve_layout(
	model: &ModelSchema,
	fields: &FieldSelection,
	readonly_fields: &[String],
	parent: Option<&ModelKey>,
) -> ConfigurationResult<FieldLayout> {
	let unknown = |name: &str| ConfigurationError::UnknownField {
		model: model.object_name.clone(),
		field: name.to_string(),
	};

	match fields {
		FieldSelection::All => {
			if let Some(name) = readonly_fields.iter().find(|n| model.get_field(n).is_none()) {
				return Err(unknown(name));
			}
			let entries = model
				.fields
				.iter()
				.filter(|f| f.editable && !f.is_primary_key() && !points_to(f, parent))
				.map(|f| LayoutEntry::Field {
					name: f.name.clone(),
				})
				.collect();
			Ok(FieldLayout::new(entries))
		}
		FieldSelection::Explicit(names) => {
			if let Some(name) = readonly_fields.iter().find(|n| !names.contains(n)) {
				return Err(ConfigurationError::ReadOnlyNotInFields {
					model: model.object_name.clone(),
					field: name.clone(),
				});
			}
			let mut entries = Vec::with_capacity(names.len());
			for name in names {
				let field = model.get_field(name).ok_or_else(|| unknown(name))?;
				if field.is_primary_key() || points_to(field, parent) {
					continue;
				}
				let entry = if readonly_fields.contains(name) {
					LayoutEntry::ReadOnly {
						name: name.clone(),
						label: field.label(),
					}
				} else {
					LayoutEntry::Field { name: name.clone() }
				};
				entries.push(entry);
			}
			Ok(FieldLayout::new(entries))
		}
	}
}
