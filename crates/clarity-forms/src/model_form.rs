//! Model field to form field mapping

use crate::error::{FormError, FormResult};
use crate::field::{FieldSpec, FieldType};
use crate::widget::Widget;
use clarity_db::{FieldDef, FieldKind, ModelSchema};
use indexmap::IndexMap;

/// Form field for one model field
///
/// Returns `None` for the primary key, which forms never edit.
///
/// # Examples
///
/// ```
/// use clarity_db::FieldDef;
/// use clarity_forms::{FieldType, WidgetKind, form_field_for};
///
/// let field = form_field_for(&FieldDef::char("title", 80), None).unwrap();
/// assert_eq!(field.field_type, FieldType::Char);
/// assert_eq!(field.max_length, Some(80));
///
/// let field = form_field_for(&FieldDef::text("body"), None).unwrap();
/// assert_eq!(field.widget.kind, WidgetKind::Textarea);
/// ```
pub fn form_field_for(def: &FieldDef, widget: Option<&Widget>) -> Option<FieldSpec> {
	let field_type = match &def.kind {
		FieldKind::AutoId => return None,
		_ if !def.choices.is_empty() => FieldType::Choice,
		FieldKind::Char { .. } => FieldType::Char,
		FieldKind::Text => FieldType::Text,
		FieldKind::Integer => FieldType::Integer,
		FieldKind::Float => FieldType::Float,
		FieldKind::Boolean => FieldType::Boolean,
		FieldKind::Date => FieldType::Date,
		FieldKind::DateTime => FieldType::DateTime,
		FieldKind::ForeignKey { .. } => FieldType::ModelChoice,
	};

	let mut spec = FieldSpec::new(def.name.clone(), field_type)
		.with_label(def.label())
		.required(!def.blank && field_type != FieldType::Boolean)
		.with_null(def.null)
		.with_choices(def.choices.clone());
	if let FieldKind::Char { max_length } = def.kind {
		spec = spec.with_max_length(max_length);
	}
	if let Some(help_text) = &def.help_text {
		spec = spec.with_help_text(help_text.clone());
	}
	if let Some(initial) = &def.default {
		spec = spec.with_initial(initial.clone());
	}
	if let Some(widget) = widget {
		spec = spec.with_widget(widget.clone());
	}
	Some(spec)
}

/// Form fields for `names` of `schema`, in the given order
///
/// Unknown names fail with [`FormError::UnknownField`] and non-editable
/// fields (the primary key included) with [`FormError::NonEditableField`].
pub fn fields_for_model(
	schema: &ModelSchema,
	names: &[String],
	widgets: &IndexMap<String, Widget>,
) -> FormResult<Vec<FieldSpec>> {
	let mut fields = Vec::with_capacity(names.len());
	for name in names {
		let def = schema.get_field(name).ok_or_else(|| FormError::UnknownField {
			model: schema.object_name.clone(),
			field: name.clone(),
		})?;
		let non_editable = || FormError::NonEditableField {
			model: schema.object_name.clone(),
			field: name.clone(),
		};
		if !def.editable {
			return Err(non_editable());
		}
		let spec = form_field_for(def, widgets.get(name)).ok_or_else(non_editable)?;
		fields.push(spec);
	}
	Ok(fields)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::widget::WidgetKind;
	use clarity_db::{ModelKey, OnDelete};
	use rstest::rstest;

	fn schema() -> ModelSchema {
		ModelSchema::new("blog", "Article")
			.field(FieldDef::char("title", 100))
			.field(FieldDef::char("status", 1).choices([("d", "Draft")]))
			.field(FieldDef::foreign_key(
				"author",
				ModelKey::new("blog", "Author"),
				OnDelete::Cascade,
			))
			.field(FieldDef::boolean("published"))
			.field(FieldDef::datetime("created").editable(false))
	}

	#[rstest]
	#[case("status", FieldType::Choice)]
	#[case("author", FieldType::ModelChoice)]
	#[case("published", FieldType::Boolean)]
	fn test_field_types(#[case] name: &str, #[case] expected: FieldType) {
		let fields = fields_for_model(&schema(), &[name.to_string()], &IndexMap::new()).unwrap();
		assert_eq!(fields[0].field_type, expected);
	}

	#[rstest]
	fn test_boolean_is_optional() {
		let fields =
			fields_for_model(&schema(), &["published".to_string()], &IndexMap::new()).unwrap();
		assert!(!fields[0].required);
	}

	#[rstest]
	fn test_widget_override() {
		let widgets = IndexMap::from([("title".to_string(), Widget::new(WidgetKind::RichText))]);
		let fields = fields_for_model(&schema(), &["title".to_string()], &widgets).unwrap();
		assert!(fields[0].widget.is_rich_text());
	}

	#[rstest]
	#[case("nope")]
	#[case("created")]
	#[case("id")]
	fn test_rejected_names(#[case] name: &str) {
		let result = fields_for_model(&schema(), &[name.to_string()], &IndexMap::new());
		assert!(result.is_err());
	}

	#[rstest]
	fn test_unknown_field_message() {
		let err = fields_for_model(&schema(), &["nope".to_string()], &IndexMap::new()).unwrap_err();
		assert_eq!(err.to_string(), "Unknown field(s) (nope) specified for Article");
	}
}
