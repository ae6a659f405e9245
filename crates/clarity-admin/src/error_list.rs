//! Flatten form and formset errors into one ordered list of messages

use clarity_forms::{Form, InlineFormSet};

/// Errors of one form
///
/// Non-field errors come first, verbatim, then `"{label}: {error}"` per
/// field in the order the errors were raised.
pub fn form_errors(form: &Form) -> Vec<String> {
	let mut all = form.non_field_errors().to_vec();
	for (field, errors) in form.errors() {
		let label = form.config().label_for(field);
		all.extend(errors.iter().map(|error| format!("{label}: {error}")));
	}
	all
}

/// Errors of a formset
///
/// Non-form errors first, then per child form its non-field errors as
/// `"{title}: {error}"` and its field errors as `"{title} - {label}: {error}"`.
/// The title is the instance's string form for existing children and
/// `"{ModelName} {n}"` (1-based) otherwise.
pub fn formset_errors(formset: &InlineFormSet) -> Vec<String> {
	let mut all = formset.non_form_errors().to_vec();
	let child = &formset.config().child;
	for (index, form) in formset.forms().iter().enumerate() {
		if !form.has_errors() {
			continue;
		}
		let title = match form.instance() {
			Some(instance) if instance.pk().is_some() => child.display_record(instance),
			_ => format!("{} {}", child.object_name, index + 1),
		};
		all.extend(
			form.non_field_errors()
				.iter()
				.map(|error| format!("{title}: {error}")),
		);
		for (field, errors) in form.errors() {
			let label = form.config().label_for(field);
			all.extend(
				errors
					.iter()
					.map(|error| format!("{title} - {label}: {error}")),
			);
		}
	}
	all
}

#[cfg(test)]
mod tests {
	use super::*;
	use clarity_db::{FieldDef, ModelKey, ModelSchema, OnDelete, Record};
	use clarity_forms::{FormConfig, FormsetConfig};
	use clarity_http::QueryDict;
	use indexmap::IndexMap;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::Arc;

	#[rstest]
	fn test_non_field_errors_come_first() {
		// Arrange
		let model = Arc::new(ModelSchema::new("blog", "Article").field(FieldDef::char("title", 10)));
		let config = Arc::new(FormConfig::for_model(model, &["title".into()], &IndexMap::new()).unwrap());
		let mut form = Form::new(config).with_data(QueryDict::new());
		form.is_valid();
		form.add_error(None, "X");

		// Act
		let errors = form_errors(&form);

		// Assert
		assert_eq!(errors, vec!["X", "Title: This field is required."]);
	}

	#[rstest]
	fn test_formset_titles() {
		// Arrange
		let child = Arc::new(
			ModelSchema::new("blog", "Comment")
				.field(FieldDef::foreign_key(
					"article",
					ModelKey::new("blog", "Article"),
					OnDelete::Cascade,
				))
				.field(FieldDef::char("body", 5))
				.display_field("body"),
		);
		let form = Arc::new(FormConfig::for_model(child.clone(), &["body".into()], &IndexMap::new()).unwrap());
		let config = Arc::new(FormsetConfig::new(child, "article", form).with_prefix("c"));
		let existing = vec![Record::from_pairs([
			("id", json!(4)),
			("article", json!(1)),
			("body", json!("old")),
		])];
		let data: QueryDict = [
			("c-TOTAL_FORMS", "2"),
			("c-INITIAL_FORMS", "1"),
			("c-0-id", "4"),
			("c-0-body", "too long"),
			("c-1-body", "also too long"),
		]
		.into_iter()
		.collect();
		let mut formset = InlineFormSet::new(config, existing, Some(data), Arc::default());
		formset.is_valid();

		// Act
		let errors = formset_errors(&formset);

		// Assert
		assert_eq!(
			errors,
			vec![
				"old - Body: Ensure this value has at most 5 characters (it has 8).",
				"Comment 2 - Body: Ensure this value has at most 5 characters (it has 13).",
			]
		);
	}
}
