//! Form and formset types derived from admin options

use crate::error::{ConfigurationError, ConfigurationResult};
use crate::layout::{FieldLayout, resolve_layout};
use crate::options::{InlineModelAdmin, ModelAdmin};
use clarity_db::{FieldDef, ModelSchema};
use clarity_forms::{FormConfig, FormsetConfig};
use std::sync::Arc;

/// A formset type together with the layout its forms render with
#[derive(Debug, Clone)]
pub struct InlineFormset {
	pub config: Arc<FormsetConfig>,
	pub layout: FieldLayout,
}

/// Form type editing the editable entries of `layout`
///
/// Read-only entries stay out of the form; they are rendered from the
/// instance through the layout.
pub fn build_form(
	model: Arc<ModelSchema>,
	admin: &ModelAdmin,
	layout: &FieldLayout,
) -> ConfigurationResult<Arc<FormConfig>> {
	let mut config = FormConfig::for_model(model, &layout.editable_names(), &admin.widgets)?;
	for hook in &admin.clean_hooks {
		config = config.with_clean_hook(Arc::clone(hook));
	}
	Ok(Arc::new(config))
}

/// Find the foreign key from an inline's model to its parent
fn parent_fk<'a>(
	parent: &ModelSchema,
	inline: &'a InlineModelAdmin,
) -> ConfigurationResult<&'a FieldDef> {
	let child = &inline.model;
	if let Some(fk_name) = &inline.fk_name {
		return child
			.get_field(fk_name)
			.filter(|f| f.kind.related_model() == Some(&parent.key))
			.ok_or_else(|| ConfigurationError::InvalidForeignKey {
				parent: parent.key.to_string(),
				child: child.key.to_string(),
				fk_name: fk_name.clone(),
			});
	}
	match child.foreign_keys_to(&parent.key).as_slice() {
		[fk] => Ok(*fk),
		[] => Err(ConfigurationError::NoForeignKey {
			parent: parent.key.to_string(),
			child: child.key.to_string(),
		}),
		_ => Err(ConfigurationError::AmbiguousForeignKey {
			parent: parent.key.to_string(),
			child: child.key.to_string(),
		}),
	}
}

/// One formset type per inline, bound through the child's key to `parent`
///
/// `default_extra` applies to inlines that leave `extra` unset.
pub fn build_formsets(
	parent: &ModelSchema,
	inlines: &[InlineModelAdmin],
	default_extra: usize,
) -> ConfigurationResult<Vec<InlineFormset>> {
	inlines
		.iter()
		.map(|inline| {
			let fk = parent_fk(parent, inline)?;
			let layout = resolve_layout(
				&inline.model,
				&inline.fields,
				&inline.readonly_fields,
				Some(&parent.key),
			)?;
			let form = FormConfig::for_model(
				Arc::clone(&inline.model),
				&layout.editable_names(),
				&inline.widgets,
			)?;
			let config = FormsetConfig::new(Arc::clone(&inline.model), fk.name.clone(), Arc::new(form))
				.with_extra(inline.extra.unwrap_or(default_extra))
				.with_can_delete(inline.can_delete);
			Ok(InlineFormset {
				config: Arc::new(config),
				layout,
			})
		})
		.collect()
}
