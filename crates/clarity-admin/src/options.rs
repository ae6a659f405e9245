//! Per-model admin configuration
//!
//! These structs are plain data: built once with the `with_*` methods,
//! handed to [`AdminSite::register`](crate::AdminSite::register) and never
//! mutated afterwards.

use crate::views::{Action, ExtraColumns, ViewConfig};
use clarity_db::ModelSchema;
use clarity_forms::{CleanHook, Widget};
use clarity_http::Handler;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Builds the handler of one route from the model's view configuration
///
/// Registered with [`ModelAdmin::with_view`] to replace a default view; the
/// factory may wrap the default view it constructs itself.
pub type ViewFactory = Arc<dyn Fn(Arc<ViewConfig>) -> Arc<dyn Handler> + Send + Sync>;

/// Which model fields a form edits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldSelection {
	/// Every editable field except the primary key, in model order
	#[default]
	All,
	/// The listed fields, in this order
	Explicit(Vec<String>),
}

impl FieldSelection {
	pub fn explicit<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
		Self::Explicit(names.into_iter().map(Into::into).collect())
	}

	pub fn is_all(&self) -> bool {
		matches!(self, FieldSelection::All)
	}
}

/// Admin options for a registered model
///
/// # Examples
///
/// ```
/// use clarity_admin::{FieldSelection, ModelAdmin};
/// use clarity_forms::{Widget, WidgetKind};
///
/// let admin = ModelAdmin::new()
///     .with_fields(["title", "body", "created"])
///     .with_readonly_fields(["created"])
///     .with_widget("body", Widget::new(WidgetKind::RichText));
///
/// assert_eq!(admin.fields, FieldSelection::explicit(["title", "body", "created"]));
/// assert_eq!(admin.ordering, vec!["id"]);
/// ```
#[derive(Clone)]
pub struct ModelAdmin {
	pub fields: FieldSelection,
	pub readonly_fields: Vec<String>,
	pub widgets: IndexMap<String, Widget>,
	pub inlines: Vec<InlineModelAdmin>,
	/// Page size of the list view; the site default when unset
	pub list_per_page: Option<usize>,
	/// List ordering, `-field` for descending
	pub ordering: Vec<String>,
	pub clean_hooks: Vec<CleanHook>,
	/// Handlers replacing the default view of an action
	pub views: IndexMap<Action, ViewFactory>,
	/// Computed columns of the list page
	pub extra_columns: Option<Arc<dyn ExtraColumns>>,
}

impl Default for ModelAdmin {
	fn default() -> Self {
		Self {
			fields: FieldSelection::All,
			readonly_fields: Vec::new(),
			widgets: IndexMap::new(),
			inlines: Vec::new(),
			list_per_page: None,
			ordering: vec!["id".to_string()],
			clean_hooks: Vec::new(),
			views: IndexMap::new(),
			extra_columns: None,
		}
	}
}

impl ModelAdmin {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
		self.fields = FieldSelection::explicit(fields);
		self
	}

	pub fn with_readonly_fields<S: Into<String>>(
		mut self,
		fields: impl IntoIterator<Item = S>,
	) -> Self {
		self.readonly_fields = fields.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_widget(mut self, field: impl Into<String>, widget: impl Into<Widget>) -> Self {
		self.widgets.insert(field.into(), widget.into());
		self
	}

	pub fn with_inline(mut self, inline: InlineModelAdmin) -> Self {
		self.inlines.push(inline);
		self
	}

	pub fn with_list_per_page(mut self, count: usize) -> Self {
		self.list_per_page = Some(count);
		self
	}

	pub fn with_ordering<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
		self.ordering = fields.into_iter().map(Into::into).collect();
		self
	}

	/// Object-level validation for the parent form
	pub fn with_clean_hook(mut self, hook: CleanHook) -> Self {
		self.clean_hooks.push(hook);
		self
	}

	/// Serve `action` with the handler `factory` builds instead of the default view
	///
	/// # Examples
	///
	/// ```
	/// use clarity_admin::views::{Action, ListView, ViewConfig};
	/// use clarity_admin::ModelAdmin;
	/// use clarity_http::Handler;
	/// use std::sync::Arc;
	///
	/// let admin = ModelAdmin::new().with_view(
	///     Action::Index,
	///     Arc::new(|config: Arc<ViewConfig>| -> Arc<dyn Handler> { Arc::new(ListView::new(config)) }),
	/// );
	/// assert!(admin.views.contains_key(&Action::Index));
	/// ```
	pub fn with_view(mut self, action: Action, factory: ViewFactory) -> Self {
		self.views.insert(action, factory);
		self
	}

	pub fn with_extra_columns(mut self, columns: Arc<dyn ExtraColumns>) -> Self {
		self.extra_columns = Some(columns);
		self
	}
}

impl fmt::Debug for ModelAdmin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelAdmin")
			.field("fields", &self.fields)
			.field("readonly_fields", &self.readonly_fields)
			.field("widgets", &self.widgets.keys().collect::<Vec<_>>())
			.field("inlines", &self.inlines)
			.field("list_per_page", &self.list_per_page)
			.field("ordering", &self.ordering)
			.field("clean_hooks", &self.clean_hooks.len())
			.field("views", &self.views.keys().collect::<Vec<_>>())
			.field("extra_columns", &self.extra_columns.is_some())
			.finish()
	}
}

/// A child model edited on its parent's update page
#[derive(Debug, Clone)]
pub struct InlineModelAdmin {
	pub model: Arc<ModelSchema>,
	pub fields: FieldSelection,
	pub readonly_fields: Vec<String>,
	pub widgets: IndexMap<String, Widget>,
	/// Blank forms after the existing children; the site default when unset
	pub extra: Option<usize>,
	/// The foreign key back to the parent, needed only when there are several
	pub fk_name: Option<String>,
	pub can_delete: bool,
}

impl InlineModelAdmin {
	pub fn new(model: impl Into<Arc<ModelSchema>>) -> Self {
		Self {
			model: model.into(),
			fields: FieldSelection::All,
			readonly_fields: Vec::new(),
			widgets: IndexMap::new(),
			extra: None,
			fk_name: None,
			can_delete: true,
		}
	}

	pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
		self.fields = FieldSelection::explicit(fields);
		self
	}

	pub fn with_readonly_fields<S: Into<String>>(
		mut self,
		fields: impl IntoIterator<Item = S>,
	) -> Self {
		self.readonly_fields = fields.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_widget(mut self, field: impl Into<String>, widget: impl Into<Widget>) -> Self {
		self.widgets.insert(field.into(), widget.into());
		self
	}

	pub fn with_extra(mut self, extra: usize) -> Self {
		self.extra = Some(extra);
		self
	}

	pub fn with_fk_name(mut self, fk_name: impl Into<String>) -> Self {
		self.fk_name = Some(fk_name.into());
		self
	}

	pub fn with_can_delete(mut self, can_delete: bool) -> Self {
		self.can_delete = can_delete;
		self
	}
}
