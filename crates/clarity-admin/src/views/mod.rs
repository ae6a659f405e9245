//! CRUD view set
//!
//! Every model gets one handler per action. The handlers share a
//! [`ViewConfig`] holding the form type, layouts, formset types, route
//! namespace and the injected store, resolver and renderer.

mod create;
mod delete;
mod index;
mod list;
mod update;

pub use create::CreateView;
pub use delete::DeleteView;
pub use index::{AppIndexView, SiteIndexView, app_index_name, site_index_name};
pub use list::{ExtraColumns, LEGACY_SEARCH_PARAM, ListView, PAGE_PARAM, Pagination, SEARCH_PARAM};
pub use update::UpdateView;

use crate::error::{AdminError, AdminResult, ConfigurationError, ConfigurationResult};
use crate::factory::InlineFormset;
use crate::layout::FieldLayout;
use crate::render::Renderer;
use clarity_conf::AdminSettings;
use clarity_core::exception::Error;
use clarity_db::{
	FieldDef, Filter, FilterCondition, ListQuery, ModelKey, ModelSchema, ModelStore, OrderBy, PK_FIELD,
};
use clarity_forms::{ChoiceOption, FieldType, FormConfig, ModelChoices};
use clarity_http::{Request, Response};
use clarity_urls::UrlResolver;
use hyper::StatusCode;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Schemas that foreign keys may point at, by model key
pub type RelatedModels = IndexMap<ModelKey, Arc<ModelSchema>>;

pub(crate) const ALLOWED_METHODS: &[&str] = &["GET", "POST"];

/// Route actions of a model, the last segment of its route names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	Create,
	Delete,
	Index,
	Update,
}

impl Action {
	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Create => "create",
			Action::Delete => "delete",
			Action::Index => "index",
			Action::Update => "update",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Route name of `action` for `model`: `{namespace}-{app_label}-{model_name}-{action}`
///
/// # Examples
///
/// ```
/// use clarity_admin::views::{Action, route_name};
/// use clarity_db::ModelKey;
///
/// let key = ModelKey::new("blog", "Article");
/// assert_eq!(route_name("clarity", &key, Action::Update), "clarity-blog-article-update");
/// ```
pub fn route_name(namespace: &str, model: &ModelKey, action: Action) -> String {
	format!(
		"{}-{}-{}-{}",
		namespace, model.app_label, model.model_name, action
	)
}

/// Everything a model's views are parameterized with
pub struct ViewConfig {
	pub model: Arc<ModelSchema>,
	pub form: Arc<FormConfig>,
	pub layout: FieldLayout,
	pub formsets: Vec<InlineFormset>,
	pub namespace: String,
	pub list_per_page: usize,
	pub ordering: Vec<String>,
	/// Submitted values blanked before binding on update
	pub empty_editor_values: Vec<String>,
	pub extra_columns: Option<Arc<dyn ExtraColumns>>,
	store: Arc<dyn ModelStore>,
	resolver: Arc<UrlResolver>,
	renderer: Arc<dyn Renderer>,
	related: Arc<RelatedModels>,
}

impl fmt::Debug for ViewConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ViewConfig")
			.field("model", &self.model.key)
			.field("layout", &self.layout)
			.field("formsets", &self.formsets.len())
			.field("namespace", &self.namespace)
			.field("list_per_page", &self.list_per_page)
			.finish_non_exhaustive()
	}
}

impl ViewConfig {
	pub fn builder() -> ViewConfigBuilder {
		ViewConfigBuilder::default()
	}

	pub fn url_name(&self, action: Action) -> String {
		route_name(&self.namespace, &self.model.key, action)
	}

	/// Path of `action`, for the object `pk` when the route takes one
	pub fn reverse(&self, action: Action, pk: Option<i64>) -> AdminResult<String> {
		let name = self.url_name(action);
		let url = match pk {
			Some(pk) => self.resolver.reverse(&name, &[("pk", pk.to_string())]),
			None => self.resolver.reverse::<&str, &str>(&name, &[]),
		};
		url.map_err(|e| AdminError::Configuration(e.into()))
	}

	pub fn store(&self) -> &Arc<dyn ModelStore> {
		&self.store
	}

	pub(crate) fn render(&self, template: &str, context: &Value) -> AdminResult<Response> {
		self.renderer.render(template, context, StatusCode::OK)
	}

	/// The object addressed by the `pk` path parameter
	pub(crate) async fn get_object(&self, request: &Request) -> AdminResult<(i64, clarity_db::Record)> {
		let raw = request.path_param("pk").unwrap_or_default();
		let not_found = || AdminError::ObjectNotFound {
			model: self.model.object_name.clone(),
			pk: raw.to_string(),
		};
		let pk = raw.parse::<i64>().map_err(|_| not_found())?;
		let record = self
			.store
			.get(&self.model, pk)
			.await?
			.ok_or_else(not_found)?;
		Ok((pk, record))
	}

	/// Every row of the model `field` points at, as selectable options
	pub(crate) async fn related_options(&self, field: &FieldDef) -> AdminResult<Option<Vec<ChoiceOption>>> {
		self.related_rows(field, None).await
	}

	/// Rows of the model `field` points at, restricted to `pks` when given
	pub(crate) async fn related_rows(
		&self,
		field: &FieldDef,
		pks: Option<Vec<Value>>,
	) -> AdminResult<Option<Vec<ChoiceOption>>> {
		let Some(target) = field
			.kind
			.related_model()
			.and_then(|key| self.related.get(key))
		else {
			return Ok(None);
		};
		let mut query = ListQuery::new().order_by(OrderBy::asc(PK_FIELD));
		if let Some(pks) = pks {
			query = query.filter(FilterCondition::Single(Filter::is_in(PK_FIELD, pks)));
		}
		let rows = self.store.list(target, &query).await?;
		let options = rows
			.iter()
			.filter_map(|row| {
				Some(ChoiceOption {
					pk: row.pk()?,
					label: target.display_record(row),
				})
			})
			.collect();
		Ok(Some(options))
	}

	/// Valid options for every model choice field of `form`
	pub(crate) async fn load_choices(&self, form: &FormConfig) -> AdminResult<Arc<ModelChoices>> {
		let mut choices = HashMap::new();
		for spec in form
			.fields
			.iter()
			.filter(|spec| spec.field_type == FieldType::ModelChoice)
		{
			let Some(def) = form.model.get_field(&spec.name) else {
				continue;
			};
			if let Some(options) = self.related_options(def).await? {
				choices.insert(spec.name.clone(), options);
			}
		}
		Ok(Arc::new(choices))
	}
}

/// Collects the arguments of a view
///
/// Every argument except the paging, ordering, related models, editor
/// values and extra columns is required; [`build`](Self::build) names the first one missing.
#[derive(Clone, Default)]
pub struct ViewConfigBuilder {
	form_class: Option<Arc<FormConfig>>,
	form_layout: Option<FieldLayout>,
	formsets: Option<Vec<InlineFormset>>,
	namespace: Option<String>,
	store: Option<Arc<dyn ModelStore>>,
	resolver: Option<Arc<UrlResolver>>,
	renderer: Option<Arc<dyn Renderer>>,
	related: Arc<RelatedModels>,
	list_per_page: Option<usize>,
	ordering: Option<Vec<String>>,
	empty_editor_values: Option<Vec<String>>,
	extra_columns: Option<Arc<dyn ExtraColumns>>,
}

impl ViewConfigBuilder {
	pub fn form_class(mut self, form: Arc<FormConfig>) -> Self {
		self.form_class = Some(form);
		self
	}

	pub fn form_layout(mut self, layout: FieldLayout) -> Self {
		self.form_layout = Some(layout);
		self
	}

	pub fn formsets(mut self, formsets: Vec<InlineFormset>) -> Self {
		self.formsets = Some(formsets);
		self
	}

	pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn store(mut self, store: Arc<dyn ModelStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn resolver(mut self, resolver: Arc<UrlResolver>) -> Self {
		self.resolver = Some(resolver);
		self
	}

	pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
		self.renderer = Some(renderer);
		self
	}

	pub fn related(mut self, related: Arc<RelatedModels>) -> Self {
		self.related = related;
		self
	}

	pub fn list_per_page(mut self, count: usize) -> Self {
		self.list_per_page = Some(count);
		self
	}

	pub fn ordering(mut self, ordering: Vec<String>) -> Self {
		self.ordering = Some(ordering);
		self
	}

	pub fn empty_editor_values(mut self, values: Vec<String>) -> Self {
		self.empty_editor_values = Some(values);
		self
	}

	pub fn extra_columns(mut self, columns: Option<Arc<dyn ExtraColumns>>) -> Self {
		self.extra_columns = columns;
		self
	}

	/// Take paging and editor values from the admin settings
	pub fn settings(self, settings: &AdminSettings) -> Self {
		self.list_per_page(settings.items_per_page)
			.empty_editor_values(settings.empty_editor_values.clone())
	}

	/// Finish the configuration of the view named `view`
	///
	/// # Examples
	///
	/// ```
	/// use clarity_admin::ConfigurationError;
	/// use clarity_admin::views::ViewConfig;
	///
	/// let err = ViewConfig::builder().namespace("clarity").build("UpdateView").unwrap_err();
	/// assert_eq!(err.to_string(), "UpdateView() missing required argument: 'form_class'");
	/// assert!(matches!(err, ConfigurationError::MissingArgument { .. }));
	/// ```
	pub fn build(self, view: &str) -> ConfigurationResult<ViewConfig> {
		let missing = |argument: &str| ConfigurationError::MissingArgument {
			view: view.to_string(),
			argument: argument.to_string(),
		};
		let form = self.form_class.ok_or_else(|| missing("form_class"))?;
		let layout = self.form_layout.ok_or_else(|| missing("form_layout"))?;
		let formsets = self.formsets.ok_or_else(|| missing("formsets"))?;
		let namespace = self.namespace.ok_or_else(|| missing("namespace"))?;
		let store = self.store.ok_or_else(|| missing("store"))?;
		let resolver = self.resolver.ok_or_else(|| missing("resolver"))?;
		let renderer = self.renderer.ok_or_else(|| missing("renderer"))?;
		let defaults = AdminSettings::default();
		Ok(ViewConfig {
			model: Arc::clone(&form.model),
			form,
			layout,
			formsets,
			namespace,
			list_per_page: self.list_per_page.unwrap_or(defaults.items_per_page).max(1),
			ordering: self.ordering.unwrap_or_else(|| vec![PK_FIELD.to_string()]),
			empty_editor_values: self
				.empty_editor_values
				.unwrap_or(defaults.empty_editor_values),
			extra_columns: self.extra_columns,
			store,
			resolver,
			renderer,
			related: self.related,
		})
	}
}

/// Turn a view result into a response, logging server-side failures
pub(crate) fn finish(view: &str, result: AdminResult<Response>) -> clarity_http::Result<Response> {
	result.map_err(|err| {
		let err = Error::from(err);
		if !err.is_client_error() {
			tracing::error!(view, error = %err, "admin view failed");
		}
		err
	})
}
