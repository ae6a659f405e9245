//! The admin site: registered models and the routes derived from them

use crate::error::{ConfigurationError, ConfigurationResult};
use crate::factory::{InlineFormset, build_form, build_formsets};
use crate::layout::{FieldLayout, resolve_layout};
use crate::options::ModelAdmin;
use crate::render::Renderer;
use crate::views::{
	Action, AppIndexView, CreateView, DeleteView, ListView, RelatedModels, SiteIndexView,
	UpdateView, ViewConfig, app_index_name, route_name, site_index_name,
};
use clarity_conf::AdminSettings;
use clarity_db::{ModelKey, ModelSchema, ModelStore};
use clarity_forms::FormConfig;
use clarity_http::Handler;
use clarity_urls::{PathPattern, RedirectView, Route, Router, UrlResolver};
use indexmap::IndexMap;
use std::sync::Arc;

pub const DEFAULT_NAMESPACE: &str = "clarity";

/// A registered model with its admin options
#[derive(Debug, Clone)]
pub struct Registration {
	pub model: Arc<ModelSchema>,
	pub admin: ModelAdmin,
}

/// Everything the routes of one model are built from
#[derive(Debug, Clone)]
pub struct RouteBundle {
	pub model: Arc<ModelSchema>,
	pub admin: ModelAdmin,
	pub form: Arc<FormConfig>,
	pub layout: FieldLayout,
	pub formsets: Vec<InlineFormset>,
	/// Route names by action
	pub names: IndexMap<&'static str, String>,
}

impl RouteBundle {
	/// `{app_label}/{model_name}`, the path segment of every route of the model
	pub fn url_prefix(&self) -> String {
		format!("/{}/{}", self.model.key.app_label, self.model.key.model_name)
	}

	pub fn name(&self, action: Action) -> &str {
		self.names
			.get(action.as_str())
			.map(String::as_str)
			.unwrap_or_default()
	}
}

/// Registry of models managed through the admin
///
/// The site is an ordinary value: build it at startup, register models, then
/// turn it into a [`Router`] with [`build_router`](Self::build_router).
///
/// # Examples
///
/// ```
/// use clarity_admin::{AdminSite, ModelAdmin};
/// use clarity_db::{FieldDef, ModelSchema};
///
/// let mut site = AdminSite::new();
/// site.register(
///     ModelSchema::new("blog", "Article").field(FieldDef::char("title", 200)),
///     ModelAdmin::new().with_fields(["title"]),
/// );
///
/// let bundles = site.route_bundles(3).unwrap();
/// assert_eq!(bundles[0].name(clarity_admin::views::Action::Create), "clarity-blog-article-create");
/// ```
#[derive(Debug, Clone)]
pub struct AdminSite {
	namespace: String,
	registry: IndexMap<ModelKey, Registration>,
	related: IndexMap<ModelKey, Arc<ModelSchema>>,
}

impl Default for AdminSite {
	fn default() -> Self {
		Self::new()
	}
}

impl AdminSite {
	pub fn new() -> Self {
		Self::with_namespace(DEFAULT_NAMESPACE)
	}

	pub fn with_namespace(namespace: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			registry: IndexMap::new(),
			related: IndexMap::new(),
		}
	}

	/// Site using the namespace configured in `settings`
	pub fn from_settings(settings: &AdminSettings) -> Self {
		Self::with_namespace(settings.namespace.clone())
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Register `model`; registering it again replaces its options
	pub fn register(&mut self, model: impl Into<Arc<ModelSchema>>, admin: ModelAdmin) {
		let model = model.into();
		if self.registry.contains_key(&model.key) {
			tracing::debug!(model = %model.key, "model re-registered, previous options replaced");
		}
		self.registry
			.insert(model.key.clone(), Registration { model, admin });
	}

	/// Register `model` with the default options
	pub fn register_default(&mut self, model: impl Into<Arc<ModelSchema>>) {
		self.register(model, ModelAdmin::default());
	}

	/// Make a model known as a foreign key target without admin pages
	pub fn add_related_model(&mut self, model: impl Into<Arc<ModelSchema>>) {
		let model = model.into();
		self.related.insert(model.key.clone(), model);
	}

	pub fn is_registered(&self, key: &ModelKey) -> bool {
		self.registry.contains_key(key)
	}

	pub fn get(&self, key: &ModelKey) -> Option<&Registration> {
		self.registry.get(key)
	}

	pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
		self.registry.values()
	}

	/// Registered models grouped by app label, in registration order
	pub fn apps(&self) -> IndexMap<String, Vec<Arc<ModelSchema>>> {
		let mut apps: IndexMap<String, Vec<Arc<ModelSchema>>> = IndexMap::new();
		for registration in self.registry.values() {
			apps.entry(registration.model.key.app_label.clone())
				.or_default()
				.push(Arc::clone(&registration.model));
		}
		apps
	}

	/// Every schema a foreign key may point at
	fn related_models(&self) -> RelatedModels {
		let mut models = self.related.clone();
		for registration in self.registry.values() {
			models.insert(
				registration.model.key.clone(),
				Arc::clone(&registration.model),
			);
		}
		models
	}

	/// Fail on foreign keys to models the site does not know
	fn check_relations(&self, related: &RelatedModels) -> ConfigurationResult<()> {
		let schemas = self.registry.values().flat_map(|registration| {
			std::iter::once(&registration.model)
				.chain(registration.admin.inlines.iter().map(|inline| &inline.model))
		});
		for schema in schemas {
			for field in &schema.fields {
				if let Some(target) = field.kind.related_model()
					&& !related.contains_key(target)
				{
					return Err(ConfigurationError::UnknownRelatedModel {
						model: schema.key.to_string(),
						field: field.name.clone(),
						target: target.to_string(),
					});
				}
			}
		}
		Ok(())
	}

	/// Form, layouts and route names for every registered model
	///
	/// `default_extra` is the blank form count of inlines that leave it unset.
	pub fn route_bundles(&self, default_extra: usize) -> ConfigurationResult<Vec<RouteBundle>> {
		self.registry
			.values()
			.map(|Registration { model, admin }| {
				model.validate()?;
				check_ordering(model, &admin.ordering)?;
				let layout = resolve_layout(model, &admin.fields, &admin.readonly_fields, None)?;
				let form = build_form(Arc::clone(model), admin, &layout)?;
				let formsets = build_formsets(model, &admin.inlines, default_extra)?;
				let names = [Action::Create, Action::Delete, Action::Index, Action::Update]
					.into_iter()
					.map(|action| (action.as_str(), route_name(&self.namespace, &model.key, action)))
					.collect();
				Ok(RouteBundle {
					model: Arc::clone(model),
					admin: admin.clone(),
					form,
					layout,
					formsets,
					names,
				})
			})
			.collect()
	}

	/// Build the admin routes, mounted at `settings.url_prefix`
	///
	/// Every named route is known to the resolver before any view is built,
	/// so views and redirects can reverse each other.
	pub fn build_router(
		&self,
		store: Arc<dyn ModelStore>,
		renderer: Arc<dyn Renderer>,
		settings: &AdminSettings,
	) -> ConfigurationResult<Router> {
		let related = Arc::new(self.related_models());
		self.check_relations(&related)?;
		let bundles = self.route_bundles(settings.inline_extra)?;
		let apps = self.apps();

		let mut resolver = UrlResolver::with_prefix(&settings.url_prefix);
		let ns = Some(self.namespace.as_str());
		for bundle in &bundles {
			let base = bundle.url_prefix();
			for (action, suffix) in [
				(Action::Create, "/add/"),
				(Action::Delete, "/{pk:int}/delete/"),
				(Action::Index, "/"),
				(Action::Update, "/{pk:int}/change/"),
			] {
				let pattern = PathPattern::parse(&format!("{base}{suffix}"))?;
				resolver.register(bundle.name(action), ns, pattern);
			}
		}
		for app_label in apps.keys() {
			let pattern = PathPattern::parse(&format!("/{app_label}/"))?;
			resolver.register(&app_index_name(&self.namespace, app_label), ns, pattern);
		}
		resolver.register(&site_index_name(&self.namespace), ns, PathPattern::parse("/")?);
		let resolver = Arc::new(resolver);

		let mut router = Router::with_prefix(&settings.url_prefix);
		for bundle in bundles {
			let base = bundle.url_prefix();
			let views = ViewConfig::builder()
				.form_class(Arc::clone(&bundle.form))
				.form_layout(bundle.layout.clone())
				.formsets(bundle.formsets.clone())
				.namespace(self.namespace.clone())
				.store(Arc::clone(&store))
				.resolver(Arc::clone(&resolver))
				.renderer(Arc::clone(&renderer))
				.related(Arc::clone(&related))
				.settings(settings)
				.ordering(bundle.admin.ordering.clone())
				.extra_columns(bundle.admin.extra_columns.clone());
			let views = match bundle.admin.list_per_page {
				Some(count) => views.list_per_page(count),
				None => views,
			};

			let named = |path: String, action: Action, handler: Arc<dyn Handler>| {
				Route::new(path, handler)
					.with_name(bundle.name(action))
					.with_namespace(self.namespace.clone())
			};
			let handler = |action: Action, view_name: &str| -> ConfigurationResult<Arc<dyn Handler>> {
				let config = Arc::new(views.clone().build(view_name)?);
				if let Some(factory) = bundle.admin.views.get(&action) {
					tracing::debug!(model = %bundle.model.key, %action, "custom view");
					return Ok(factory(config));
				}
				let view: Arc<dyn Handler> = match action {
					Action::Create => Arc::new(CreateView::new(config)),
					Action::Delete => Arc::new(DeleteView::new(config)),
					Action::Index => Arc::new(ListView::new(config)),
					Action::Update => Arc::new(UpdateView::new(config)),
				};
				Ok(view)
			};
			for (action, view_name, path) in [
				(Action::Create, "CreateView", format!("{base}/add/")),
				(Action::Delete, "DeleteView", format!("{base}/{{pk:int}}/delete/")),
				(Action::Index, "ListView", format!("{base}/")),
				(Action::Update, "UpdateView", format!("{base}/{{pk:int}}/change/")),
			] {
				router.add_route(named(path, action, handler(action, view_name)?))?;
			}

			let to_index = format!("{}:{}", self.namespace, bundle.name(Action::Index));
			for legacy in ["index", "delete", "change"] {
				let redirect = RedirectView::new(Arc::clone(&resolver), to_index.clone());
				router.add_route(Route::from_handler(format!("{base}/{legacy}/"), redirect))?;
			}
			let to_update = format!("{}:{}", self.namespace, bundle.name(Action::Update));
			let redirect = RedirectView::new(Arc::clone(&resolver), to_update);
			router.add_route(Route::from_handler(format!("{base}/{{pk:int}}/"), redirect))?;
		}

		for (app_label, models) in apps {
			let name = app_index_name(&self.namespace, &app_label);
			let view = AppIndexView::new(
				self.namespace.clone(),
				app_label.clone(),
				models,
				Arc::clone(&resolver),
				Arc::clone(&renderer),
			);
			router.add_route(
				Route::from_handler(format!("/{app_label}/"), view)
					.with_name(name)
					.with_namespace(self.namespace.clone()),
			)?;
		}
		let site_index = SiteIndexView::new(
			self.namespace.clone(),
			self.apps(),
			Arc::clone(&resolver),
			Arc::clone(&renderer),
		);
		router.add_route(
			Route::from_handler("/", site_index)
				.with_name(site_index_name(&self.namespace))
				.with_namespace(self.namespace.clone()),
		)?;

		tracing::info!(
			namespace = %self.namespace,
			prefix = %settings.url_prefix,
			models = self.registry.len(),
			routes = router.routes().count(),
			"admin routes built"
		);
		Ok(router)
	}
}

/// Every ordering entry, `-` stripped, must name a field of `model`
fn check_ordering(model: &ModelSchema, ordering: &[String]) -> ConfigurationResult<()> {
	for spec in ordering {
		let name = spec.strip_prefix('-').unwrap_or(spec);
		if model.get_field(name).is_none() {
			return Err(ConfigurationError::UnknownOrderingField {
				model: model.key.to_string(),
				field: name.to_string(),
			});
		}
	}
	Ok(())
}
