//! Navigation pages: one per app and one for the whole site

use super::{Action, route_name};
use crate::error::{AdminError, AdminResult};
use crate::render::{APP_INDEX_TEMPLATE, Renderer, SITE_INDEX_TEMPLATE};
use async_trait::async_trait;
use clarity_core::exception::Error;
use clarity_db::ModelSchema;
use clarity_http::{Handler, Request, Response};
use clarity_urls::UrlResolver;
use hyper::{Method, StatusCode};
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::Arc;

/// Route name of an app's index page: `{namespace}-{app_label}-index`
pub fn app_index_name(namespace: &str, app_label: &str) -> String {
	format!("{namespace}-{app_label}-index")
}

/// Route name of the site index page: `{namespace}-index`
pub fn site_index_name(namespace: &str) -> String {
	format!("{namespace}-index")
}

struct Links {
	namespace: String,
	resolver: Arc<UrlResolver>,
}

impl Links {
	fn reverse(&self, name: &str) -> AdminResult<String> {
		self.resolver
			.reverse::<&str, &str>(name, &[])
			.map_err(|e| AdminError::Configuration(e.into()))
	}

	fn model(&self, model: &ModelSchema) -> AdminResult<Value> {
		Ok(json!({
			"object_name": model.object_name,
			"model_name": model.key.model_name,
			"verbose_name": model.verbose_name,
			"verbose_name_plural": model.verbose_name_plural,
			"index_url": self.reverse(&route_name(&self.namespace, &model.key, Action::Index))?,
			"create_url": self.reverse(&route_name(&self.namespace, &model.key, Action::Create))?,
		}))
	}

	fn app(&self, app_label: &str, models: &[Arc<ModelSchema>]) -> AdminResult<Value> {
		let models = models
			.iter()
			.map(|model| self.model(model))
			.collect::<AdminResult<Vec<_>>>()?;
		Ok(json!({
			"app_label": app_label,
			"app_url": self.reverse(&app_index_name(&self.namespace, app_label))?,
			"models": models,
		}))
	}
}

fn respond(
	view: &str,
	renderer: &dyn Renderer,
	template: &str,
	context: AdminResult<Value>,
) -> clarity_http::Result<Response> {
	context
		.and_then(|context| renderer.render(template, &context, StatusCode::OK))
		.map_err(|err| {
			tracing::error!(view, error = %err, "index page failed");
			Error::from(err)
		})
}

/// Lists the registered models of one app
pub struct AppIndexView {
	app_label: String,
	models: Vec<Arc<ModelSchema>>,
	links: Links,
	renderer: Arc<dyn Renderer>,
}

impl AppIndexView {
	pub fn new(
		namespace: impl Into<String>,
		app_label: impl Into<String>,
		models: Vec<Arc<ModelSchema>>,
		resolver: Arc<UrlResolver>,
		renderer: Arc<dyn Renderer>,
	) -> Self {
		Self {
			app_label: app_label.into(),
			models,
			links: Links {
				namespace: namespace.into(),
				resolver,
			},
			renderer,
		}
	}
}

#[async_trait]
impl Handler for AppIndexView {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		if request.method != Method::GET {
			return Ok(Response::method_not_allowed(&["GET"]));
		}
		let context = self.links.app(&self.app_label, &self.models);
		respond("AppIndexView", self.renderer.as_ref(), APP_INDEX_TEMPLATE, context)
	}
}

/// Lists every app and its registered models
pub struct SiteIndexView {
	apps: IndexMap<String, Vec<Arc<ModelSchema>>>,
	links: Links,
	renderer: Arc<dyn Renderer>,
}

impl SiteIndexView {
	pub fn new(
		namespace: impl Into<String>,
		apps: IndexMap<String, Vec<Arc<ModelSchema>>>,
		resolver: Arc<UrlResolver>,
		renderer: Arc<dyn Renderer>,
	) -> Self {
		Self {
			apps,
			links: Links {
				namespace: namespace.into(),
				resolver,
			},
			renderer,
		}
	}

	fn context(&self) -> AdminResult<Value> {
		let apps = self
			.apps
			.iter()
			.map(|(app_label, models)| self.links.app(app_label, models))
			.collect::<AdminResult<Vec<_>>>()?;
		Ok(json!({ "apps": apps }))
	}
}

#[async_trait]
impl Handler for SiteIndexView {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		if request.method != Method::GET {
			return Ok(Response::method_not_allowed(&["GET"]));
		}
		respond("SiteIndexView", self.renderer.as_ref(), SITE_INDEX_TEMPLATE, self.context())
	}
}
