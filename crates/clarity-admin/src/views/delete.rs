use super::{ALLOWED_METHODS, Action, ViewConfig, finish};
use crate::error::AdminResult;
use crate::render::DELETE_TEMPLATE;
use async_trait::async_trait;
use clarity_http::{Handler, Request, Response};
use hyper::Method;
use serde_json::json;
use std::sync::Arc;

/// Confirmation page on GET, deletion on POST
#[derive(Debug)]
pub struct DeleteView {
	config: Arc<ViewConfig>,
}

impl DeleteView {
	pub fn new(config: Arc<ViewConfig>) -> Self {
		Self { config }
	}

	async fn get(&self, request: &Request) -> AdminResult<Response> {
		let config = &self.config;
		let (pk, instance) = config.get_object(request).await?;
		let context = json!({
			"object": config.model.display_record(&instance),
			"object_id": pk,
			"model_verbose_name": config.model.verbose_name,
			"index_url": config.reverse(Action::Index, None)?,
		});
		config.render(DELETE_TEMPLATE, &context)
	}

	async fn post(&self, request: &Request) -> AdminResult<Response> {
		let config = &self.config;
		let (pk, _) = config.get_object(request).await?;
		config.store().delete(Arc::clone(&config.model), pk).await?;
		tracing::info!(model = %config.model.key, pk, "object deleted");
		Ok(Response::temporary_redirect(config.reverse(Action::Index, None)?))
	}
}

#[async_trait]
impl Handler for DeleteView {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		match request.method {
			Method::GET => finish("DeleteView", self.get(&request).await),
			Method::POST => finish("DeleteView", self.post(&request).await),
			_ => Ok(Response::method_not_allowed(ALLOWED_METHODS)),
		}
	}
}
