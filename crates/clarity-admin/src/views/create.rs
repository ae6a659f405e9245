use super::{ALLOWED_METHODS, Action, ViewConfig, finish};
use crate::error::AdminResult;
use crate::error_list::form_errors;
use crate::render::CREATE_TEMPLATE;
use async_trait::async_trait;
use clarity_forms::Form;
use clarity_http::{Handler, Request, Response};
use hyper::Method;
use serde_json::json;
use std::sync::Arc;

/// Creates a parent object
///
/// Children are not edited here; a successful save redirects to the update
/// page of the new object, where the inlines are.
#[derive(Debug)]
pub struct CreateView {
	config: Arc<ViewConfig>,
}

impl CreateView {
	pub fn new(config: Arc<ViewConfig>) -> Self {
		Self { config }
	}

	fn render_form(&self, form: &Form) -> AdminResult<Response> {
		let config = &self.config;
		let formset_model_names: Vec<&str> = config
			.formsets
			.iter()
			.map(|formset| formset.config.child.verbose_name.as_str())
			.collect();
		let context = json!({
			"model_verbose_name": config.model.verbose_name,
			"form_layout": config.layout.cells(form),
			"all_errors": form_errors(form),
			"formset_model_names": formset_model_names,
			"index_url": config.reverse(Action::Index, None)?,
		});
		config.render(CREATE_TEMPLATE, &context)
	}

	async fn get(&self) -> AdminResult<Response> {
		let choices = self.config.load_choices(&self.config.form).await?;
		let form = Form::new(Arc::clone(&self.config.form)).with_choices(choices);
		self.render_form(&form)
	}

	async fn post(&self, request: &Request) -> clarity_http::Result<Response> {
		let config = &self.config;
		let submission = request.form_submission().await?;
		let choices = config.load_choices(&config.form).await?;
		let mut form = Form::new(Arc::clone(&config.form))
			.with_data(submission.data)
			.with_files(submission.files)
			.with_choices(choices);

		if !form.is_valid() {
			tracing::debug!(model = %config.model.key, errors = form.errors().len(), "create form invalid");
			return Ok(self.render_form(&form)?);
		}

		let pk = config
			.store()
			.insert(Arc::clone(&config.model), form.to_record())
			.await?;
		tracing::info!(model = %config.model.key, pk, "object created");
		Ok(Response::temporary_redirect(config.reverse(Action::Update, Some(pk))?))
	}
}

#[async_trait]
impl Handler for CreateView {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		match request.method {
			Method::GET => finish("CreateView", self.get().await),
			Method::POST => self.post(&request).await,
			_ => Ok(Response::method_not_allowed(ALLOWED_METHODS)),
		}
	}
}
