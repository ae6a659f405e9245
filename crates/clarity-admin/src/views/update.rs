use super::{ALLOWED_METHODS, Action, ViewConfig, finish};
use crate::error::AdminResult;
use crate::error_list::{form_errors, formset_errors};
use crate::factory::InlineFormset;
use crate::render::UPDATE_TEMPLATE;
use async_trait::async_trait;
use clarity_db::{Filter, FilterCondition, ListQuery, OrderBy, PK_FIELD, Record, WriteOp};
use clarity_forms::formset::DELETION_FIELD;
use clarity_forms::{Form, InlineFormSet};
use clarity_http::{FileDict, Handler, QueryDict, Request, Response};
use hyper::Method;
use serde_json::{Value, json};
use std::sync::Arc;

/// Edits a parent object together with its inline children
///
/// A submission is saved only when the form and every formset validate, and
/// then in a single transaction.
#[derive(Debug)]
pub struct UpdateView {
	config: Arc<ViewConfig>,
}

impl UpdateView {
	pub fn new(config: Arc<ViewConfig>) -> Self {
		Self { config }
	}

	/// One formset per inline, holding the current children of `parent_pk`
	async fn formsets(
		&self,
		parent_pk: i64,
		data: Option<(&QueryDict, &FileDict)>,
	) -> AdminResult<Vec<InlineFormSet>> {
		let mut formsets = Vec::with_capacity(self.config.formsets.len());
		for InlineFormset { config, .. } in &self.config.formsets {
			let query = ListQuery::new()
				.filter(FilterCondition::Single(Filter::eq(
					config.fk_name.clone(),
					parent_pk,
				)))
				.order_by(OrderBy::asc(PK_FIELD));
			let children = self.config.store().list(&config.child, &query).await?;
			let choices = self.config.load_choices(&config.form).await?;
			let formset = match data {
				Some((data, files)) => {
					InlineFormSet::new(Arc::clone(config), children, Some(data.clone()), choices)
						.with_files(files)
				}
				None => InlineFormSet::new(Arc::clone(config), children, None, choices),
			};
			formsets.push(formset);
		}
		Ok(formsets)
	}

	fn formset_context(&self, formsets: &[InlineFormSet]) -> Vec<Value> {
		formsets
			.iter()
			.zip(&self.config.formsets)
			.map(|(formset, InlineFormset { config, layout })| {
				let forms: Vec<Value> = formset
					.forms()
					.iter()
					.enumerate()
					.map(|(index, form)| {
						json!({
							"prefix": form.prefix(),
							"pk": form.instance_pk(),
							"pk_input_name": form.pk_input_name(),
							"deletion_field": form.add_prefix(DELETION_FIELD),
							"deleted": formset.is_deleted(index),
							"errors": form.non_field_errors(),
							"cells": layout.cells(form),
						})
					})
					.collect();
				json!({
					"prefix": formset.prefix(),
					"model_verbose_name": config.child.verbose_name,
					"model_verbose_name_plural": config.child.verbose_name_plural,
					"can_delete": config.can_delete,
					"management_form": formset.management_form(),
					"non_form_errors": formset.non_form_errors(),
					"forms": forms,
				})
			})
			.collect()
	}

	fn render_page(
		&self,
		pk: i64,
		instance: &Record,
		form: &Form,
		formsets: &[InlineFormSet],
	) -> AdminResult<Response> {
		let config = &self.config;
		let mut all_errors = form_errors(form);
		for formset in formsets {
			all_errors.extend(formset_errors(formset));
		}
		let formset_layouts: Vec<_> = config.formsets.iter().map(|f| &f.layout).collect();
		let context = json!({
			"object": config.model.display_record(instance),
			"object_id": pk,
			"model_verbose_name": config.model.verbose_name,
			"form_layout": config.layout.cells(form),
			"formsets": self.formset_context(formsets),
			"formset_layouts": formset_layouts,
			"all_errors": all_errors,
			"index_url": config.reverse(Action::Index, None)?,
			"delete_url": config.reverse(Action::Delete, Some(pk))?,
		});
		config.render(UPDATE_TEMPLATE, &context)
	}

	async fn get(&self, request: &Request) -> AdminResult<Response> {
		let (pk, instance) = self.config.get_object(request).await?;
		let choices = self.config.load_choices(&self.config.form).await?;
		let form = Form::new(Arc::clone(&self.config.form))
			.with_instance(instance.clone())
			.with_choices(choices);
		let formsets = self.formsets(pk, None).await?;
		self.render_page(pk, &instance, &form, &formsets)
	}

	async fn post(&self, request: &Request) -> clarity_http::Result<Response> {
		let config = &self.config;
		let (pk, instance) = config.get_object(request).await?;
		let submission = request.form_submission().await?;
		let mut data = submission.data;
		data.blank_values(&config.empty_editor_values);

		let choices = config.load_choices(&config.form).await?;
		let mut form = Form::new(Arc::clone(&config.form))
			.with_instance(instance.clone())
			.with_data(data.clone())
			.with_files(submission.files.clone())
			.with_choices(choices);
		let mut formsets = self.formsets(pk, Some((&data, &submission.files))).await?;

		let form_valid = form.is_valid();
		let mut formsets_valid = true;
		for formset in &mut formsets {
			formsets_valid &= formset.is_valid();
		}
		if !(form_valid && formsets_valid) {
			tracing::debug!(
				model = %config.model.key,
				pk,
				form_valid,
				formsets_valid,
				"update rejected by validation"
			);
			return Ok(self.render_page(pk, &instance, &form, &formsets)?);
		}

		let mut ops = vec![WriteOp::Update {
			schema: Arc::clone(&config.model),
			pk,
			values: form.to_record(),
		}];
		for formset in &formsets {
			ops.extend(formset.save_ops(pk));
		}
		let writes = ops.len();
		config.store().atomic(ops).await.inspect_err(|err| {
			tracing::warn!(model = %config.model.key, pk, error = %err, "update rolled back");
		})?;
		tracing::info!(model = %config.model.key, pk, writes, "object updated");
		Ok(Response::temporary_redirect(config.reverse(Action::Update, Some(pk))?))
	}
}

#[async_trait]
impl Handler for UpdateView {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		match request.method {
			Method::GET => finish("UpdateView", self.get(&request).await),
			Method::POST => self.post(&request).await,
			_ => Ok(Response::method_not_allowed(ALLOWED_METHODS)),
		}
	}
}
