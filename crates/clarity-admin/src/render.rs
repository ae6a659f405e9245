//! Turning a template name and a context into a response

use crate::error::{AdminError, AdminResult};
use clarity_http::Response;
use hyper::StatusCode;
use serde_json::{Value, json};

pub const CREATE_TEMPLATE: &str = "clarity/create.html";
pub const UPDATE_TEMPLATE: &str = "clarity/update.html";
pub const LIST_TEMPLATE: &str = "clarity/index.html";
pub const DELETE_TEMPLATE: &str = "clarity/delete.html";
pub const APP_INDEX_TEMPLATE: &str = "clarity/app_index.html";
pub const SITE_INDEX_TEMPLATE: &str = "clarity/site_index.html";

/// Rendering strategy used by every admin view
///
/// Views only build the context; markup is the renderer's business.
pub trait Renderer: Send + Sync {
	fn render(&self, template: &str, context: &Value, status: StatusCode) -> AdminResult<Response>;
}

/// Renders `{"template": ..., "context": ...}` as `application/json`
///
/// # Examples
///
/// ```
/// use clarity_admin::{JsonRenderer, Renderer};
/// use hyper::StatusCode;
/// use serde_json::json;
///
/// let response = JsonRenderer
///     .render("clarity/index.html", &json!({"items": []}), StatusCode::OK)
///     .unwrap();
/// let body = response.json().unwrap();
/// assert_eq!(body["template"], "clarity/index.html");
/// assert_eq!(body["context"]["items"], json!([]));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
	fn render(&self, template: &str, context: &Value, status: StatusCode) -> AdminResult<Response> {
		let body = json!({
			"template": template,
			"context": context,
		});
		Response::new(status)
			.with_json(&body)
			.map_err(|e| AdminError::Render(e.to_string()))
	}
}
