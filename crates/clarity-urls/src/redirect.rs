use crate::resolver::UrlResolver;
use async_trait::async_trait;
use clarity_http::{Handler, Request, Response, Result};
use hyper::StatusCode;
use std::sync::Arc;

/// Redirects to another named route
///
/// The request's path parameters are forwarded to the reversal, so a route
/// `/{pk}/` can redirect to `/{pk}/change/`. When the target cannot be
/// reversed the view answers `410 Gone`.
#[derive(Debug, Clone)]
pub struct RedirectView {
	resolver: Arc<UrlResolver>,
	pattern_name: String,
	permanent: bool,
	query_string: bool,
}

impl RedirectView {
	pub fn new(resolver: Arc<UrlResolver>, pattern_name: impl Into<String>) -> Self {
		Self {
			resolver,
			pattern_name: pattern_name.into(),
			permanent: false,
			query_string: false,
		}
	}

	/// Answer `301` instead of `302`
	pub fn permanent(mut self, permanent: bool) -> Self {
		self.permanent = permanent;
		self
	}

	/// Carry the incoming query string over to the target
	pub fn query_string(mut self, query_string: bool) -> Self {
		self.query_string = query_string;
		self
	}

	pub fn pattern_name(&self) -> &str {
		&self.pattern_name
	}
}

#[async_trait]
impl Handler for RedirectView {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut url = match self
			.resolver
			.reverse_map(&self.pattern_name, request.path_params())
		{
			Ok(url) => url,
			Err(err) => {
				tracing::warn!(pattern = %self.pattern_name, error = %err, "redirect target unavailable");
				return Ok(Response::new(StatusCode::GONE));
			}
		};
		if self.query_string
			&& let Some(query) = request.uri.query().filter(|q| !q.is_empty())
		{
			url.push('?');
			url.push_str(query);
		}
		Ok(if self.permanent {
			Response::permanent_redirect(url)
		} else {
			Response::temporary_redirect(url)
		})
	}
}
