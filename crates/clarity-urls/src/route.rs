use clarity_http::Handler;
use std::fmt;
use std::sync::Arc;

/// Route definition
///
/// Pairs a path pattern with the handler serving it. The optional name and
/// namespace make the route reversible as `name` or `namespace:name`.
#[derive(Clone)]
pub struct Route {
	pub path: String,
	handler: Arc<dyn Handler>,
	pub name: Option<String>,
	pub namespace: Option<String>,
}

impl Route {
	/// Create a new route
	///
	/// # Examples
	///
	/// ```
	/// use clarity_urls::Route;
	/// use std::sync::Arc;
	///
	/// # use async_trait::async_trait;
	/// # use clarity_http::{Handler, Request, Response, Result};
	/// # struct DummyHandler;
	/// # #[async_trait]
	/// # impl Handler for DummyHandler {
	/// #     async fn handle(&self, _req: Request) -> Result<Response> {
	/// #         Ok(Response::ok())
	/// #     }
	/// # }
	/// let route = Route::new("/blog/article/", Arc::new(DummyHandler))
	///     .with_name("blog-article-index")
	///     .with_namespace("clarity");
	/// assert_eq!(route.qualified_name().as_deref(), Some("clarity:blog-article-index"));
	/// ```
	pub fn new(path: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		Self {
			path: path.into(),
			handler,
			name: None,
			namespace: None,
		}
	}

	/// Create a route from a concrete handler
	pub fn from_handler<H>(path: impl Into<String>, handler: H) -> Self
	where
		H: Handler + 'static,
	{
		Self::new(path, Arc::new(handler))
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	/// `namespace:name`, or just `name` when no namespace is set
	pub fn qualified_name(&self) -> Option<String> {
		let name = self.name.as_ref()?;
		Some(match &self.namespace {
			Some(ns) => format!("{ns}:{name}"),
			None => name.clone(),
		})
	}

	pub fn handler(&self) -> &Arc<dyn Handler> {
		&self.handler
	}
}

impl fmt::Debug for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("namespace", &self.namespace)
			.finish_non_exhaustive()
	}
}
