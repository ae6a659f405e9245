use crate::error::UrlError;
use crate::pattern::PathPattern;
use crate::resolver::UrlResolver;
use crate::route::Route;
use async_trait::async_trait;
use clarity_core::exception::Error;
use clarity_http::{Handler, Request, Response, Result};
use std::collections::HashSet;

/// Dispatches requests to the first route whose pattern matches
///
/// Routes are tried in registration order. Captured placeholders are copied
/// into the request's path parameters before the route handler runs.
#[derive(Debug, Default)]
pub struct Router {
	prefix: String,
	routes: Vec<(PathPattern, Route)>,
	names: HashSet<String>,
	resolver: UrlResolver,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	/// Router mounted under `prefix`; patterns are relative to it
	pub fn with_prefix(prefix: impl AsRef<str>) -> Self {
		let resolver = UrlResolver::with_prefix(prefix.as_ref());
		Self {
			prefix: resolver.prefix().to_string(),
			resolver,
			..Self::default()
		}
	}

	/// Add a route
	///
	/// Fails when the pattern does not compile or the qualified name is
	/// already taken.
	///
	/// # Examples
	///
	/// ```
	/// use clarity_urls::{Route, Router};
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
	/// let mut router = Router::with_prefix("/admin/");
	/// router
	///     .add_route(Route::from_handler("/blog/article/{pk:int}/", DummyHandler).with_name("detail"))
	///     .unwrap();
	///
	/// assert_eq!(router.reverse("detail", &[("pk", "9")]).unwrap(), "/admin/blog/article/9/");
	/// ```
	pub fn add_route(&mut self, route: Route) -> std::result::Result<(), UrlError> {
		let pattern = PathPattern::parse(&route.path)?;
		if let Some(qualified) = route.qualified_name() {
			if !self.names.insert(qualified.clone()) {
				return Err(UrlError::DuplicateName(qualified));
			}
			if let Some(name) = &route.name {
				self.resolver
					.register(name, route.namespace.as_deref(), pattern.clone());
			}
		}
		self.routes.push((pattern, route));
		Ok(())
	}

	pub fn routes(&self) -> impl Iterator<Item = &Route> {
		self.routes.iter().map(|(_, route)| route)
	}

	pub fn resolver(&self) -> &UrlResolver {
		&self.resolver
	}

	pub fn reverse<K: AsRef<str>, V: AsRef<str>>(
		&self,
		name: &str,
		params: &[(K, V)],
	) -> std::result::Result<String, UrlError> {
		self.resolver.reverse(name, params)
	}

	fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
		if self.prefix.is_empty() {
			return Some(path);
		}
		path.strip_prefix(self.prefix.as_str())
			.filter(|rest| rest.starts_with('/'))
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let path = request.path().to_string();
		let relative = self
			.strip_prefix(&path)
			.ok_or_else(|| Error::NotFound(path.clone()))?;

		for (pattern, route) in &self.routes {
			if let Some(params) = pattern.matches(relative) {
				tracing::trace!(path = %path, route = ?route.name, "route matched");
				for (name, value) in params {
					request.set_path_param(name, value);
				}
				return route.handler().handle(request).await;
			}
		}
		Err(Error::NotFound(path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct EchoParam;

	#[async_trait]
	impl Handler for EchoParam {
		async fn handle(&self, request: Request) -> Result<Response> {
			let pk = request.path_param("pk").unwrap_or("none").to_string();
			Ok(Response::ok().with_body(pk))
		}
	}

	fn router() -> Router {
		let mut router = Router::with_prefix("/admin");
		router
			.add_route(Route::from_handler("/a/{pk:int}/", EchoParam).with_name("a"))
			.unwrap();
		router
	}

	#[rstest]
	#[tokio::test]
	async fn test_dispatch_sets_path_params() {
		// Arrange
		let router = router();
		let request = Request::builder().uri("/admin/a/12/").build().unwrap();

		// Act
		let response = router.handle(request).await.unwrap();

		// Assert
		assert_eq!(response.body, "12");
	}

	#[rstest]
	#[case("/admin/a/x/")]
	#[case("/other/a/1/")]
	#[case("/admina/a/1/")]
	#[tokio::test]
	async fn test_unmatched_paths_are_not_found(#[case] uri: &str) {
		let router = router();
		let request = Request::builder().uri(uri).build().unwrap();
		let result = router.handle(request).await;
		assert!(matches!(result, Err(Error::NotFound(_))));
	}

	#[rstest]
	fn test_duplicate_names_are_rejected() {
		let mut router = router();
		let result = router.add_route(Route::from_handler("/b/", EchoParam).with_name("a"));
		assert_eq!(result, Err(UrlError::DuplicateName("a".into())));
	}
}
