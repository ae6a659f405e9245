//! Name to path resolution
//!
//! A [`UrlResolver`] is filled before any handler exists, so views that need
//! to link to each other can hold an `Arc<UrlResolver>` from construction on.

use crate::error::UrlError;
use crate::pattern::PathPattern;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct UrlResolver {
	prefix: String,
	patterns: HashMap<String, PathPattern>,
}

impl UrlResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolver whose reversed paths are prefixed with `prefix`
	///
	/// The prefix is normalized to have no trailing slash, so `"/admin/"` and
	/// `"/admin"` behave the same.
	pub fn with_prefix(prefix: impl AsRef<str>) -> Self {
		Self {
			prefix: prefix.as_ref().trim_end_matches('/').to_string(),
			patterns: HashMap::new(),
		}
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Register `pattern` under `name` and, when given, `namespace:name`
	///
	/// Registering the same qualified name twice replaces the previous
	/// pattern.
	pub fn register(&mut self, name: &str, namespace: Option<&str>, pattern: PathPattern) {
		if let Some(ns) = namespace {
			self.patterns.insert(format!("{ns}:{name}"), pattern.clone());
		}
		self.patterns.insert(name.to_string(), pattern);
	}

	pub fn contains(&self, name: &str) -> bool {
		self.patterns.contains_key(name)
	}

	/// Every registered name, sorted
	pub fn route_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	/// Reverse a route name into a path
	///
	/// # Examples
	///
	/// ```
	/// use clarity_urls::{PathPattern, UrlResolver};
	///
	/// let mut resolver = UrlResolver::with_prefix("/admin/");
	/// resolver.register(
	///     "clarity-blog-article-update",
	///     Some("clarity"),
	///     PathPattern::parse("/blog/article/{pk:int}/change/").unwrap(),
	/// );
	///
	/// let url = resolver
	///     .reverse("clarity:clarity-blog-article-update", &[("pk", "3")])
	///     .unwrap();
	/// assert_eq!(url, "/admin/blog/article/3/change/");
	/// ```
	pub fn reverse<K: AsRef<str>, V: AsRef<str>>(
		&self,
		name: &str,
		params: &[(K, V)],
	) -> Result<String, UrlError> {
		let map: HashMap<String, String> = params
			.iter()
			.map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
			.collect();
		self.reverse_map(name, &map)
	}

	/// Reverse with a parameter map, typically a request's path parameters
	pub fn reverse_map(
		&self,
		name: &str,
		params: &HashMap<String, String>,
	) -> Result<String, UrlError> {
		let pattern = self
			.patterns
			.get(name)
			.ok_or_else(|| UrlError::NoReverseMatch(name.to_string()))?;
		let path = pattern.reverse(name, params)?;
		Ok(format!("{}{}", self.prefix, path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn resolver() -> UrlResolver {
		let mut resolver = UrlResolver::with_prefix("/admin");
		resolver.register(
			"index",
			Some("clarity"),
			PathPattern::parse("/").unwrap(),
		);
		resolver.register(
			"blog-article-index",
			None,
			PathPattern::parse("/blog/article/").unwrap(),
		);
		resolver
	}

	#[rstest]
	fn test_reverse_root() {
		let resolver = resolver();
		assert_eq!(resolver.reverse::<&str, &str>("clarity:index", &[]).unwrap(), "/admin/");
		assert_eq!(resolver.reverse::<&str, &str>("index", &[]).unwrap(), "/admin/");
	}

	#[rstest]
	fn test_unknown_name() {
		let resolver = resolver();
		assert_eq!(
			resolver.reverse::<&str, &str>("nope", &[]),
			Err(UrlError::NoReverseMatch("nope".into()))
		);
	}

	#[rstest]
	fn test_reregistering_replaces_pattern() {
		// Arrange
		let mut resolver = resolver();

		// Act
		resolver.register(
			"blog-article-index",
			None,
			PathPattern::parse("/posts/").unwrap(),
		);

		// Assert
		assert_eq!(
			resolver.reverse::<&str, &str>("blog-article-index", &[]).unwrap(),
			"/admin/posts/"
		);
	}
}
