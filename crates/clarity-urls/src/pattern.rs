//! Path patterns with typed placeholders
//!
//! A pattern is a slash separated path where a whole segment may be a
//! placeholder: `{name}` captures any non-empty segment and `{name:int}`
//! captures a run of ASCII digits.

use crate::error::UrlError;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;

/// Characters escaped when a value is substituted into a path segment
const SEGMENT: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'`')
	.add(b'{')
	.add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
	Str,
	Int,
}

impl Converter {
	fn accepts(self, value: &str) -> bool {
		match self {
			Converter::Str => !value.is_empty(),
			Converter::Int => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param { name: String, converter: Converter },
}

/// Compiled path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
	trailing_slash: bool,
}

impl PathPattern {
	/// Compile a pattern
	///
	/// # Examples
	///
	/// ```
	/// use clarity_urls::PathPattern;
	///
	/// let pattern = PathPattern::parse("/admin/blog/article/{pk:int}/change/").unwrap();
	/// let params = pattern.matches("/admin/blog/article/42/change/").unwrap();
	/// assert_eq!(params["pk"], "42");
	/// assert!(pattern.matches("/admin/blog/article/abc/change/").is_none());
	/// ```
	pub fn parse(raw: &str) -> Result<Self, UrlError> {
		let invalid = |reason: &str| UrlError::InvalidPattern {
			pattern: raw.to_string(),
			reason: reason.to_string(),
		};
		if !raw.starts_with('/') {
			return Err(invalid("must start with '/'"));
		}

		let mut segments = Vec::new();
		let mut seen = Vec::new();
		for part in raw.trim_matches('/').split('/').filter(|p| !p.is_empty()) {
			if let Some(inner) = part.strip_prefix('{') {
				let inner = inner
					.strip_suffix('}')
					.ok_or_else(|| invalid("unterminated placeholder"))?;
				let (name, converter) = match inner.split_once(':') {
					None => (inner, Converter::Str),
					Some((name, "int")) => (name, Converter::Int),
					Some((name, "str")) => (name, Converter::Str),
					Some((_, other)) => {
						return Err(invalid(&format!("unknown converter '{other}'")));
					}
				};
				if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
					return Err(invalid("placeholder names must be identifiers"));
				}
				if seen.contains(&name) {
					return Err(invalid(&format!("placeholder '{name}' appears twice")));
				}
				seen.push(name);
				segments.push(Segment::Param {
					name: name.to_string(),
					converter,
				});
			} else if part.contains('{') || part.contains('}') {
				return Err(invalid("placeholders must span a whole segment"));
			} else {
				segments.push(Segment::Literal(part.to_string()));
			}
		}

		Ok(Self {
			raw: raw.to_string(),
			trailing_slash: raw.len() > 1 && raw.ends_with('/'),
			segments,
		})
	}

	/// The pattern as written
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Names of the placeholders, in order
	pub fn param_names(&self) -> Vec<&str> {
		self.segments
			.iter()
			.filter_map(|s| match s {
				Segment::Param { name, .. } => Some(name.as_str()),
				Segment::Literal(_) => None,
			})
			.collect()
	}

	/// Match a request path, returning the decoded captures
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let has_trailing = path.len() > 1 && path.ends_with('/');
		if has_trailing != self.trailing_slash || !path.starts_with('/') {
			return None;
		}
		let parts: Vec<&str> = path.trim_matches('/').split('/').filter(|p| !p.is_empty()).collect();
		if parts.len() != self.segments.len() {
			return None;
		}

		let mut params = HashMap::new();
		for (segment, part) in self.segments.iter().zip(parts) {
			match segment {
				Segment::Literal(literal) => {
					if literal != part {
						return None;
					}
				}
				Segment::Param { name, converter } => {
					let value = percent_decode_str(part).decode_utf8().ok()?.into_owned();
					if !converter.accepts(&value) {
						return None;
					}
					params.insert(name.clone(), value);
				}
			}
		}
		Some(params)
	}

	/// Substitute `params` into the pattern
	///
	/// `name` is only used for error messages.
	pub fn reverse(&self, name: &str, params: &HashMap<String, String>) -> Result<String, UrlError> {
		let mut path = String::from("/");
		for (i, segment) in self.segments.iter().enumerate() {
			if i > 0 {
				path.push('/');
			}
			match segment {
				Segment::Literal(literal) => path.push_str(literal),
				Segment::Param {
					name: param,
					converter,
				} => {
					let value = params.get(param).ok_or_else(|| UrlError::MissingParameter {
						name: name.to_string(),
						param: param.clone(),
					})?;
					if !converter.accepts(value) {
						return Err(UrlError::InvalidParameter {
							name: name.to_string(),
							param: param.clone(),
							value: value.clone(),
						});
					}
					path.extend(utf8_percent_encode(value, SEGMENT));
				}
			}
		}
		if self.trailing_slash && !self.segments.is_empty() {
			path.push('/');
		}
		Ok(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/admin/", "/admin/", true)]
	#[case("/admin/", "/admin", false)]
	#[case("/admin/{app}/", "/admin/blog/", true)]
	#[case("/admin/{app}/", "/admin/blog/article/", false)]
	#[case("/a/{pk:int}/", "/a/007/", true)]
	#[case("/a/{pk:int}/", "/a/-1/", false)]
	#[case("/", "/", true)]
	fn test_matching(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
		let pattern = PathPattern::parse(pattern).unwrap();
		assert_eq!(pattern.matches(path).is_some(), expected);
	}

	#[rstest]
	#[case("admin/")]
	#[case("/a/{pk/")]
	#[case("/a/x{pk}/")]
	#[case("/a/{pk:uuid}/")]
	#[case("/a/{pk}/{pk}/")]
	fn test_invalid_patterns(#[case] raw: &str) {
		assert!(matches!(
			PathPattern::parse(raw),
			Err(UrlError::InvalidPattern { .. })
		));
	}

	#[rstest]
	fn test_reverse_encodes_values() {
		// Arrange
		let pattern = PathPattern::parse("/tags/{slug}/").unwrap();
		let params = HashMap::from([("slug".to_string(), "a b/c".to_string())]);

		// Act
		let path = pattern.reverse("tag", &params).unwrap();

		// Assert
		assert_eq!(path, "/tags/a%20b%2Fc/");
		assert_eq!(pattern.matches(&path).unwrap()["slug"], "a b/c");
	}

	#[rstest]
	fn test_reverse_rejects_non_integer() {
		let pattern = PathPattern::parse("/a/{pk:int}/").unwrap();
		let params = HashMap::from([("pk".to_string(), "x".to_string())]);
		assert!(matches!(
			pattern.reverse("a", &params),
			Err(UrlError::InvalidParameter { .. })
		));
	}

	#[rstest]
	fn test_reverse_missing_parameter() {
		let pattern = PathPattern::parse("/a/{pk:int}/").unwrap();
		assert_eq!(
			pattern.reverse("a", &HashMap::new()),
			Err(UrlError::MissingParameter {
				name: "a".into(),
				param: "pk".into()
			})
		);
	}
}
