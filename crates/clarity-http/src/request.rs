use crate::multipart::{FormSubmission, MULTIPART_CONTENT_TYPE, parse_multipart};
use crate::query_dict::QueryDict;
use bytes::Bytes;
use clarity_core::exception::{Error, Result};
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Uri, Version};
use std::collections::HashMap;
use std::net::SocketAddr;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP Request representation
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	path_params: HashMap<String, String>,
	query: QueryDict,
}

impl Request {
	/// Create a request from its raw parts
	///
	/// The query string is decoded eagerly; an undecodable query string is
	/// treated as empty.
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		let query = uri
			.query()
			.and_then(|q| QueryDict::parse(q).ok())
			.unwrap_or_default();
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			path_params: HashMap::new(),
			query,
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use clarity_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/admin/blog/article/?q=rust&page=2")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/admin/blog/article/");
	/// assert_eq!(request.query_param("q"), Some("rust"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Decoded query parameters
	pub fn query(&self) -> &QueryDict {
		&self.query
	}

	/// Last value of a query parameter
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query.get(name)
	}

	/// Set a path parameter (used by routers for path variable extraction)
	pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(name.into(), value.into());
	}

	/// Get a path parameter captured by the router
	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	/// All captured path parameters
	pub fn path_params(&self) -> &HashMap<String, String> {
		&self.path_params
	}

	/// Whether the request method is POST
	pub fn is_post(&self) -> bool {
		self.method == Method::POST
	}

	/// Content type without parameters, lowercased
	pub fn content_type(&self) -> Option<String> {
		self.headers
			.get(header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
	}

	/// Decode the body as urlencoded form data
	///
	/// A missing content type is accepted; any other content type is a bad request.
	///
	/// # Examples
	///
	/// ```
	/// use clarity_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/admin/blog/article/add/")
	///     .form(&[("title", "Hello")])
	///     .build()
	///     .unwrap();
	///
	/// let data = request.form_data().unwrap();
	/// assert_eq!(data.get("title"), Some("Hello"));
	/// ```
	pub fn form_data(&self) -> Result<QueryDict> {
		match self.content_type() {
			None => {}
			Some(ct) if ct == FORM_CONTENT_TYPE => {}
			Some(other) => {
				return Err(Error::BadRequest(format!(
					"Unsupported content type '{other}', expected {FORM_CONTENT_TYPE}"
				)));
			}
		}
		QueryDict::parse_bytes(&self.body)
			.map_err(|e| Error::BadRequest(format!("Malformed form body: {e}")))
	}

	/// Decode a submitted form, urlencoded or `multipart/form-data`
	///
	/// Multipart text parts land in `data` next to each other like urlencoded
	/// pairs; file parts land in `files`.
	pub async fn form_submission(&self) -> Result<FormSubmission> {
		let is_multipart = self.content_type().as_deref() == Some(MULTIPART_CONTENT_TYPE);
		if !is_multipart {
			return Ok(FormSubmission {
				data: self.form_data()?,
				..Default::default()
			});
		}
		let content_type = self
			.headers
			.get(header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.unwrap_or(MULTIPART_CONTENT_TYPE);
		parse_multipart(content_type, self.body.clone())
			.await
			.map_err(|e| Error::BadRequest(format!("Malformed multipart body: {e}")))
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	headers: HeaderMap,
	body: Bytes,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Add a header; invalid names or values are ignored
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Encode `pairs` as an urlencoded form body
	pub fn form<K: AsRef<str>, V: AsRef<str>>(self, pairs: &[(K, V)]) -> Self {
		let dict: QueryDict = pairs
			.iter()
			.map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
			.collect();
		self.form_dict(&dict)
	}

	/// Encode a [`QueryDict`] as an urlencoded form body
	pub fn form_dict(self, dict: &QueryDict) -> Self {
		self.header(header::CONTENT_TYPE.as_str(), FORM_CONTENT_TYPE)
			.body(dict.urlencode())
	}

	pub fn build(self) -> Result<Request> {
		let uri_str = self.uri.unwrap_or_else(|| "/".to_string());
		let uri: Uri = uri_str
			.parse()
			.map_err(|e| Error::BadRequest(format!("Invalid URI '{uri_str}': {e}")))?;
		Ok(Request::new(
			self.method.unwrap_or(Method::GET),
			uri,
			Version::HTTP_11,
			self.headers,
			self.body,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_query_is_decoded() {
		let request = Request::builder()
			.uri("/list/?q=hello%20world")
			.build()
			.unwrap();
		assert_eq!(request.query_param("q"), Some("hello world"));
	}

	#[rstest]
	fn test_rejects_non_form_content_type() {
		// Arrange
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "application/json")
			.body("{}")
			.build()
			.unwrap();

		// Act
		let result = request.form_data();

		// Assert
		assert!(matches!(result, Err(Error::BadRequest(_))));
	}

	#[rstest]
	fn test_content_type_parameters_are_ignored() {
		let request = Request::builder()
			.method(Method::POST)
			.header(
				"content-type",
				"application/x-www-form-urlencoded; charset=utf-8",
			)
			.body("a=1")
			.build()
			.unwrap();
		assert_eq!(request.form_data().unwrap().get("a"), Some("1"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_form_submission_reads_multipart() {
		// Arrange
		let body = "--XX\r\n\
			Content-Disposition: form-data; name=\"title\"\r\n\r\n\
			new\r\n\
			--XX\r\n\
			Content-Disposition: form-data; name=\"cover\"; filename=\"a.txt\"\r\n\r\n\
			abc\r\n\
			--XX--\r\n";
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "multipart/form-data; boundary=XX")
			.body(body)
			.build()
			.unwrap();

		// Act
		let submission = request.form_submission().await.unwrap();

		// Assert
		assert_eq!(submission.data.get("title"), Some("new"));
		assert_eq!(submission.files.get("cover").unwrap().filename, "a.txt");
	}

	#[rstest]
	#[tokio::test]
	async fn test_form_submission_of_urlencoded_body_has_no_files() {
		let request = Request::builder()
			.method(Method::POST)
			.form(&[("title", "new")])
			.build()
			.unwrap();

		let submission = request.form_submission().await.unwrap();

		assert_eq!(submission.data.get("title"), Some("new"));
		assert!(submission.files.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_truncated_multipart_is_bad_request() {
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "multipart/form-data; boundary=XX")
			.body("--XX\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nnew")
			.build()
			.unwrap();

		let result = request.form_submission().await;

		assert!(matches!(result, Err(Error::BadRequest(_))));
	}

	#[rstest]
	fn test_path_params() {
		let mut request = Request::builder().build().unwrap();
		request.set_path_param("pk", "7");
		assert_eq!(request.path_param("pk"), Some("7"));
		assert_eq!(request.path_param("missing"), None);
	}

	#[rstest]
	fn test_invalid_uri() {
		let result = Request::builder().uri("http://[::1").build();
		assert!(result.is_err());
	}
}
