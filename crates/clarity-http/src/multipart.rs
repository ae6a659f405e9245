//! `multipart/form-data` bodies: text parts become form data, file parts uploads

use crate::query_dict::QueryDict;
use bytes::Bytes;
use futures_util::future::ready;
use futures_util::stream::once;
use indexmap::IndexMap;

pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// A file part of a multipart submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
	pub filename: String,
	pub content_type: Option<String>,
	pub data: Bytes,
}

impl UploadedFile {
	pub fn size(&self) -> usize {
		self.data.len()
	}
}

/// Uploaded files by input name, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDict {
	entries: IndexMap<String, Vec<UploadedFile>>,
}

impl FileDict {
	pub fn new() -> Self {
		Self::default()
	}

	/// Last file submitted for `key`
	pub fn get(&self, key: &str) -> Option<&UploadedFile> {
		self.entries.get(key).and_then(|files| files.last())
	}

	pub fn get_list(&self, key: &str) -> &[UploadedFile] {
		self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn append(&mut self, key: impl Into<String>, file: UploadedFile) {
		self.entries.entry(key.into()).or_default().push(file);
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}
}

/// Decoded form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
	pub data: QueryDict,
	pub files: FileDict,
}

/// Split a multipart body into text fields and uploaded files
///
/// A part carrying a filename is a file. A file input left blank arrives
/// with an empty filename and no content and is skipped. Parts without a
/// name are ignored.
///
/// # Examples
///
/// ```
/// use clarity_http::multipart::parse_multipart;
///
/// # async fn example() {
/// let body = "--XX\r\n\
///     Content-Disposition: form-data; name=\"title\"\r\n\r\n\
///     Hello\r\n\
///     --XX--\r\n";
/// let submission = parse_multipart("multipart/form-data; boundary=XX", body.into())
///     .await
///     .unwrap();
/// assert_eq!(submission.data.get("title"), Some("Hello"));
/// assert!(submission.files.is_empty());
/// # }
/// ```
pub async fn parse_multipart(content_type: &str, body: Bytes) -> Result<FormSubmission, multer::Error> {
	let boundary = multer::parse_boundary(content_type)?;
	let stream = once(ready(Ok::<_, std::io::Error>(body)));
	let mut multipart = multer::Multipart::new(stream, boundary);

	let mut submission = FormSubmission::default();
	while let Some(field) = multipart.next_field().await? {
		let Some(name) = field.name().map(str::to_string) else {
			continue;
		};
		match field.file_name().map(str::to_string) {
			Some(filename) => {
				let content_type = field.content_type().map(ToString::to_string);
				let data = field.bytes().await?;
				if filename.is_empty() && data.is_empty() {
					continue;
				}
				submission.files.append(
					name,
					UploadedFile {
						filename,
						content_type,
						data,
					},
				);
			}
			None => {
				let text = field.text().await?;
				submission.data.append(name, text);
			}
		}
	}
	Ok(submission)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const CONTENT_TYPE: &str = "multipart/form-data; boundary=XX";

	fn body(parts: &[&str]) -> Bytes {
		let mut body = String::new();
		for part in parts {
			body.push_str("--XX\r\n");
			body.push_str(part);
			body.push_str("\r\n");
		}
		body.push_str("--XX--\r\n");
		Bytes::from(body)
	}

	#[rstest]
	#[tokio::test]
	async fn test_text_and_file_parts_are_split() {
		// Arrange
		let body = body(&[
			"Content-Disposition: form-data; name=\"title\"\r\n\r\nHello",
			"Content-Disposition: form-data; name=\"tag\"\r\n\r\na",
			"Content-Disposition: form-data; name=\"tag\"\r\n\r\nb",
			"Content-Disposition: form-data; name=\"cover\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\nPNG",
		]);

		// Act
		let submission = parse_multipart(CONTENT_TYPE, body).await.unwrap();

		// Assert
		assert_eq!(submission.data.get("title"), Some("Hello"));
		assert_eq!(submission.data.get_list("tag"), ["a", "b"]);
		assert!(!submission.data.contains_key("cover"));
		let cover = submission.files.get("cover").unwrap();
		assert_eq!(cover.filename, "cover.png");
		assert_eq!(cover.content_type.as_deref(), Some("image/png"));
		assert_eq!(cover.data, Bytes::from_static(b"PNG"));
		assert_eq!(cover.size(), 3);
	}

	#[rstest]
	#[tokio::test]
	async fn test_blank_file_input_is_skipped() {
		let body = body(&[
			"Content-Disposition: form-data; name=\"cover\"; filename=\"\"\r\nContent-Type: application/octet-stream\r\n\r\n",
		]);

		let submission = parse_multipart(CONTENT_TYPE, body).await.unwrap();

		assert!(submission.files.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_boundary_fails() {
		let result = parse_multipart("multipart/form-data", Bytes::new()).await;
		assert!(result.is_err());
	}
}
