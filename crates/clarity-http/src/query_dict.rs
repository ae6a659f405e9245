//! Multi-valued, ordered key/value data decoded from query strings and form bodies

use indexmap::IndexMap;

/// Ordered multi-value map for submitted form and query data
///
/// A key may appear several times in a submission (checkbox groups, repeated
/// parameters). [`QueryDict::get`] returns the last value, mirroring how
/// browsers and most frameworks treat duplicated scalar fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
	entries: IndexMap<String, Vec<String>>,
}

impl QueryDict {
	/// Create an empty dictionary
	pub fn new() -> Self {
		Self::default()
	}

	/// Decode an `application/x-www-form-urlencoded` payload
	///
	/// # Examples
	///
	/// ```
	/// use clarity_http::QueryDict;
	///
	/// let data = QueryDict::parse("title=Hello+World&tag=a&tag=b").unwrap();
	/// assert_eq!(data.get("title"), Some("Hello World"));
	/// assert_eq!(data.get_list("tag"), ["a", "b"]);
	/// ```
	pub fn parse(input: &str) -> Result<Self, serde_urlencoded::de::Error> {
		Self::parse_bytes(input.as_bytes())
	}

	/// Decode an urlencoded payload from raw bytes
	pub fn parse_bytes(input: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
		let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)?;
		Ok(pairs.into_iter().collect())
	}

	/// Encode back into an urlencoded string
	pub fn urlencode(&self) -> String {
		let pairs: Vec<(&str, &str)> = self
			.entries
			.iter()
			.flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
			.collect();
		serde_urlencoded::to_string(pairs).unwrap_or_default()
	}

	/// Last value submitted for `key`
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries
			.get(key)
			.and_then(|values| values.last())
			.map(String::as_str)
	}

	/// Every value submitted for `key`, in submission order
	pub fn get_list(&self, key: &str) -> &[String] {
		self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Append a value for `key`
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.entries.entry(key.into()).or_default().push(value.into());
	}

	/// Replace all values of `key` with a single value
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.entries.insert(key.into(), vec![value.into()]);
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

	/// Iterate over keys and their last value
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().filter_map(|(key, values)| {
			values.last().map(|value| (key.as_str(), value.as_str()))
		})
	}

	/// Blank every value that equals one of `markers`
	///
	/// Rich-text editors submit placeholder markup for an empty document;
	/// treating it as an empty string keeps untouched extra formset rows from
	/// being mistaken for new records.
	///
	/// # Examples
	///
	/// ```
	/// use clarity_http::QueryDict;
	///
	/// let mut data = QueryDict::parse("body=%3Cp%3E%26nbsp%3B%3C%2Fp%3E&title=x").unwrap();
	/// data.blank_values(&["<p>&nbsp;</p>".to_string()]);
	/// assert_eq!(data.get("body"), Some(""));
	/// assert_eq!(data.get("title"), Some("x"));
	/// ```
	pub fn blank_values(&mut self, markers: &[String]) {
		if markers.is_empty() {
			return;
		}
		for values in self.entries.values_mut() {
			for value in values.iter_mut() {
				if markers.iter().any(|marker| marker == value) {
					value.clear();
				}
			}
		}
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryDict {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut dict = QueryDict::new();
		for (key, value) in iter {
			dict.append(key, value);
		}
		dict
	}
}
