//! Text helpers for labels and verbose names

/// Uppercase the first character of a string, leaving the rest untouched
///
/// # Examples
///
/// ```
/// use clarity_core::text::capfirst;
///
/// assert_eq!(capfirst("title"), "Title");
/// assert_eq!(capfirst("blog post"), "Blog post");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(value: &str) -> String {
	let mut chars = value.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Turn a field name into a human readable label
///
/// Underscores become spaces and the first letter is capitalized.
///
/// # Examples
///
/// ```
/// use clarity_core::text::humanize_field_name;
///
/// assert_eq!(humanize_field_name("published_at"), "Published at");
/// assert_eq!(humanize_field_name("title"), "Title");
/// ```
pub fn humanize_field_name(name: &str) -> String {
	capfirst(name.replace('_', " ").trim())
}

/// Derive a verbose name from a model name
///
/// `BlogPost` and `blog_post` both become `blog post`; an already lowercase
/// name is kept as is.
///
/// # Examples
///
/// ```
/// use clarity_core::text::verbose_name_from_model;
///
/// assert_eq!(verbose_name_from_model("BlogPost"), "blog post");
/// assert_eq!(verbose_name_from_model("article"), "article");
/// ```
pub fn verbose_name_from_model(model_name: &str) -> String {
	let mut out = String::with_capacity(model_name.len() + 4);
	for (index, ch) in model_name.chars().enumerate() {
		if ch == '_' {
			out.push(' ');
		} else if ch.is_uppercase() {
			if index > 0 && !out.ends_with(' ') {
				out.push(' ');
			}
			out.extend(ch.to_lowercase());
		} else {
			out.push(ch);
		}
	}
	out
}

/// Naive English plural used for verbose names
///
/// # Examples
///
/// ```
/// use clarity_core::text::pluralize;
///
/// assert_eq!(pluralize("article"), "articles");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("box"), "boxes");
/// ```
pub fn pluralize(word: &str) -> String {
	if let Some(stem) = word.strip_suffix('y') {
		let before = stem.chars().last();
		if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u')) {
			return format!("{stem}ies");
		}
	}
	if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
		return format!("{word}es");
	}
	format!("{word}s")
}
