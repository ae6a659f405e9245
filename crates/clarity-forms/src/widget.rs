use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
	TextInput,
	Textarea,
	NumberInput,
	CheckboxInput,
	DateInput,
	DateTimeInput,
	Select,
	RadioButtons,
	/// Rich-text editor; list views leave these fields out of their columns
	RichText,
	HiddenInput,
}

/// Rendering hint for a form field: a widget kind plus free-form attributes
///
/// # Examples
///
/// ```
/// use clarity_forms::{Widget, WidgetKind};
///
/// let widget = Widget::new(WidgetKind::RichText).with_attr("col_md_width", "12");
/// assert_eq!(widget.attr("col_md_width"), Some("12"));
/// assert!(widget.is_rich_text());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
	pub kind: WidgetKind,
	#[serde(default)]
	pub attrs: IndexMap<String, String>,
}

impl Widget {
	pub fn new(kind: WidgetKind) -> Self {
		Self {
			kind,
			attrs: IndexMap::new(),
		}
	}

	pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.insert(name.into(), value.into());
		self
	}

	pub fn attr(&self, name: &str) -> Option<&str> {
		self.attrs.get(name).map(String::as_str)
	}

	pub fn is_rich_text(&self) -> bool {
		self.kind == WidgetKind::RichText
	}

	pub fn is_checkbox(&self) -> bool {
		self.kind == WidgetKind::CheckboxInput
	}
}

impl From<WidgetKind> for Widget {
	fn from(kind: WidgetKind) -> Self {
		Self::new(kind)
	}
}
