use super::{Action, ViewConfig, finish};
use crate::error::AdminResult;
use crate::render::LIST_TEMPLATE;
use async_trait::async_trait;
use clarity_db::schema::display_value;
use clarity_db::{Filter, FilterCondition, ListQuery, OrderBy, Record};
use clarity_http::{Handler, Request, Response};
use hyper::Method;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const SEARCH_PARAM: &str = "q";
/// Accepted when `q` is absent
pub const LEGACY_SEARCH_PARAM: &str = "search";
pub const PAGE_PARAM: &str = "page";

/// Computed columns shown after the model columns of a list page
///
/// # Examples
///
/// ```
/// use clarity_admin::views::ExtraColumns;
/// use clarity_db::Record;
/// use serde_json::{Map, Value, json};
///
/// struct TitleLength;
///
/// impl ExtraColumns for TitleLength {
///     fn headers(&self) -> Vec<Value> {
///         vec![json!({"key": "title_length", "label": "Length"})]
///     }
///
///     fn values(&self, record: &Record) -> Map<String, Value> {
///         let length = record.get("title").and_then(Value::as_str).map_or(0, str::len);
///         Map::from_iter([("title_length".to_string(), json!(length))])
///     }
/// }
/// ```
pub trait ExtraColumns: Send + Sync {
	/// Header entries, placed before the update and delete columns
	fn headers(&self) -> Vec<Value>;

	/// Values of one row, keyed like the headers; a key naming a model
	/// column replaces its value
	fn values(&self, record: &Record) -> Map<String, Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
	pub total: usize,
	pub per_page: usize,
	pub current_page: usize,
	pub num_pages: usize,
}

impl Pagination {
	/// Clamp the requested page
	///
	/// Anything that is not a page number between 1 and the last page
	/// selects page 1.
	///
	/// # Examples
	///
	/// ```
	/// use clarity_admin::views::Pagination;
	///
	/// assert_eq!(Pagination::new(25, 10, Some("3")).current_page, 3);
	/// assert_eq!(Pagination::new(25, 10, Some("4")).current_page, 1);
	/// assert_eq!(Pagination::new(25, 10, Some("-1")).current_page, 1);
	/// assert_eq!(Pagination::new(25, 10, Some("abc")).current_page, 1);
	/// assert_eq!(Pagination::new(0, 10, None).num_pages, 1);
	/// ```
	pub fn new(total: usize, per_page: usize, requested: Option<&str>) -> Self {
		let per_page = per_page.max(1);
		let num_pages = total.div_ceil(per_page).max(1);
		let current_page = requested
			.and_then(|raw| raw.trim().parse::<usize>().ok())
			.filter(|page| (1..=num_pages).contains(page))
			.unwrap_or(1);
		Self {
			total,
			per_page,
			current_page,
			num_pages,
		}
	}

	pub fn offset(&self) -> usize {
		(self.current_page - 1) * self.per_page
	}
}

/// Paginated, searchable list of a model's rows
#[derive(Debug)]
pub struct ListView {
	config: Arc<ViewConfig>,
}

impl ListView {
	pub fn new(config: Arc<ViewConfig>) -> Self {
		Self { config }
	}

	/// Layout names shown as columns; rich-text fields do not fit a table
	fn columns(&self) -> Vec<&str> {
		self.config
			.layout
			.names()
			.into_iter()
			.filter(|name| {
				self.config
					.form
					.field(name)
					.is_none_or(|spec| !spec.widget.is_rich_text())
			})
			.collect()
	}

	/// OR of case-insensitive matches over the editable, non-relational columns
	fn search_condition(&self, term: &str) -> Option<FilterCondition> {
		let filters: Vec<Filter> = self
			.columns()
			.into_iter()
			.filter(|name| self.config.form.field(name).is_some())
			.filter(|name| {
				self.config
					.model
					.get_field(name)
					.is_some_and(|def| !def.kind.is_relation())
			})
			.map(|name| Filter::icontains(name, term))
			.collect();
		(!filters.is_empty()).then(|| FilterCondition::or_filters(filters))
	}

	/// Display labels of the rows the foreign key columns of `rows` point at
	async fn relation_labels(&self, rows: &[Record]) -> AdminResult<HashMap<String, HashMap<i64, String>>> {
		let mut labels = HashMap::new();
		for name in self.columns() {
			let Some(def) = self.config.model.get_field(name) else {
				continue;
			};
			if !def.kind.is_relation() {
				continue;
			}
			let mut pks: Vec<i64> = rows
				.iter()
				.filter_map(|row| row.get(name).and_then(Value::as_i64))
				.collect();
			pks.sort_unstable();
			pks.dedup();
			let pks = pks.into_iter().map(Value::from).collect();
			if let Some(options) = self.config.related_rows(def, Some(pks)).await? {
				let by_pk = options.into_iter().map(|o| (o.pk, o.label)).collect();
				labels.insert(name.to_string(), by_pk);
			}
		}
		Ok(labels)
	}

	fn item(
		&self,
		record: &Record,
		relations: &HashMap<String, HashMap<i64, String>>,
	) -> AdminResult<Value> {
		let model = &self.config.model;
		let mut item = Map::new();
		for name in self.columns() {
			let value = record.get(name).unwrap_or(&Value::Null);
			let shown = if let Some(label) = model.choice_label(name, value) {
				Value::String(label.to_string())
			} else if let Some(by_pk) = relations.get(name) {
				let label = value
					.as_i64()
					.and_then(|pk| by_pk.get(&pk).cloned())
					.unwrap_or_else(|| display_value(value));
				Value::String(label)
			} else {
				value.clone()
			};
			item.insert(name.to_string(), shown);
		}
		if let Some(extra) = &self.config.extra_columns {
			item.extend(extra.values(record));
		}
		let pk = record.pk();
		for action in [Action::Update, Action::Delete] {
			item.insert(
				self.config.url_name(action),
				Value::String(self.config.reverse(action, pk)?),
			);
		}
		Ok(Value::Object(item))
	}

	fn headers(&self) -> Vec<Value> {
		let mut headers: Vec<Value> = self
			.columns()
			.into_iter()
			.map(|name| json!({"key": name, "sortable": true}))
			.collect();
		if let Some(extra) = &self.config.extra_columns {
			headers.extend(extra.headers());
		}
		headers.push(json!({"key": self.config.url_name(Action::Update), "label": "Update"}));
		headers.push(json!({"key": self.config.url_name(Action::Delete), "label": "Delete"}));
		headers
	}

	async fn get(&self, request: &Request) -> AdminResult<Response> {
		let config = &self.config;
		let term = request
			.query_param(SEARCH_PARAM)
			.or_else(|| request.query_param(LEGACY_SEARCH_PARAM))
			.unwrap_or_default()
			.trim()
			.to_string();
		let condition = if term.is_empty() {
			None
		} else {
			self.search_condition(&term)
		};

		let total = config.store().count(&config.model, condition.as_ref()).await?;
		let pagination = Pagination::new(total, config.list_per_page, request.query_param(PAGE_PARAM));

		let mut query = ListQuery::new()
			.offset(pagination.offset())
			.limit(pagination.per_page);
		if let Some(condition) = condition {
			query = query.filter(condition);
		}
		for field in &config.ordering {
			query = query.order_by(OrderBy::parse(field));
		}
		let rows = config.store().list(&config.model, &query).await?;

		let relations = self.relation_labels(&rows).await?;
		let items = rows
			.iter()
			.map(|row| self.item(row, &relations))
			.collect::<AdminResult<Vec<_>>>()?;

		let context = json!({
			"items": items,
			"fields": self.headers(),
			"pagination": pagination,
			"search": term,
			"create_url": config.reverse(Action::Create, None)?,
			"update_url_name": config.url_name(Action::Update),
			"delete_url_name": config.url_name(Action::Delete),
			"model_verbose_name": config.model.verbose_name,
			"model_verbose_name_plural": config.model.verbose_name_plural,
		});
		config.render(LIST_TEMPLATE, &context)
	}
}

#[async_trait]
impl Handler for ListView {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		match request.method {
			Method::GET => finish("ListView", self.get(&request).await),
			_ => Ok(Response::method_not_allowed(&["GET"])),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(None, 1)]
	#[case(Some("1"), 1)]
	#[case(Some("2"), 2)]
	#[case(Some("3"), 3)]
	#[case(Some("0"), 1)]
	#[case(Some("-1"), 1)]
	#[case(Some("abc"), 1)]
	#[case(Some("99"), 1)]
	fn test_page_clamping(#[case] requested: Option<&str>, #[case] expected: usize) {
		let pagination = Pagination::new(25, 10, requested);
		assert_eq!(pagination.current_page, expected);
		assert_eq!(pagination.num_pages, 3);
	}

	#[rstest]
	fn test_offset() {
		assert_eq!(Pagination::new(25, 10, Some("3")).offset(), 20);
	}
}
