use async_trait::async_trait;
use clarity_admin::views::{Action, ExtraColumns, UpdateView, ViewConfig};
use clarity_admin::{AdminSite, InlineModelAdmin, JsonRenderer, ModelAdmin};
use clarity_conf::AdminSettings;
use clarity_db::{FieldDef, MemoryStore, ModelSchema, ModelStore, OnDelete, Record};
use clarity_forms::{CleanHook, FormError, FormResult, Widget, WidgetKind};
use clarity_http::{Handler, Request, Response};
use clarity_urls::Router;
use hyper::{Method, StatusCode};
use rstest::{fixture, rstest};
use serde_json::{Map, Value, json};
use std::sync::Arc;

struct Blog {
	store: Arc<MemoryStore>,
	article: Arc<ModelSchema>,
	tag: Arc<ModelSchema>,
	router: Router,
}

fn article_schema() -> Arc<ModelSchema> {
	Arc::new(
		ModelSchema::new("blog", "Article")
			.field(FieldDef::char("title", 100).unique(true))
			.field(
				FieldDef::char("status", 1)
					.choices([("d", "Draft"), ("p", "Published")])
					.default_value("d"),
			)
			.field(FieldDef::text("body").blank(true))
			.display_field("title"),
	)
}

fn tag_schema(article: &ModelSchema) -> Arc<ModelSchema> {
	Arc::new(
		ModelSchema::new("blog", "Tag")
			.field(FieldDef::foreign_key("article", article.key.clone(), OnDelete::Cascade))
			.field(FieldDef::char("name", 30).unique(true))
			.display_field("name"),
	)
}

fn blog_with(admin: impl FnOnce(Arc<ModelSchema>) -> ModelAdmin) -> Blog {
	let article = article_schema();
	let tag = tag_schema(&article);
	let store = Arc::new(MemoryStore::with_models([article.clone(), tag.clone()]).unwrap());
	let mut site = AdminSite::new();
	site.register(article.clone(), admin(tag.clone()));
	let router = site
		.build_router(store.clone(), Arc::new(JsonRenderer), &AdminSettings::default())
		.unwrap();
	Blog {
		store,
		article,
		tag,
		router,
	}
}

#[fixture]
fn blog() -> Blog {
	blog_with(|tag| {
		ModelAdmin::new()
			.with_fields(["title", "status", "body"])
			.with_widget("body", Widget::new(WidgetKind::RichText))
			.with_inline(InlineModelAdmin::new(tag).with_extra(1))
	})
}

async fn send(router: &Router, request: Request) -> Response {
	match router.handle(request).await {
		Ok(response) => response,
		Err(err) => Response::from(err),
	}
}

async fn get(router: &Router, uri: &str) -> Response {
	send(router, Request::builder().uri(uri).build().unwrap()).await
}

async fn post(router: &Router, uri: &str, form: &[(&str, &str)]) -> Response {
	let request = Request::builder()
		.method(Method::POST)
		.uri(uri)
		.form(form)
		.build()
		.unwrap();
	send(router, request).await
}

fn context(response: &Response) -> Value {
	response.json().unwrap()["context"].clone()
}

async fn seed(blog: &Blog, title: &str) -> i64 {
	blog.store
		.insert(
			blog.article.clone(),
			Record::from_pairs([("title", json!(title)), ("body", json!(""))]),
		)
		.await
		.unwrap()
}

async fn tag_count(blog: &Blog) -> usize {
	blog.store.count(&blog.tag, None).await.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_create_update_delete_round_trip(blog: Blog) {
	// Arrange
	let form = [("title", "Hello"), ("status", "p"), ("body", "")];

	// Act
	let created = post(&blog.router, "/admin/blog/article/add/", &form).await;
	let updated = post(
		&blog.router,
		"/admin/blog/article/1/change/",
		&[
			("title", "Hello again"),
			("status", "p"),
			("body", ""),
			("tag_set-TOTAL_FORMS", "0"),
			("tag_set-INITIAL_FORMS", "0"),
		],
	)
	.await;
	let listed = get(&blog.router, "/admin/blog/article/").await;
	let deleted = post(&blog.router, "/admin/blog/article/1/delete/", &[]).await;
	let relisted = get(&blog.router, "/admin/blog/article/").await;

	// Assert
	assert_eq!(created.status, StatusCode::FOUND);
	assert_eq!(created.location(), Some("/admin/blog/article/1/change/"));
	assert_eq!(updated.status, StatusCode::FOUND);
	assert_eq!(updated.location(), Some("/admin/blog/article/1/change/"));
	let items = context(&listed)["items"].clone();
	assert_eq!(items.as_array().unwrap().len(), 1);
	assert_eq!(items[0]["title"], "Hello again");
	assert_eq!(items[0]["status"], "Published");
	assert_eq!(items[0]["clarity-blog-article-update"], "/admin/blog/article/1/change/");
	assert_eq!(items[0]["clarity-blog-article-delete"], "/admin/blog/article/1/delete/");
	assert_eq!(deleted.location(), Some("/admin/blog/article/"));
	assert_eq!(context(&relisted)["items"], json!([]));
	assert_eq!(blog.store.count(&blog.article, None).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn test_list_headers_skip_rich_text(blog: Blog) {
	let response = get(&blog.router, "/admin/blog/article/").await;

	let ctx = context(&response);
	assert_eq!(
		ctx["fields"],
		json!([
			{"key": "title", "sortable": true},
			{"key": "status", "sortable": true},
			{"key": "clarity-blog-article-update", "label": "Update"},
			{"key": "clarity-blog-article-delete", "label": "Delete"},
		])
	);
	assert_eq!(ctx["create_url"], "/admin/blog/article/add/");
	assert_eq!(ctx["model_verbose_name"], "article");
	assert_eq!(ctx["update_url_name"], "clarity-blog-article-update");
}

#[rstest]
#[case("/admin/blog/article/?q=RUST", 2)]
#[case("/admin/blog/article/?q=go", 1)]
#[case("/admin/blog/article/?search=rust", 2)]
#[case("/admin/blog/article/?q=nothing", 0)]
#[case("/admin/blog/article/?q=", 3)]
#[tokio::test]
async fn test_search(blog: Blog, #[case] uri: &str, #[case] expected: usize) {
	// Arrange
	for title in ["Learning Rust", "rust in production", "Go basics"] {
		seed(&blog, title).await;
	}

	// Act
	let response = get(&blog.router, uri).await;

	// Assert
	let ctx = context(&response);
	assert_eq!(ctx["items"].as_array().unwrap().len(), expected);
	assert_eq!(ctx["pagination"]["total"], expected);
}

#[rstest]
#[case("1", 10, "Article 01")]
#[case("2", 10, "Article 11")]
#[case("3", 5, "Article 21")]
#[case("0", 10, "Article 01")]
#[case("-1", 10, "Article 01")]
#[case("abc", 10, "Article 01")]
#[case("4", 10, "Article 01")]
#[tokio::test]
async fn test_pagination(blog: Blog, #[case] page: &str, #[case] rows: usize, #[case] first: &str) {
	// Arrange
	for n in 1..=25 {
		seed(&blog, &format!("Article {n:02}")).await;
	}

	// Act
	let response = get(&blog.router, &format!("/admin/blog/article/?page={page}")).await;

	// Assert
	let ctx = context(&response);
	let items = ctx["items"].as_array().unwrap();
	assert_eq!(items.len(), rows);
	assert_eq!(items[0]["title"], first);
	assert_eq!(ctx["pagination"]["per_page"], 10);
	assert_eq!(ctx["pagination"]["num_pages"], 3);
}

#[rstest]
#[tokio::test]
async fn test_update_saves_parent_and_children_together(blog: Blog) {
	// Arrange
	let pk = seed(&blog, "Draft post").await;
	let uri = format!("/admin/blog/article/{pk}/change/");
	let form = [
		("title", "Final post"),
		("status", "p"),
		("body", "<p>&nbsp;</p>"),
		("tag_set-TOTAL_FORMS", "1"),
		("tag_set-INITIAL_FORMS", "0"),
		("tag_set-0-name", "rust"),
	];

	// Act
	let response = post(&blog.router, &uri, &form).await;

	// Assert
	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some(uri.as_str()));
	let saved = blog.store.get(&blog.article, pk).await.unwrap().unwrap();
	assert_eq!(saved.get("title"), Some(&json!("Final post")));
	assert_eq!(saved.get("body"), Some(&json!("")));
	let tags = blog.store.list(&blog.tag, &Default::default()).await.unwrap();
	assert_eq!(tags.len(), 1);
	assert_eq!(tags[0].get("article"), Some(&json!(pk)));
}

#[rstest]
#[tokio::test]
async fn test_multipart_update_is_accepted(blog: Blog) {
	// Arrange
	let pk = seed(&blog, "old").await;
	let uri = format!("/admin/blog/article/{pk}/change/");
	let mut body = String::new();
	for (name, value) in [
		("title", "new"),
		("status", "d"),
		("body", ""),
		("tag_set-TOTAL_FORMS", "1"),
		("tag_set-INITIAL_FORMS", "0"),
		("tag_set-0-name", "uploads"),
	] {
		body.push_str(&format!(
			"--XX\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
		));
	}
	body.push_str(
		"--XX\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"cover.png\"\r\n\
		Content-Type: image/png\r\n\r\nPNG\r\n--XX--\r\n",
	);
	let request = Request::builder()
		.method(Method::POST)
		.uri(&uri)
		.header("content-type", "multipart/form-data; boundary=XX")
		.body(body)
		.build()
		.unwrap();

	// Act
	let response = send(&blog.router, request).await;

	// Assert
	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some(uri.as_str()));
	let saved = blog.store.get(&blog.article, pk).await.unwrap().unwrap();
	assert_eq!(saved.get("title"), Some(&json!("new")));
	assert_eq!(tag_count(&blog).await, 1);
}

#[rstest]
#[tokio::test]
async fn test_empty_editor_markup_leaves_extra_form_unchanged(blog: Blog) {
	// Arrange
	let pk = seed(&blog, "Post").await;
	let form = [
		("title", "Post"),
		("status", "d"),
		("body", ""),
		("tag_set-TOTAL_FORMS", "1"),
		("tag_set-INITIAL_FORMS", "0"),
		("tag_set-0-name", "<p>&nbsp;</p>"),
	];

	// Act
	let response = post(&blog.router, &format!("/admin/blog/article/{pk}/change/"), &form).await;

	// Assert
	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(tag_count(&blog).await, 0);
}

#[rstest]
#[tokio::test]
async fn test_invalid_child_leaves_parent_unchanged(blog: Blog) {
	// Arrange
	let pk = seed(&blog, "Original").await;
	let long_name = "x".repeat(31);
	let form = [
		("title", "Changed"),
		("status", "d"),
		("body", ""),
		("tag_set-TOTAL_FORMS", "1"),
		("tag_set-INITIAL_FORMS", "0"),
		("tag_set-0-name", long_name.as_str()),
	];

	// Act
	let response = post(&blog.router, &format!("/admin/blog/article/{pk}/change/"), &form).await;

	// Assert
	assert_eq!(response.status, StatusCode::OK);
	assert!(!response.is_redirect());
	assert_eq!(
		context(&response)["all_errors"],
		json!(["Tag 1 - Name: Ensure this value has at most 30 characters (it has 31)."])
	);
	let stored = blog.store.get(&blog.article, pk).await.unwrap().unwrap();
	assert_eq!(stored.get("title"), Some(&json!("Original")));
	assert_eq!(tag_count(&blog).await, 0);
}

#[rstest]
#[tokio::test]
async fn test_failed_write_rolls_back_whole_update(blog: Blog) {
	// Arrange
	let pk = seed(&blog, "First").await;
	let other = seed(&blog, "Second").await;
	blog.store
		.insert(
			blog.tag.clone(),
			Record::from_pairs([("article", json!(other)), ("name", json!("taken"))]),
		)
		.await
		.unwrap();
	let form = [
		("title", "First, edited"),
		("status", "d"),
		("body", ""),
		("tag_set-TOTAL_FORMS", "1"),
		("tag_set-INITIAL_FORMS", "0"),
		("tag_set-0-name", "taken"),
	];

	// Act
	let response = post(&blog.router, &format!("/admin/blog/article/{pk}/change/"), &form).await;

	// Assert
	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	let stored = blog.store.get(&blog.article, pk).await.unwrap().unwrap();
	assert_eq!(stored.get("title"), Some(&json!("First")));
	assert_eq!(tag_count(&blog).await, 1);
}

#[rstest]
#[tokio::test]
async fn test_update_page_context(blog: Blog) {
	// Arrange
	let pk = seed(&blog, "Hello").await;
	blog.store
		.insert(
			blog.tag.clone(),
			Record::from_pairs([("article", json!(pk)), ("name", json!("intro"))]),
		)
		.await
		.unwrap();

	// Act
	let response = get(&blog.router, &format!("/admin/blog/article/{pk}/change/")).await;

	// Assert
	assert_eq!(response.status, StatusCode::OK);
	let ctx = context(&response);
	assert_eq!(ctx["object"], "Hello");
	assert_eq!(ctx["index_url"], "/admin/blog/article/");
	assert_eq!(ctx["delete_url"], format!("/admin/blog/article/{pk}/delete/"));
	assert_eq!(ctx["all_errors"], json!([]));
	let formset = &ctx["formsets"][0];
	assert_eq!(formset["prefix"], "tag_set");
	assert_eq!(formset["management_form"]["total_forms"], 2);
	assert_eq!(formset["management_form"]["initial_forms"], 1);
	assert_eq!(formset["forms"][0]["cells"][0]["field"]["value"], "intro");
	assert_eq!(formset["forms"][0]["cells"][0]["col_md_width"], "12");
	let widths: Vec<&str> = ctx["form_layout"]
		.as_array()
		.unwrap()
		.iter()
		.map(|cell| cell["col_md_width"].as_str().unwrap())
		.collect();
	assert_eq!(widths, vec!["6", "6", "12"]);
}

#[rstest]
#[tokio::test]
async fn test_errors_list_non_field_errors_first() {
	// Arrange
	let hook: CleanHook =
		Arc::new(|_: &Record| -> FormResult<()> { Err(FormError::Validation("X".into())) });
	let blog = blog_with(move |_| ModelAdmin::new().with_fields(["title"]).with_clean_hook(hook));

	// Act
	let response = post(&blog.router, "/admin/blog/article/add/", &[("title", "")]).await;

	// Assert
	assert_eq!(response.status, StatusCode::OK);
	let ctx = context(&response);
	assert_eq!(ctx["all_errors"], json!(["X", "Title: This field is required."]));
	assert_eq!(ctx["index_url"], "/admin/blog/article/");
}

#[rstest]
#[tokio::test]
async fn test_create_page_names_inline_models(blog: Blog) {
	let response = get(&blog.router, "/admin/blog/article/add/").await;

	let ctx = context(&response);
	assert_eq!(ctx["formset_model_names"], json!(["tag"]));
	assert_eq!(ctx["form_layout"][1]["field"]["value"], "d");
}

#[rstest]
#[tokio::test]
async fn test_delete_get_is_side_effect_free(blog: Blog) {
	// Arrange
	blog.store
		.insert(
			blog.article.clone(),
			Record::from_pairs([("id", json!(7)), ("title", json!("Doomed")), ("body", json!(""))]),
		)
		.await
		.unwrap();

	// Act
	let confirm = get(&blog.router, "/admin/blog/article/7/delete/").await;
	let count_after_get = blog.store.count(&blog.article, None).await.unwrap();
	let deleted = post(&blog.router, "/admin/blog/article/7/delete/", &[]).await;

	// Assert
	assert_eq!(confirm.status, StatusCode::OK);
	assert_eq!(context(&confirm)["object"], "Doomed");
	assert_eq!(count_after_get, 1);
	assert_eq!(deleted.status, StatusCode::FOUND);
	assert_eq!(deleted.location(), Some("/admin/blog/article/"));
	assert!(blog.store.get(&blog.article, 7).await.unwrap().is_none());
}

#[rstest]
#[case("/admin/blog/article/index/", "/admin/blog/article/")]
#[case("/admin/blog/article/delete/", "/admin/blog/article/")]
#[case("/admin/blog/article/change/", "/admin/blog/article/")]
#[case("/admin/blog/article/5/", "/admin/blog/article/5/change/")]
#[tokio::test]
async fn test_legacy_redirects(blog: Blog, #[case] uri: &str, #[case] target: &str) {
	let response = get(&blog.router, uri).await;

	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some(target));
}

#[rstest]
#[case("/admin/blog/article/999/change/")]
#[case("/admin/blog/article/999/delete/")]
#[case("/admin/blog/nothing/")]
#[tokio::test]
async fn test_unknown_object_is_not_found(blog: Blog, #[case] uri: &str) {
	let response = get(&blog.router, uri).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case(Method::PUT, "/admin/blog/article/add/")]
#[case(Method::DELETE, "/admin/blog/article/1/delete/")]
#[case(Method::POST, "/admin/blog/article/")]
#[tokio::test]
async fn test_unsupported_method(blog: Blog, #[case] method: Method, #[case] uri: &str) {
	seed(&blog, "Any").await;
	let request = Request::builder().method(method).uri(uri).build().unwrap();

	let response = send(&blog.router, request).await;

	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[tokio::test]
async fn test_index_pages(blog: Blog) {
	let site = get(&blog.router, "/admin/").await;
	let app = get(&blog.router, "/admin/blog/").await;

	let site = context(&site);
	assert_eq!(site["apps"][0]["app_label"], "blog");
	assert_eq!(site["apps"][0]["app_url"], "/admin/blog/");
	assert_eq!(
		context(&app)["models"][0]["index_url"],
		"/admin/blog/article/"
	);
	assert_eq!(
		context(&app)["models"][0]["create_url"],
		"/admin/blog/article/add/"
	);
}

/// Update page that only displays; submissions are refused
struct ReadOnlyUpdate(UpdateView);

#[async_trait]
impl Handler for ReadOnlyUpdate {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		if request.method == Method::POST {
			return Ok(Response::method_not_allowed(&["GET"]));
		}
		self.0.handle(request).await
	}
}

#[rstest]
#[tokio::test]
async fn test_custom_view_replaces_default() {
	// Arrange
	let blog = blog_with(|_| {
		ModelAdmin::new().with_fields(["title"]).with_view(
			Action::Update,
			Arc::new(|config: Arc<ViewConfig>| -> Arc<dyn Handler> {
				Arc::new(ReadOnlyUpdate(UpdateView::new(config)))
			}),
		)
	});
	let pk = seed(&blog, "Pinned").await;
	let uri = format!("/admin/blog/article/{pk}/change/");

	// Act
	let shown = get(&blog.router, &uri).await;
	let submitted = post(&blog.router, &uri, &[("title", "Changed")]).await;

	// Assert
	assert_eq!(shown.status, StatusCode::OK);
	assert_eq!(context(&shown)["object"], "Pinned");
	assert_eq!(submitted.status, StatusCode::METHOD_NOT_ALLOWED);
	let stored = blog.store.get(&blog.article, pk).await.unwrap().unwrap();
	assert_eq!(stored.get("title"), Some(&json!("Pinned")));
	assert_eq!(
		blog.router.reverse("clarity-blog-article-update", &[("pk", "1")]).unwrap(),
		"/admin/blog/article/1/change/"
	);
}

struct TitleLength;

impl ExtraColumns for TitleLength {
	fn headers(&self) -> Vec<Value> {
		vec![json!({"key": "title_length", "label": "Length"})]
	}

	fn values(&self, record: &Record) -> Map<String, Value> {
		let length = record.get("title").and_then(Value::as_str).map_or(0, str::len);
		Map::from_iter([("title_length".to_string(), json!(length))])
	}
}

#[rstest]
#[tokio::test]
async fn test_extra_columns_follow_model_columns() {
	// Arrange
	let blog = blog_with(|_| {
		ModelAdmin::new()
			.with_fields(["title", "status"])
			.with_extra_columns(Arc::new(TitleLength))
	});
	seed(&blog, "Hello").await;

	// Act
	let response = get(&blog.router, "/admin/blog/article/").await;

	// Assert
	let ctx = context(&response);
	let keys: Vec<&str> = ctx["fields"]
		.as_array()
		.unwrap()
		.iter()
		.map(|header| header["key"].as_str().unwrap())
		.collect();
	assert_eq!(
		keys,
		vec![
			"title",
			"status",
			"title_length",
			"clarity-blog-article-update",
			"clarity-blog-article-delete",
		]
	);
	assert_eq!(ctx["items"][0]["title_length"], 5);
	assert_eq!(ctx["items"][0]["status"], "Draft");
}
