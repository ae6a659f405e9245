use async_trait::async_trait;
use clarity::db::{DbResult, Filter, FilterCondition, ListQuery, WriteOp, WriteOutcome};
use clarity::demo::{self, BlogModels};
use clarity::prelude::*;
use hyper::{Method, StatusCode};
use parking_lot::Mutex;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::sync::Arc;

/// Store that remembers every list query it answers
struct RecordingStore {
	inner: MemoryStore,
	queries: Mutex<Vec<(ModelKey, ListQuery)>>,
}

#[async_trait]
impl ModelStore for RecordingStore {
	async fn list(&self, schema: &ModelSchema, query: &ListQuery) -> DbResult<Vec<Record>> {
		self.queries.lock().push((schema.key.clone(), query.clone()));
		self.inner.list(schema, query).await
	}

	async fn count(&self, schema: &ModelSchema, condition: Option<&FilterCondition>) -> DbResult<usize> {
		self.inner.count(schema, condition).await
	}

	async fn get(&self, schema: &ModelSchema, pk: i64) -> DbResult<Option<Record>> {
		self.inner.get(schema, pk).await
	}

	async fn atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteOutcome>> {
		self.inner.atomic(ops).await
	}
}

struct Demo {
	models: BlogModels,
	store: Arc<MemoryStore>,
	router: Router,
}

#[fixture]
async fn demo_site() -> Demo {
	let models = BlogModels::new();
	let store = Arc::new(MemoryStore::with_models(models.all()).unwrap());
	demo::seed(store.as_ref(), &models).await.unwrap();
	let router = demo::site("clarity", &models)
		.build_router(store.clone(), Arc::new(JsonRenderer), &AdminSettings::default())
		.unwrap();
	Demo {
		models,
		store,
		router,
	}
}

async fn call(router: &Router, request: Request) -> (StatusCode, Value) {
	let response = router.handle(request).await.unwrap_or_else(Response::from);
	let context = response
		.json()
		.map(|body| body["context"].clone())
		.unwrap_or(Value::Null);
	(response.status, context)
}

#[rstest]
#[tokio::test]
async fn test_article_list_shows_related_author(#[future] demo_site: Demo) {
	// Arrange
	let demo = demo_site.await;

	// Act
	let (status, context) = call(&demo.router, Request::builder().uri("/admin/blog/article/").build().unwrap()).await;

	// Assert
	assert_eq!(status, StatusCode::OK);
	let items = context["items"].as_array().unwrap();
	assert_eq!(items[0]["title"], "Inline formsets");
	assert_eq!(items[0]["author"], "Ada");
	assert_eq!(items[0]["status"], "Draft");
	assert_eq!(items[1]["status"], "Published");
}

#[rstest]
#[tokio::test]
async fn test_update_page_offers_author_choices(#[future] demo_site: Demo) {
	let demo = demo_site.await;

	let (status, context) =
		call(&demo.router, Request::builder().uri("/admin/blog/article/1/change/").build().unwrap()).await;

	assert_eq!(status, StatusCode::OK);
	let author = context["form_layout"]
		.as_array()
		.unwrap()
		.iter()
		.find(|cell| cell["name"] == "author")
		.unwrap();
	assert!(author["field"]["choices"].as_array().unwrap().contains(&json!(["1", "Ada"])));
	assert_eq!(context["formsets"][0]["management_form"]["total_forms"], 3);
}

#[rstest]
#[tokio::test]
async fn test_comment_edited_inline(#[future] demo_site: Demo) {
	// Arrange
	let demo = demo_site.await;
	let form = [
		("title", "Hello, Clarity"),
		("author", "1"),
		("status", "p"),
		("published_on", "2024-05-01"),
		("body", "<p>Updated.</p>"),
		("comment_set-TOTAL_FORMS", "2"),
		("comment_set-INITIAL_FORMS", "1"),
		("comment_set-0-id", "1"),
		("comment_set-0-author_name", "Grace"),
		("comment_set-0-body", "Edited."),
		("comment_set-1-author_name", "Linus"),
		("comment_set-1-body", "Second."),
	];

	// Act
	let request = Request::builder()
		.method(Method::POST)
		.uri("/admin/blog/article/1/change/")
		.form(&form)
		.build()
		.unwrap();
	let (status, _) = call(&demo.router, request).await;

	// Assert
	assert_eq!(status, StatusCode::FOUND);
	let comments = demo.store.list(&demo.models.comment, &Default::default()).await.unwrap();
	let bodies: Vec<&Value> = comments.iter().filter_map(|c| c.get("body")).collect();
	assert_eq!(bodies, vec![&json!("Edited."), &json!("Nice post."), &json!("Second.")]);
}

#[rstest]
#[tokio::test]
async fn test_protected_author_cannot_be_deleted(#[future] demo_site: Demo) {
	// Arrange
	let demo = demo_site.await;
	let request = Request::builder()
		.method(Method::POST)
		.uri("/admin/blog/author/1/delete/")
		.build()
		.unwrap();

	// Act
	let (status, _) = call(&demo.router, request).await;

	// Assert
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(demo.store.count(&demo.models.author, None).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_list_looks_up_only_authors_on_the_page() {
	// Arrange
	let models = BlogModels::new();
	let store = Arc::new(RecordingStore {
		inner: MemoryStore::with_models(models.all()).unwrap(),
		queries: Mutex::new(Vec::new()),
	});
	demo::seed(store.as_ref(), &models).await.unwrap();
	store
		.insert(models.author.clone(), Record::from_pairs([("name", json!("Bob"))]))
		.await
		.unwrap();
	let router = demo::site("clarity", &models)
		.build_router(store.clone(), Arc::new(JsonRenderer), &AdminSettings::default())
		.unwrap();

	// Act
	let (status, context) = call(&router, Request::builder().uri("/admin/blog/article/").build().unwrap()).await;

	// Assert
	assert_eq!(status, StatusCode::OK);
	assert_eq!(context["items"][0]["author"], "Ada");
	let author_queries: Vec<ListQuery> = store
		.queries
		.lock()
		.iter()
		.filter(|(key, _)| *key == models.author.key)
		.map(|(_, query)| query.clone())
		.collect();
	assert_eq!(author_queries.len(), 1);
	assert_eq!(
		author_queries[0].condition,
		Some(FilterCondition::Single(Filter::is_in("id", vec![json!(1)])))
	);
}
