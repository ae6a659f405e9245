use async_trait::async_trait;
use clarity_http::{Error, Handler, Request, Response};
use clarity_urls::{PathPattern, RedirectView, Route, Router, UrlError, UrlResolver};
use hyper::StatusCode;
use rstest::{fixture, rstest};
use std::sync::Arc;

struct Named(&'static str);

#[async_trait]
impl Handler for Named {
	async fn handle(&self, request: Request) -> clarity_http::Result<Response> {
		let pk = request.path_param("pk").unwrap_or("-");
		Ok(Response::ok().with_body(format!("{} {pk}", self.0)))
	}
}

#[fixture]
fn router() -> Router {
	let mut resolver = UrlResolver::with_prefix("/admin/");
	resolver.register(
		"clarity-blog-article-index",
		Some("clarity"),
		PathPattern::parse("/blog/article/").unwrap(),
	);
	resolver.register(
		"clarity-blog-article-update",
		Some("clarity"),
		PathPattern::parse("/blog/article/{pk:int}/change/").unwrap(),
	);
	let resolver = Arc::new(resolver);

	let mut router = Router::with_prefix("/admin/");
	for (path, name, handler) in [
		("/blog/article/", "clarity-blog-article-index", Named("list")),
		("/blog/article/{pk:int}/change/", "clarity-blog-article-update", Named("update")),
	] {
		router
			.add_route(
				Route::from_handler(path, handler)
					.with_name(name)
					.with_namespace("clarity"),
			)
			.unwrap();
	}
	router
		.add_route(Route::from_handler(
			"/blog/article/change/",
			RedirectView::new(Arc::clone(&resolver), "clarity:clarity-blog-article-index"),
		))
		.unwrap();
	router
		.add_route(Route::from_handler(
			"/blog/article/{pk:int}/",
			RedirectView::new(resolver, "clarity:clarity-blog-article-update"),
		))
		.unwrap();
	router
}

async fn get(router: &Router, uri: &str) -> Result<Response, Error> {
	router.handle(Request::builder().uri(uri).build().unwrap()).await
}

#[rstest]
#[case("/admin/blog/article/", "list -")]
#[case("/admin/blog/article/12/change/", "update 12")]
#[tokio::test]
async fn test_dispatch_under_prefix(router: Router, #[case] uri: &str, #[case] body: &str) {
	let response = get(&router, uri).await.unwrap();

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.body, body.as_bytes());
}

#[rstest]
#[case("/admin/blog/article/change/", "/admin/blog/article/")]
#[case("/admin/blog/article/4/", "/admin/blog/article/4/change/")]
#[tokio::test]
async fn test_redirects_reverse_named_routes(router: Router, #[case] uri: &str, #[case] target: &str) {
	let response = get(&router, uri).await.unwrap();

	assert_eq!(response.status, StatusCode::FOUND);
	assert_eq!(response.location(), Some(target));
}

#[rstest]
#[case("/admin/blog/article/abc/change/")]
#[case("/blog/article/")]
#[case("/admin/blog/comment/")]
#[tokio::test]
async fn test_unmatched_is_not_found(router: Router, #[case] uri: &str) {
	let err = get(&router, uri).await.unwrap_err();

	assert_eq!(err.status_code(), 404);
}

#[rstest]
fn test_reverse_plain_and_namespaced(router: Router) {
	let plain = router.reverse("clarity-blog-article-update", &[("pk", "9")]).unwrap();
	let namespaced = router
		.reverse("clarity:clarity-blog-article-update", &[("pk", "9")])
		.unwrap();

	assert_eq!(plain, "/admin/blog/article/9/change/");
	assert_eq!(namespaced, plain);
}

#[rstest]
fn test_reverse_errors(router: Router) {
	let missing = router.reverse("clarity-blog-article-update", &[] as &[(&str, &str)]);
	let unknown = router.reverse("clarity-blog-tag-index", &[] as &[(&str, &str)]);

	assert!(matches!(missing, Err(UrlError::MissingParameter { .. })));
	assert_eq!(unknown, Err(UrlError::NoReverseMatch("clarity-blog-tag-index".to_string())));
}
