use clarity_http::{Error, QueryDict, Request};
use hyper::Method;
use rstest::rstest;

fn post(body: &str, content_type: &str) -> Request {
	Request::builder()
		.method(Method::POST)
		.uri("/admin/blog/article/1/change/")
		.header("content-type", content_type)
		.body(body.to_string())
		.build()
		.unwrap()
}

#[rstest]
fn test_formset_body_keeps_repeated_keys_and_order() {
	// Arrange
	let request = post(
		"title=Hi&tag_set-TOTAL_FORMS=2&tag_set-0-name=a&tag_set-1-name=b&pick=1&pick=2",
		"application/x-www-form-urlencoded",
	);

	// Act
	let data = request.form_data().unwrap();

	// Assert
	let keys: Vec<&str> = data.iter().map(|(k, _)| k).collect();
	assert_eq!(keys[..4], ["title", "tag_set-TOTAL_FORMS", "tag_set-0-name", "tag_set-1-name"]);
	assert_eq!(data.get_list("pick"), ["1".to_string(), "2".to_string()]);
	assert_eq!(data.get("pick"), Some("2"));
}

#[rstest]
fn test_empty_editor_markup_is_blanked() {
	// Arrange
	let mut data = Request::builder()
		.method(Method::POST)
		.form(&[("body", "<p>&nbsp;</p>"), ("title", "<p>&nbsp;</p> kept"), ("tag_set-0-note", "<p>&nbsp;</p>")])
		.build()
		.unwrap()
		.form_data()
		.unwrap();

	// Act
	data.blank_values(&["<p>&nbsp;</p>".to_string()]);

	// Assert
	assert_eq!(data.get("body"), Some(""));
	assert_eq!(data.get("title"), Some("<p>&nbsp;</p> kept"));
	assert_eq!(data.get("tag_set-0-note"), Some(""));
}

#[rstest]
fn test_json_body_is_rejected() {
	let request = post("{\"title\": \"Hi\"}", "application/json");

	let err = request.form_data().unwrap_err();

	assert!(matches!(err, Error::BadRequest(_)));
}

#[rstest]
#[case("q=rust&page=2", Some("rust"), Some("2"))]
#[case("search=go", None, None)]
#[case("", None, None)]
fn test_query_parameters(#[case] query: &str, #[case] q: Option<&str>, #[case] page: Option<&str>) {
	let request = Request::builder()
		.uri(format!("/admin/blog/article/?{query}"))
		.build()
		.unwrap();

	assert_eq!(request.query_param("q"), q);
	assert_eq!(request.query_param("page"), page);
}

#[rstest]
fn test_urlencode_round_trips_through_request() {
	let mut dict = QueryDict::new();
	dict.append("title", "Fish & Chips");
	dict.append("body", "a=b");

	let request = Request::builder().method(Method::POST).form_dict(&dict).build().unwrap();

	assert_eq!(request.form_data().unwrap(), dict);
}
