//! A small blog used by the `clarity-demo` binary
//!
//! Authors are edited on their own; articles carry an inline list of
//! comments and pick their author from a select.

use crate::admin::{AdminSite, InlineModelAdmin, ModelAdmin};
use crate::db::{DbResult, FieldDef, ModelSchema, ModelStore, OnDelete, Record};
use crate::forms::{Widget, WidgetKind};
use serde_json::json;
use std::sync::Arc;

pub const APP_LABEL: &str = "blog";

/// Schemas of the demo app, in dependency order
pub struct BlogModels {
	pub author: Arc<ModelSchema>,
	pub article: Arc<ModelSchema>,
	pub comment: Arc<ModelSchema>,
}

impl BlogModels {
	pub fn new() -> Self {
		let author = Arc::new(
			ModelSchema::new(APP_LABEL, "Author")
				.field(FieldDef::char("name", 100).unique(true))
				.field(FieldDef::char("email", 254).blank(true).default_value(""))
				.display_field("name"),
		);
		let article = Arc::new(
			ModelSchema::new(APP_LABEL, "Article")
				.field(FieldDef::char("title", 200))
				.field(FieldDef::foreign_key("author", author.key.clone(), OnDelete::Protect))
				.field(
					FieldDef::char("status", 1)
						.choices([("d", "Draft"), ("p", "Published")])
						.default_value("d"),
				)
				.field(FieldDef::date("published_on").null(true).blank(true))
				.field(FieldDef::text("body").blank(true).default_value(""))
				.display_field("title"),
		);
		let comment = Arc::new(
			ModelSchema::new(APP_LABEL, "Comment")
				.field(FieldDef::foreign_key("article", article.key.clone(), OnDelete::Cascade))
				.field(FieldDef::char("author_name", 60).verbose_name("name"))
				.field(FieldDef::text("body"))
				.display_field("author_name"),
		);
		Self {
			author,
			article,
			comment,
		}
	}

	pub fn all(&self) -> [Arc<ModelSchema>; 3] {
		[
			Arc::clone(&self.author),
			Arc::clone(&self.article),
			Arc::clone(&self.comment),
		]
	}
}

impl Default for BlogModels {
	fn default() -> Self {
		Self::new()
	}
}

/// Register the demo models on `site`
pub fn register(site: &mut AdminSite, models: &BlogModels) {
	site.register(
		Arc::clone(&models.author),
		ModelAdmin::new().with_ordering(["name"]),
	);
	site.register(
		Arc::clone(&models.article),
		ModelAdmin::new()
			.with_fields(["title", "author", "status", "published_on", "body"])
			.with_widget("body", Widget::new(WidgetKind::RichText))
			.with_widget("status", Widget::new(WidgetKind::RadioButtons))
			.with_ordering(["-id"])
			.with_inline(
				InlineModelAdmin::new(Arc::clone(&models.comment))
					.with_fields(["author_name", "body"])
					.with_widget("body", Widget::new(WidgetKind::Textarea).with_attr("col_md_width", "8"))
					.with_extra(2),
			),
	);
}

/// Site with the demo models registered, ready for `build_router`
pub fn site(namespace: &str, models: &BlogModels) -> AdminSite {
	let mut site = AdminSite::with_namespace(namespace);
	register(&mut site, models);
	site
}

/// Insert a couple of rows so the pages have something to show
pub async fn seed(store: &dyn ModelStore, models: &BlogModels) -> DbResult<()> {
	let author = store
		.insert(
			Arc::clone(&models.author),
			Record::from_pairs([("name", json!("Ada")), ("email", json!("ada@example.com"))]),
		)
		.await?;
	for (title, status) in [("Hello, Clarity", "p"), ("Inline formsets", "d")] {
		let article = store
			.insert(
				Arc::clone(&models.article),
				Record::from_pairs([
					("title", json!(title)),
					("author", json!(author)),
					("status", json!(status)),
					("body", json!("<p>First draft.</p>")),
				]),
			)
			.await?;
		store
			.insert(
				Arc::clone(&models.comment),
				Record::from_pairs([
					("article", json!(article)),
					("author_name", json!("Grace")),
					("body", json!("Nice post.")),
				]),
			)
			.await?;
	}
	tracing::info!(authors = 1, articles = 2, "demo data seeded");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::MemoryStore;
	use rstest::rstest;

	#[rstest]
	fn test_demo_site_registers_every_model() {
		let models = BlogModels::new();

		let site = site("clarity", &models);

		let names: Vec<String> = site.registrations().map(|r| r.model.key.to_string()).collect();
		assert_eq!(names, vec!["blog.author", "blog.article"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_seed_fills_every_table() {
		// Arrange
		let models = BlogModels::new();
		let store = MemoryStore::with_models(models.all()).unwrap();

		// Act
		seed(&store, &models).await.unwrap();

		// Assert
		assert_eq!(store.count(&models.author, None).await.unwrap(), 1);
		assert_eq!(store.count(&models.article, None).await.unwrap(), 2);
		assert_eq!(store.count(&models.comment, None).await.unwrap(), 2);
	}
}
