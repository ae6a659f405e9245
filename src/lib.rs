//! # Clarity
//!
//! Auto-generated admin pages for a web application: register a model with an
//! [`AdminSite`](admin::AdminSite) and get list, create, update and delete
//! pages, child records edited inline through formsets, named routes and a
//! site index.
//!
//! This crate re-exports the member crates:
//!
//! - [`core`]: the framework [`Error`] and text helpers
//! - [`http`]: [`Request`], [`Response`] and the [`Handler`] trait
//! - [`urls`]: path patterns, routing and reverse lookups
//! - [`db`]: model schemas, records and the [`ModelStore`](db::ModelStore) port
//! - [`forms`]: field cleaning, forms and inline formsets
//! - [`admin`]: registry, layouts and the CRUD views
//! - [`conf`]: layered settings
//! - [`server`]: the HTTP server and logging setup
//!
//! ## Quick Example
//!
//! ```
//! use clarity::prelude::*;
//! use std::sync::Arc;
//!
//! let tag = Arc::new(ModelSchema::new("blog", "Tag").field(FieldDef::char("name", 30)));
//! let store = MemoryStore::with_models([tag.clone()]).unwrap();
//!
//! let mut site = AdminSite::new();
//! site.register_default(tag);
//! let router = site
//!     .build_router(Arc::new(store), Arc::new(JsonRenderer), &AdminSettings::default())
//!     .unwrap();
//! assert_eq!(router.reverse("clarity-blog-tag-index", &[] as &[(&str, &str)]).unwrap(), "/admin/blog/tag/");
//! ```

pub mod demo;

pub use clarity_admin as admin;
pub use clarity_conf as conf;
pub use clarity_core as core;
pub use clarity_db as db;
pub use clarity_forms as forms;
pub use clarity_http as http;
pub use clarity_server as server;
pub use clarity_urls as urls;

pub use clarity_core::{Error, Result};
pub use clarity_http::{Handler, Request, Response};

/// The types most applications touch
pub mod prelude {
	pub use clarity_admin::{
		AdminSite, InlineModelAdmin, JsonRenderer, ModelAdmin, Renderer,
	};
	pub use clarity_conf::{AdminSettings, Settings};
	pub use clarity_db::{
		FieldDef, MemoryStore, ModelKey, ModelSchema, ModelStore, OnDelete, Record,
	};
	pub use clarity_forms::{Widget, WidgetKind};
	pub use clarity_http::{Handler, Request, Response};
	pub use clarity_urls::Router;
}
