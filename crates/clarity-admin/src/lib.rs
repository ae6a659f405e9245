//! # clarity-admin
//!
//! Auto-generated CRUD pages for registered models.
//!
//! A model is registered on an [`AdminSite`] together with a [`ModelAdmin`]
//! describing which fields to edit, which to only display, the widgets to
//! use and the child models edited inline. From that the site derives, once
//! at startup, a form type, a [`FieldLayout`], one formset type per inline
//! and a bundle of named routes:
//!
//! | Path | Route name |
//! |---|---|
//! | `{app}/{model}/add/` | `{ns}-{app}-{model}-create` |
//! | `{app}/{model}/` | `{ns}-{app}-{model}-index` |
//! | `{app}/{model}/{pk}/change/` | `{ns}-{app}-{model}-update` |
//! | `{app}/{model}/{pk}/delete/` | `{ns}-{app}-{model}-delete` |
//!
//! plus redirects from `index/`, `delete/` and `change/` to the list and from
//! `{pk}/` to the update page, one index page per app and a site index.
//!
//! ## Example
//!
//! ```
//! use clarity_admin::{AdminSite, InlineModelAdmin, JsonRenderer, ModelAdmin};
//! use clarity_conf::AdminSettings;
//! use clarity_db::{FieldDef, MemoryStore, ModelKey, ModelSchema, OnDelete};
//! use std::sync::Arc;
//!
//! let article = Arc::new(ModelSchema::new("blog", "Article").field(FieldDef::char("title", 200)));
//! let comment = Arc::new(
//!     ModelSchema::new("blog", "Comment")
//!         .field(FieldDef::foreign_key("article", article.key.clone(), OnDelete::Cascade))
//!         .field(FieldDef::text("body")),
//! );
//! let store = MemoryStore::with_models([article.clone(), comment.clone()]).unwrap();
//!
//! let mut site = AdminSite::new();
//! site.register(
//!     article,
//!     ModelAdmin::new().with_inline(InlineModelAdmin::new(comment).with_extra(1)),
//! );
//! let router = site
//!     .build_router(Arc::new(store), Arc::new(JsonRenderer), &AdminSettings::default())
//!     .unwrap();
//!
//! assert_eq!(router.reverse("clarity-blog-article-create", &[] as &[(&str, &str)]).unwrap(), "/admin/blog/article/add/");
//! ```

pub mod error;
pub mod error_list;
pub mod factory;
pub mod layout;
pub mod options;
pub mod registry;
pub mod render;
pub mod views;

pub use error::{AdminError, AdminResult, ConfigurationError, ConfigurationResult};
pub use error_list::{form_errors, formset_errors};
pub use factory::{InlineFormset, build_form, build_formsets};
pub use layout::{COL_MD_WIDTH_ATTR, FieldLayout, LayoutCell, LayoutEntry, resolve_layout};
pub use options::{FieldSelection, InlineModelAdmin, ModelAdmin, ViewFactory};
pub use registry::{AdminSite, DEFAULT_NAMESPACE, Registration, RouteBundle};
pub use render::{JsonRenderer, Renderer};
pub use views::{
	AppIndexView, CreateView, DeleteView, ExtraColumns, ListView, SiteIndexView, UpdateView,
	ViewConfig, ViewConfigBuilder,
};
