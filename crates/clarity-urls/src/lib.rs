//! # clarity-urls
//!
//! URL routing for Clarity.
//!
//! - [`PathPattern`]: `/blog/article/{pk:int}/change/` style patterns
//! - [`Route`] / [`Router`]: ordered dispatch to [`clarity_http::Handler`]s
//! - [`UrlResolver`]: reverse a route name (`name` or `namespace:name`) into a path
//! - [`RedirectView`]: redirect one route to another by name

pub mod error;
pub mod pattern;
pub mod redirect;
pub mod resolver;
pub mod route;
pub mod router;

pub use error::UrlError;
pub use pattern::{Converter, PathPattern};
pub use redirect::RedirectView;
pub use resolver::UrlResolver;
pub use route::Route;
pub use router::Router;
