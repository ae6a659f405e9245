//! # clarity-http
//!
//! HTTP primitives shared by the router, the admin views and the server:
//! [`Request`], [`Response`], the [`Handler`] trait, [`QueryDict`] for
//! decoded query strings and form bodies and [`FileDict`] for uploads.

pub mod multipart;
pub mod query_dict;
pub mod request;
pub mod response;

pub use clarity_core::exception::{Error, Result};
pub use multipart::{FileDict, FormSubmission, UploadedFile};
pub use query_dict::QueryDict;
pub use request::{Request, RequestBuilder};
pub use response::Response;

use async_trait::async_trait;
use std::sync::Arc;

/// Anything that turns a [`Request`] into a [`Response`]
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}
