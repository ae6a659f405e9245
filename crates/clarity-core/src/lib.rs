//! # clarity-core
//!
//! Shared building blocks for the Clarity workspace:
//!
//! - [`exception`]: the framework [`Error`](exception::Error) returned by handlers
//! - [`text`]: label and verbose-name helpers used by schemas and forms

pub mod exception;
pub mod text;

pub use exception::{Error, Result};
