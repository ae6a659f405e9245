//! Form processing and validation for Clarity
//!
//! This crate provides:
//! - Typed form fields with cleaning and change detection
//! - Model forms generated from a [`clarity_db::ModelSchema`]
//! - Object-level clean hooks
//! - Inline formsets for the children of a parent row

pub mod error;
pub mod field;
pub mod form;
pub mod formset;
pub mod model_form;
pub mod widget;

pub use error::{FormError, FormResult};
pub use field::{ChoiceOption, FieldSpec, FieldType, is_truthy};
pub use form::{BoundField, CleanHook, Form, FormConfig, ModelChoices};
pub use formset::{FormsetConfig, InlineFormSet, ManagementForm};
pub use model_form::{fields_for_model, form_field_for};
pub use widget::{Widget, WidgetKind};
