pub mod builder;
pub mod field;
pub mod form;
pub mod presenter;
pub mod validator;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use builder::build_request;
pub use field::{FieldId, FieldModel};
pub use form::{ConstraintRow, EditError, FieldEdit, FormState, Restored};
pub use presenter::{Actions, DisplayModel, present, present_tableaux, render_tableau};
pub use validator::{Sanitized, ValidationError, diagnostics, sanitize, validate};
