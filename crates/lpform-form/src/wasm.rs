//! WASM bindings for the problem form
//!
//! The page keeps its form state as a plain JavaScript object and calls into
//! these functions for every edit, keystroke, submit and render.

use wasm_bindgen::prelude::*;

use crate::form::{FieldEdit, FormState, Restored};
use crate::{builder, presenter, validator};
use lpform_model::{ProblemRequest, SolveResult};

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| js_error(&e.to_string()))
}

fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}

/// A fresh form with the default layout
#[wasm_bindgen]
pub fn default_form() -> Result<JsValue, JsValue> {
    to_js(&FormState::default())
}

/// Apply one edit and return the updated form
#[wasm_bindgen]
pub fn apply_edit(form: JsValue, edit: JsValue) -> Result<JsValue, JsValue> {
    let mut form: FormState = serde_wasm_bindgen::from_value(form)?;
    let edit: FieldEdit = serde_wasm_bindgen::from_value(edit)?;
    form.apply(edit).map_err(|e| js_error(&e.to_string()))?;
    to_js(&form)
}

/// Rebuild the form from a stored request (`null` when nothing is stored).
///
/// Returns `{ form, warning }`. A request that does not parse yields the
/// default form and a warning for the page to log.
#[wasm_bindgen]
pub fn restore_form(request: JsValue) -> Result<JsValue, JsValue> {
    let stored = (!request.is_null() && !request.is_undefined())
        .then(|| serde_wasm_bindgen::from_value::<ProblemRequest>(request));
    to_js(&Restored::from_stored(stored))
}

/// Build the canonical request, or throw the first diagnostic
#[wasm_bindgen]
pub fn build_request(form: JsValue) -> Result<JsValue, JsValue> {
    let form: FormState = serde_wasm_bindgen::from_value(form)?;
    let fields = form.fields();
    validator::validate(&fields).map_err(|e| js_error(&e.to_string()))?;
    let request = builder::build_request(&fields).map_err(|e| js_error(&e.to_string()))?;
    to_js(&request)
}

#[derive(serde::Serialize)]
struct Diagnostic {
    message: String,
}

/// Every failing submit-time check as `{ message }` objects
#[wasm_bindgen]
pub fn validate(form: JsValue) -> JsValue {
    let diagnostics: Vec<Diagnostic> = match serde_wasm_bindgen::from_value::<FormState>(form) {
        Ok(form) => validator::diagnostics(&form.fields())
            .into_iter()
            .map(|e| Diagnostic {
                message: e.to_string(),
            })
            .collect(),
        Err(e) => vec![Diagnostic {
            message: e.to_string(),
        }],
    };
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Clean a numeric input after a keystroke
#[wasm_bindgen]
pub fn sanitize(value: &str, cursor: usize) -> Result<JsValue, JsValue> {
    to_js(&validator::sanitize(value, cursor))
}

/// Map a solver response to the display model; `solved` may be null
#[wasm_bindgen]
pub fn present(result: JsValue, solved: JsValue) -> Result<JsValue, JsValue> {
    let result: SolveResult = serde_wasm_bindgen::from_value(result)?;
    let solved: Option<ProblemRequest> = serde_wasm_bindgen::from_value(solved).unwrap_or(None);
    to_js(&presenter::present(&result, solved.as_ref()))
}
