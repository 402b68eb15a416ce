//! Types exposed to JavaScript via wasm-bindgen.

use edupost_browser::ApiError;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Rejection value of the post client's promises.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsApiError {
    pub message: String,
    pub status: u16,
}

impl From<&ApiError> for JsApiError {
    fn from(error: &ApiError) -> Self {
        let body = error.body();
        Self {
            message: body.message,
            status: body.status,
        }
    }
}

/// Serialize to a plain JS value (objects, not `Map`s).
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}
