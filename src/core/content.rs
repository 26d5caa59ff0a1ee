//! Normalized Drive API response bodies.

use serde_json::{json, Value};

pub const EMPTY_SUCCESS_MESSAGE: &str = "Operation completed successfully";

/// What a successful Drive call produced, decided by the response's
/// content type rather than by what the caller expected.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
    /// JSON content type with an empty body. Some mutations answer this way.
    EmptySuccess,
}

impl ApiResponse {
    pub fn into_value(self) -> Value {
        match self {
            ApiResponse::Json(v) => v,
            ApiResponse::Text(s) => Value::String(s),
            ApiResponse::EmptySuccess => json!({ "success": true, "message": EMPTY_SUCCESS_MESSAGE }),
        }
    }
}

/// Fixed acknowledgement returned by delete tools in place of the API's body.
pub fn acknowledgement(message: &str) -> Value {
    json!({ "success": true, "message": message })
}
