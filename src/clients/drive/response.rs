//! Response normalization for Drive API calls.
//!
//! The API is not consistent about bodies: some successful mutations answer
//! with an empty JSON body, most endpoints with JSON, downloads and exports
//! with raw bytes. Everything funnels through [`normalize`].

use reqwest::{header::CONTENT_TYPE, Response, StatusCode};

use crate::core::content::ApiResponse;
use crate::core::error::GatewayError;

pub fn normalize(
    status: StatusCode,
    content_type: Option<&str>,
    body: String,
) -> Result<ApiResponse, GatewayError> {
    if !status.is_success() {
        return Err(api_error(status, body));
    }

    if content_type.is_some_and(|ct| ct.contains("application/json")) {
        if body.trim().is_empty() {
            return Ok(ApiResponse::EmptySuccess);
        }
        return serde_json::from_str(&body)
            .map(ApiResponse::Json)
            .map_err(|e| GatewayError::Parse(e.to_string()));
    }

    if body.is_empty() {
        Ok(ApiResponse::Text("Success".to_owned()))
    } else {
        Ok(ApiResponse::Text(body))
    }
}

pub async fn read(resp: Response) -> Result<ApiResponse, GatewayError> {
    let status = resp.status();
    let content_type = header_str(&resp, CONTENT_TYPE);
    let body = resp.text().await?;
    normalize(status, content_type.as_deref(), body)
}

/// Pass a successful response through untouched; turn a failed one into
/// [`GatewayError::Api`] after reading its body.
pub async fn ensure_success(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await?;
    Err(api_error(status, body))
}

pub fn content_type(resp: &Response) -> Option<String> {
    header_str(resp, CONTENT_TYPE)
}

fn header_str(resp: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn api_error(status: StatusCode, body: String) -> GatewayError {
    GatewayError::Api {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_owned(),
        body,
    }
}
