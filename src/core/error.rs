use thiserror::Error;

use crate::core::shape::ShapeError;

/// Gateway-wide error model. Every failure surfaces to the MCP caller verbatim;
/// nothing in the gateway retries or recovers locally.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Non-2xx response from the Drive API, body kept as-is.
    #[error("Drive API error: {status} {status_text} - {body}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The API declared JSON but sent something else.
    #[error("Failed to parse JSON response: {0}")]
    Parse(String),

    #[error("Drive API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Rejected before any network call was made.
    #[error("{0}")]
    Precondition(String),

    /// The API answered, but not with the shape the tool declares.
    #[error("unexpected response shape: {0}")]
    OutputValidation(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("no Drive access token available; send a bearer token or set DRIVE_ACCESS_TOKEN")]
    MissingCredential,
}

impl GatewayError {
    pub fn precondition(message: impl Into<String>) -> Self {
        GatewayError::Precondition(message.into())
    }

    /// Errors the caller caused by sending bad arguments.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidInput(_) | GatewayError::UnknownTool(_)
        )
    }
}

impl From<ShapeError> for GatewayError {
    fn from(e: ShapeError) -> Self {
        GatewayError::InvalidInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_status_and_raw_body() {
        let e = GatewayError::Api {
            status: 404,
            status_text: "Not Found".into(),
            body: r#"{"error":{"code":404,"message":"File not found: abc."}}"#.into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Drive API error: 404 Not Found - "));
        assert!(msg.contains(r#""message":"File not found: abc.""#));
    }

    #[test]
    fn shape_errors_become_invalid_input() {
        let gw: GatewayError = ShapeError::UnknownField("bogus".into()).into();
        assert!(gw.is_caller_error());
        assert!(gw.to_string().contains("bogus"));
    }

    #[test]
    fn precondition_is_not_a_caller_shape_error() {
        let e = GatewayError::precondition("mimeType is required when updating content");
        assert!(!e.is_caller_error());
        assert_eq!(e.to_string(), "mimeType is required when updating content");
    }
}
