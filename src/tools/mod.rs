//! Drive tools, one [`Contract`](crate::core::tool::Contract) per endpoint.

pub mod comments;
pub mod files;
pub mod permissions;
pub mod registry;
pub mod replies;

use base64::Engine;
use serde_json::Value;

use crate::clients::drive::{ApiRequest, UploadContent};
use crate::core::content::acknowledgement;
use crate::core::error::GatewayError;
use crate::core::shape::{Field, Kind, Literal};
use crate::core::tool::CallContext;

pub(crate) const SUPPORTS_ALL_DRIVES: Field = Field::defaulted(
    "supportsAllDrives",
    Kind::Boolean,
    Literal::Bool(true),
    "Support shared drives",
);

pub(crate) const USE_DOMAIN_ADMIN_ACCESS: Field = Field::defaulted(
    "useDomainAdminAccess",
    Kind::Boolean,
    Literal::Bool(false),
    "Issue the request as a domain administrator",
);

pub(crate) const PAGE_TOKEN: Field =
    Field::optional("pageToken", Kind::String, "Token for pagination");

/// Dispatch and hand back the normalized body for output validation.
pub(crate) async fn run(ctx: CallContext<'_>, req: ApiRequest) -> Result<Value, GatewayError> {
    Ok(ctx.client.dispatch(ctx.credential, req).await?.into_value())
}

/// Dispatch a delete and answer with a fixed acknowledgement. Whatever the
/// API sent back (usually an empty 204) is discarded.
pub(crate) async fn run_delete(
    ctx: CallContext<'_>,
    req: ApiRequest,
    message: &str,
) -> Result<Value, GatewayError> {
    ctx.client.dispatch(ctx.credential, req).await?;
    Ok(acknowledgement(message))
}

/// Optional string argument, with `""` treated as not given.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub(crate) fn decode_content(content: String, is_base64: bool) -> Result<UploadContent, GatewayError> {
    if !is_base64 {
        return Ok(UploadContent::Text(content));
    }
    base64::engine::general_purpose::STANDARD
        .decode(content.trim())
        .map(UploadContent::Binary)
        .map_err(|e| GatewayError::precondition(format!("content is not valid base64: {e}")))
}

pub(crate) fn check_rfc3339(field: &str, value: &str) -> Result<(), GatewayError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|e| GatewayError::precondition(format!("{field} must be an RFC 3339 timestamp: {e}")))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_content_is_decoded() {
        match decode_content("SGVsbG8=".into(), true).unwrap() {
            UploadContent::Binary(bytes) => assert_eq!(bytes, b"Hello"),
            other => panic!("expected binary, got {other:?}"),
        }
        assert!(matches!(decode_content("SGVsbG8=".into(), false).unwrap(), UploadContent::Text(_)));
    }

    #[test]
    fn invalid_base64_is_a_precondition_failure() {
        let err = decode_content("not base64!".into(), true).unwrap_err();
        assert!(matches!(err, GatewayError::Precondition(ref m) if m.contains("base64")));
    }

    #[test]
    fn empty_strings_are_not_present() {
        assert_eq!(present(&Some(String::new())), None);
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some("p2".into())), Some("p2"));
    }

    #[test]
    fn rfc3339_check() {
        check_rfc3339("startModifiedTime", "2024-05-01T12:00:00Z").unwrap();
        check_rfc3339("startModifiedTime", "2024-05-01T12:00:00.5+02:00").unwrap();
        let err = check_rfc3339("startModifiedTime", "yesterday").unwrap_err();
        assert!(err.to_string().starts_with("startModifiedTime must be an RFC 3339 timestamp"));
    }
}
