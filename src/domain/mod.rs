//! Output shapes of Drive resources.
//!
//! Each record names the fields tools rely on. Anything else the API sends is
//! kept in a flattened `extra` bag, so new API fields pass through instead of
//! failing validation. Only stable identifiers are required.

pub mod comments;
pub mod files;
pub mod permissions;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Person attached to a file, comment or reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_link: Option<String>,
}

/// Fixed reply of delete tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_drops_absent_fields_on_output() {
        let u: User = serde_json::from_value(json!({"displayName": "Ada"})).unwrap();
        assert_eq!(serde_json::to_value(u).unwrap(), json!({"displayName": "Ada"}));
    }

    #[test]
    fn acknowledgement_requires_both_fields() {
        assert!(serde_json::from_value::<Acknowledgement>(json!({"success": true})).is_err());
    }
}
