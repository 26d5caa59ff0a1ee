use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Who a permission grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum GranteeType {
    User,
    Group,
    Domain,
    Anyone,
}

impl GranteeType {
    pub const NAMES: &'static [&'static str] = &["user", "group", "domain", "anyone"];

    /// Only individual and group grantees receive notification email.
    pub fn is_notifiable(self) -> bool {
        matches!(self, GranteeType::User | GranteeType::Group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

impl Role {
    pub const NAMES: &'static [&'static str] =
        &["owner", "organizer", "fileOrganizer", "writer", "commenter", "reader"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    #[serde(rename = "type")]
    pub grantee: GranteeType,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_owner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_details: Option<Vec<PermissionDetail>>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionList {
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enum_names_match_wire_form() {
        for name in Role::NAMES {
            let role: Role = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(serde_json::to_value(role).unwrap(), json!(name));
        }
        for name in GranteeType::NAMES {
            let t: GranteeType = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(serde_json::to_value(t).unwrap(), json!(name));
        }
    }

    #[test]
    fn permission_requires_known_role_and_type() {
        let ok = json!({"id": "p1", "type": "anyone", "role": "reader", "allowFileDiscovery": false});
        let p: Permission = serde_json::from_value(ok.clone()).unwrap();
        assert_eq!(p.grantee, GranteeType::Anyone);
        assert_eq!(serde_json::to_value(p).unwrap(), ok);

        let bad = json!({"id": "p1", "type": "anyone", "role": "viewer"});
        assert!(serde_json::from_value::<Permission>(bad).is_err());
    }

    #[test]
    fn only_users_and_groups_are_notified() {
        assert!(GranteeType::User.is_notifiable());
        assert!(GranteeType::Group.is_notifiable());
        assert!(!GranteeType::Domain.is_notifiable());
        assert!(!GranteeType::Anyone.is_notifiable());
    }
}
