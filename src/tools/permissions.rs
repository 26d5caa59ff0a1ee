use async_trait::async_trait;
use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{check_rfc3339, present, run, run_delete, PAGE_TOKEN, SUPPORTS_ALL_DRIVES, USE_DOMAIN_ADMIN_ACCESS};
use crate::clients::drive::ApiRequest;
use crate::core::error::GatewayError;
use crate::core::shape::{Field, InputShape, Kind, Literal};
use crate::core::tool::{CallContext, Contract, SideEffect, ToolSpec};
use crate::domain::permissions::{GranteeType, Permission, PermissionList, Role};
use crate::domain::Acknowledgement;

const PERMISSION_PROJECTION: &str =
    "id,type,role,emailAddress,domain,displayName,photoLink,expirationTime,deleted,pendingOwner,permissionDetails";

pub const PERMISSION_DELETED: &str = "Permission deleted successfully";

const FILE_ID: Field = Field::required("fileId", Kind::String, "The ID of the file or shared drive");

/// Query flags every permission call carries.
fn scoped(req: ApiRequest, supports_all_drives: bool, use_domain_admin_access: bool) -> ApiRequest {
    req.param("supportsAllDrives", supports_all_drives)
        .param("useDomainAdminAccess", use_domain_admin_access)
}

// ---- permissions_list ----

static PERMISSIONS_LIST_FIELDS: &[Field] = &[
    FILE_ID,
    Field::defaulted(
        "pageSize",
        Kind::Integer { min: 1, max: 100 },
        Literal::Int(100),
        "Maximum number of permissions to return (1-100)",
    ),
    PAGE_TOKEN,
    SUPPORTS_ALL_DRIVES,
    USE_DOMAIN_ADMIN_ACCESS,
];
static PERMISSIONS_LIST_SHAPE: InputShape =
    InputShape::strict(PERMISSIONS_LIST_FIELDS, &[("cursor", "pageToken")]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsListInput {
    file_id: String,
    page_size: u32,
    page_token: Option<String>,
    supports_all_drives: bool,
    use_domain_admin_access: bool,
}

impl PermissionsListInput {
    pub fn request(&self) -> ApiRequest {
        let req = ApiRequest::get(format!("/files/{}/permissions", self.file_id)).param("pageSize", self.page_size);
        scoped(req, self.supports_all_drives, self.use_domain_admin_access)
            .param("fields", format!("nextPageToken,permissions({PERMISSION_PROJECTION})"))
            .param_opt("pageToken", present(&self.page_token))
    }
}

pub struct PermissionsList;

#[async_trait]
impl Contract for PermissionsList {
    type Input = PermissionsListInput;
    type Output = PermissionList;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "permissions_list",
            title: "List permissions",
            description: "List all permissions on a file or shared drive: who has access and with which role.",
            side_effect: SideEffect::ReadOnly,
            input: &PERMISSIONS_LIST_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: PermissionsListInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- permission_get ----

static PERMISSION_GET_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("permissionId", Kind::String, "The ID of the permission"),
    SUPPORTS_ALL_DRIVES,
    USE_DOMAIN_ADMIN_ACCESS,
];
static PERMISSION_GET_SHAPE: InputShape = InputShape::strict(PERMISSION_GET_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGetInput {
    file_id: String,
    permission_id: String,
    supports_all_drives: bool,
    use_domain_admin_access: bool,
}

impl PermissionGetInput {
    pub fn request(&self) -> ApiRequest {
        let req = ApiRequest::get(format!("/files/{}/permissions/{}", self.file_id, self.permission_id));
        scoped(req, self.supports_all_drives, self.use_domain_admin_access).param("fields", PERMISSION_PROJECTION)
    }
}

pub struct PermissionGet;

#[async_trait]
impl Contract for PermissionGet {
    type Input = PermissionGetInput;
    type Output = Permission;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "permission_get",
            title: "Get permission",
            description: "Get a specific permission by ID on a file or shared drive.",
            side_effect: SideEffect::ReadOnly,
            input: &PERMISSION_GET_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: PermissionGetInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- permission_create ----

static PERMISSION_CREATE_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("type", Kind::Enum(GranteeType::NAMES), "The type of grantee: user, group, domain or anyone"),
    Field::required("role", Kind::Enum(Role::NAMES), "The role granted by this permission"),
    Field::optional("emailAddress", Kind::String, "Email address of the user or group (required for user/group)"),
    Field::optional("domain", Kind::String, "Domain, e.g. \"example.com\" (required for type domain)"),
    Field::defaulted(
        "sendNotificationEmail",
        Kind::Boolean,
        Literal::Bool(true),
        "Send a notification email when sharing with a user or group",
    ),
    Field::optional("emailMessage", Kind::String, "Custom message for the notification email"),
    Field::defaulted(
        "transferOwnership",
        Kind::Boolean,
        Literal::Bool(false),
        "Transfer ownership to the grantee (role must be owner)",
    ),
    Field::defaulted(
        "moveToNewOwnersRoot",
        Kind::Boolean,
        Literal::Bool(false),
        "Move the file to the new owner's My Drive root (only with transferOwnership)",
    ),
    SUPPORTS_ALL_DRIVES,
    USE_DOMAIN_ADMIN_ACCESS,
];
static PERMISSION_CREATE_SHAPE: InputShape = InputShape::strict(PERMISSION_CREATE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCreateInput {
    file_id: String,
    #[serde(rename = "type")]
    grantee: GranteeType,
    role: Role,
    email_address: Option<String>,
    domain: Option<String>,
    send_notification_email: bool,
    email_message: Option<String>,
    transfer_ownership: bool,
    move_to_new_owners_root: bool,
    supports_all_drives: bool,
    use_domain_admin_access: bool,
}

impl PermissionCreateInput {
    pub fn request(&self) -> ApiRequest {
        let mut req = scoped(
            ApiRequest::post(format!("/files/{}/permissions", self.file_id)),
            self.supports_all_drives,
            self.use_domain_admin_access,
        );
        // Drive rejects notification parameters for domain and anyone grants.
        if self.grantee.is_notifiable() {
            req = req.param("sendNotificationEmail", self.send_notification_email);
        }
        req = req
            .flag("transferOwnership", self.transfer_ownership)
            .flag("moveToNewOwnersRoot", self.move_to_new_owners_root);
        if self.grantee.is_notifiable() {
            req = req.param_opt("emailMessage", self.email_message.as_deref().filter(|m| !m.is_empty()));
        }

        let mut body = JsonObject::new();
        body.insert("type".into(), json!(self.grantee));
        body.insert("role".into(), json!(self.role));
        if let Some(email) = self.email_address.as_deref().filter(|e| !e.is_empty()) {
            body.insert("emailAddress".into(), json!(email));
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            body.insert("domain".into(), json!(domain));
        }
        req.json(Value::Object(body))
    }
}

pub struct PermissionCreate;

#[async_trait]
impl Contract for PermissionCreate {
    type Input = PermissionCreateInput;
    type Output = Permission;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "permission_create",
            title: "Create permission",
            description: "Share a file or shared drive by creating a permission for a user, group, domain or anyone.",
            side_effect: SideEffect::Mutating,
            input: &PERMISSION_CREATE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: PermissionCreateInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- permission_update ----

static PERMISSION_UPDATE_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("permissionId", Kind::String, "The ID of the permission to update"),
    Field::required("role", Kind::Enum(Role::NAMES), "The new role for the permission"),
    Field::optional("expirationTime", Kind::String, "Expiration time (RFC 3339)"),
    Field::defaulted("removeExpiration", Kind::Boolean, Literal::Bool(false), "Remove the expiration time"),
    Field::defaulted(
        "transferOwnership",
        Kind::Boolean,
        Literal::Bool(false),
        "Transfer ownership (role must be owner)",
    ),
    SUPPORTS_ALL_DRIVES,
    USE_DOMAIN_ADMIN_ACCESS,
];
static PERMISSION_UPDATE_SHAPE: InputShape = InputShape::passthrough(PERMISSION_UPDATE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionUpdateInput {
    file_id: String,
    permission_id: String,
    role: Role,
    expiration_time: Option<String>,
    remove_expiration: bool,
    transfer_ownership: bool,
    supports_all_drives: bool,
    use_domain_admin_access: bool,
}

impl PermissionUpdateInput {
    pub fn request(&self) -> Result<ApiRequest, GatewayError> {
        let expiration = self.expiration_time.as_deref().filter(|t| !t.is_empty());
        if let Some(ts) = expiration {
            check_rfc3339("expirationTime", ts)?;
        }
        let mut body = JsonObject::new();
        body.insert("role".into(), json!(self.role));
        if let Some(ts) = expiration {
            body.insert("expirationTime".into(), json!(ts));
        }
        let req = ApiRequest::patch(format!("/files/{}/permissions/{}", self.file_id, self.permission_id));
        Ok(scoped(req, self.supports_all_drives, self.use_domain_admin_access)
            .flag("transferOwnership", self.transfer_ownership)
            .flag("removeExpiration", self.remove_expiration)
            .json(Value::Object(body)))
    }
}

pub struct PermissionUpdate;

#[async_trait]
impl Contract for PermissionUpdate {
    type Input = PermissionUpdateInput;
    type Output = Permission;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "permission_update",
            title: "Update permission",
            description: "Update an existing permission on a file or shared drive: change its role or expiration.",
            side_effect: SideEffect::Mutating,
            input: &PERMISSION_UPDATE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: PermissionUpdateInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()?).await
    }
}

// ---- permission_delete ----

static PERMISSION_DELETE_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("permissionId", Kind::String, "The ID of the permission to delete"),
    SUPPORTS_ALL_DRIVES,
    USE_DOMAIN_ADMIN_ACCESS,
];
static PERMISSION_DELETE_SHAPE: InputShape = InputShape::passthrough(PERMISSION_DELETE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDeleteInput {
    file_id: String,
    permission_id: String,
    supports_all_drives: bool,
    use_domain_admin_access: bool,
}

impl PermissionDeleteInput {
    pub fn request(&self) -> ApiRequest {
        let req = ApiRequest::delete(format!("/files/{}/permissions/{}", self.file_id, self.permission_id));
        scoped(req, self.supports_all_drives, self.use_domain_admin_access)
    }
}

pub struct PermissionDelete;

#[async_trait]
impl Contract for PermissionDelete {
    type Input = PermissionDeleteInput;
    type Output = Acknowledgement;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "permission_delete",
            title: "Delete permission",
            description: "Remove a permission from a file or shared drive, revoking that grantee's access.",
            side_effect: SideEffect::Destructive,
            input: &PERMISSION_DELETE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: PermissionDeleteInput) -> Result<Value, GatewayError> {
        run_delete(ctx, input.request(), PERMISSION_DELETED).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, call, input};
    use httpmock::prelude::*;

    #[test]
    fn anyone_grant_never_carries_notification_params() {
        let req = input(
            &PermissionCreate,
            json!({
                "fileId": "f", "type": "anyone", "role": "reader",
                "sendNotificationEmail": true, "emailMessage": "hello"
            }),
        )
        .request();
        assert_eq!(req.query_value("sendNotificationEmail"), None);
        assert_eq!(req.query_value("emailMessage"), None);
        assert_eq!(req.body, Some(json!({"type": "anyone", "role": "reader"})));
    }

    #[test]
    fn domain_grant_never_carries_notification_params() {
        let req = input(
            &PermissionCreate,
            json!({"fileId": "f", "type": "domain", "role": "reader", "domain": "example.com", "emailMessage": "x"}),
        )
        .request();
        assert_eq!(req.query_value("sendNotificationEmail"), None);
        assert_eq!(req.query_value("emailMessage"), None);
        assert_eq!(req.body, Some(json!({"type": "domain", "role": "reader", "domain": "example.com"})));
    }

    #[test]
    fn user_grant_carries_notification_params() {
        let req = input(
            &PermissionCreate,
            json!({
                "fileId": "f", "type": "user", "role": "writer",
                "emailAddress": "a@example.com", "emailMessage": "have a look"
            }),
        )
        .request();
        assert_eq!(req.query_value("sendNotificationEmail"), Some("true"));
        assert_eq!(req.query_value("emailMessage"), Some("have a look"));
        assert_eq!(req.query_value("supportsAllDrives"), Some("true"));
        assert_eq!(req.query_value("useDomainAdminAccess"), Some("false"));
        assert_eq!(req.query_value("transferOwnership"), None);
    }

    #[test]
    fn ownership_flags_only_when_set() {
        let req = input(
            &PermissionCreate,
            json!({
                "fileId": "f", "type": "user", "role": "owner", "emailAddress": "a@example.com",
                "transferOwnership": true, "moveToNewOwnersRoot": true
            }),
        )
        .request();
        assert_eq!(req.query_value("transferOwnership"), Some("true"));
        assert_eq!(req.query_value("moveToNewOwnersRoot"), Some("true"));
    }

    #[test]
    fn create_rejects_unknown_role() {
        let err = PERMISSION_CREATE_SHAPE
            .validate(args(json!({"fileId": "f", "type": "user", "role": "viewer"})))
            .unwrap_err();
        assert!(err.to_string().contains("owner, organizer, fileOrganizer, writer, commenter, reader"));
    }

    #[test]
    fn permissions_list_ignores_empty_page_token() {
        let req = input(&PermissionsList, json!({"fileId": "f", "pageToken": ""})).request();
        assert_eq!(req.query_value("pageToken"), None);
    }

    #[test]
    fn permissions_list_cursor_and_defaults() {
        let req = input(&PermissionsList, json!({"fileId": "f", "cursor": "p2"})).request();
        assert_eq!(req.path, "/files/f/permissions");
        assert_eq!(req.query_value("pageSize"), Some("100"));
        assert_eq!(req.query_value("pageToken"), Some("p2"));
        assert!(req.query_value("fields").unwrap().starts_with("nextPageToken,permissions(id,type,role"));
    }

    #[test]
    fn update_checks_expiration_and_sets_flags() {
        let req = input(
            &PermissionUpdate,
            json!({
                "fileId": "f", "permissionId": "p", "role": "commenter",
                "expirationTime": "2030-01-01T00:00:00Z", "removeExpiration": false
            }),
        )
        .request()
        .unwrap();
        assert_eq!(req.body, Some(json!({"role": "commenter", "expirationTime": "2030-01-01T00:00:00Z"})));
        assert_eq!(req.query_value("removeExpiration"), None);

        let bad = input(
            &PermissionUpdate,
            json!({"fileId": "f", "permissionId": "p", "role": "reader", "expirationTime": "next year"}),
        );
        assert!(matches!(bad.request(), Err(GatewayError::Precondition(_))));

        let req = input(
            &PermissionUpdate,
            json!({"fileId": "f", "permissionId": "p", "role": "reader", "removeExpiration": true}),
        )
        .request()
        .unwrap();
        assert_eq!(req.query_value("removeExpiration"), Some("true"));
    }

    #[tokio::test]
    async fn anyone_grant_over_the_wire() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/files/f/permissions")
                .query_param("supportsAllDrives", "true")
                .query_param("useDomainAdminAccess", "false")
                .json_body(json!({"type": "anyone", "role": "reader"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "anyoneWithLink", "type": "anyone", "role": "reader"}));
        });
        let notified = server.mock(|when, then| {
            when.query_param_exists("sendNotificationEmail");
            then.status(400);
        });
        let out = call(&PermissionCreate, &server, json!({"fileId": "f", "type": "anyone", "role": "reader"}))
            .await
            .unwrap();
        m.assert();
        notified.assert_hits(0);
        assert_eq!(out["id"], "anyoneWithLink");
    }

    #[tokio::test]
    async fn permission_delete_acknowledges() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(DELETE).path("/files/f/permissions/p");
            then.status(204);
        });
        let out = call(&PermissionDelete, &server, json!({"fileId": "f", "permissionId": "p"}))
            .await
            .unwrap();
        m.assert();
        assert_eq!(out, json!({"success": true, "message": "Permission deleted successfully"}));
    }

    #[tokio::test]
    async fn permission_get_rejects_unknown_role_in_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/f/permissions/p");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "p", "type": "user", "role": "superuser"}));
        });
        let err = call(&PermissionGet, &server, json!({"fileId": "f", "permissionId": "p"}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::OutputValidation(_)));
    }
}
