use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{present, run, run_delete, PAGE_TOKEN};
use crate::clients::drive::ApiRequest;
use crate::core::error::GatewayError;
use crate::core::shape::{Field, InputShape, Kind, Literal};
use crate::core::tool::{CallContext, Contract, SideEffect, ToolSpec};
use crate::domain::comments::{Reply, ReplyList};
use crate::domain::Acknowledgement;

const REPLY_PROJECTION: &str = "id,content,createdTime,modifiedTime,author,deleted,htmlContent,action";
const UPDATED_REPLY_PROJECTION: &str = "id,content,createdTime,modifiedTime,author";

pub const REPLY_DELETED: &str = "Reply deleted successfully";

const FILE_ID: Field = Field::required("fileId", Kind::String, "The ID of the file");
const COMMENT_ID: Field = Field::required("commentId", Kind::String, "The ID of the comment");

fn replies_path(file_id: &str, comment_id: &str) -> String {
    format!("/files/{file_id}/comments/{comment_id}/replies")
}

// ---- replies_list ----

static REPLIES_LIST_FIELDS: &[Field] = &[
    FILE_ID,
    COMMENT_ID,
    Field::defaulted(
        "pageSize",
        Kind::Integer { min: 1, max: 100 },
        Literal::Int(20),
        "Maximum number of replies to return (1-100)",
    ),
    PAGE_TOKEN,
    Field::defaulted("includeDeleted", Kind::Boolean, Literal::Bool(false), "Include deleted replies"),
];
static REPLIES_LIST_SHAPE: InputShape = InputShape::passthrough(REPLIES_LIST_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesListInput {
    file_id: String,
    comment_id: String,
    page_size: u32,
    page_token: Option<String>,
    include_deleted: bool,
}

impl RepliesListInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::get(replies_path(&self.file_id, &self.comment_id))
            .param("pageSize", self.page_size)
            .param("includeDeleted", self.include_deleted)
            .param("fields", format!("nextPageToken,replies({REPLY_PROJECTION})"))
            .param_opt("pageToken", present(&self.page_token))
    }
}

pub struct RepliesList;

#[async_trait]
impl Contract for RepliesList {
    type Input = RepliesListInput;
    type Output = ReplyList;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "replies_list",
            title: "List replies",
            description: "List replies to a comment.",
            side_effect: SideEffect::ReadOnly,
            input: &REPLIES_LIST_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: RepliesListInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- reply_get ----

static REPLY_GET_FIELDS: &[Field] = &[
    FILE_ID,
    COMMENT_ID,
    Field::required("replyId", Kind::String, "The ID of the reply"),
    Field::defaulted(
        "includeDeleted",
        Kind::Boolean,
        Literal::Bool(false),
        "Return the reply even if it was deleted",
    ),
];
static REPLY_GET_SHAPE: InputShape = InputShape::strict(REPLY_GET_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyGetInput {
    file_id: String,
    comment_id: String,
    reply_id: String,
    include_deleted: bool,
}

impl ReplyGetInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::get(format!("{}/{}", replies_path(&self.file_id, &self.comment_id), self.reply_id))
            .param("includeDeleted", self.include_deleted)
            .param("fields", REPLY_PROJECTION)
    }
}

pub struct ReplyGet;

#[async_trait]
impl Contract for ReplyGet {
    type Input = ReplyGetInput;
    type Output = Reply;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "reply_get",
            title: "Get reply",
            description: "Get a specific reply to a comment.",
            side_effect: SideEffect::ReadOnly,
            input: &REPLY_GET_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: ReplyGetInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- reply_update ----

static REPLY_UPDATE_FIELDS: &[Field] = &[
    FILE_ID,
    COMMENT_ID,
    Field::required("replyId", Kind::String, "The ID of the reply to update"),
    Field::required("content", Kind::String, "The updated text content of the reply"),
];
static REPLY_UPDATE_SHAPE: InputShape = InputShape::strict(REPLY_UPDATE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyUpdateInput {
    file_id: String,
    comment_id: String,
    reply_id: String,
    content: String,
}

impl ReplyUpdateInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::patch(format!("{}/{}", replies_path(&self.file_id, &self.comment_id), self.reply_id))
            .param("fields", UPDATED_REPLY_PROJECTION)
            .json(json!({ "content": self.content }))
    }
}

pub struct ReplyUpdate;

#[async_trait]
impl Contract for ReplyUpdate {
    type Input = ReplyUpdateInput;
    type Output = Reply;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "reply_update",
            title: "Update reply",
            description: "Update the content of an existing reply.",
            side_effect: SideEffect::Mutating,
            input: &REPLY_UPDATE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: ReplyUpdateInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- reply_delete ----

static REPLY_DELETE_FIELDS: &[Field] = &[
    FILE_ID,
    COMMENT_ID,
    Field::required("replyId", Kind::String, "The ID of the reply to delete"),
];
static REPLY_DELETE_SHAPE: InputShape = InputShape::passthrough(REPLY_DELETE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDeleteInput {
    file_id: String,
    comment_id: String,
    reply_id: String,
}

impl ReplyDeleteInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::delete(format!("{}/{}", replies_path(&self.file_id, &self.comment_id), self.reply_id))
    }
}

pub struct ReplyDelete;

#[async_trait]
impl Contract for ReplyDelete {
    type Input = ReplyDeleteInput;
    type Output = Acknowledgement;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "reply_delete",
            title: "Delete reply",
            description: "Delete a reply from a comment.",
            side_effect: SideEffect::Destructive,
            input: &REPLY_DELETE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: ReplyDeleteInput) -> Result<Value, GatewayError> {
        run_delete(ctx, input.request(), REPLY_DELETED).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, call, input};
    use httpmock::prelude::*;
    use reqwest::Method;

    #[test]
    fn replies_list_ignores_empty_page_token() {
        let req = input(&RepliesList, json!({"fileId": "f", "commentId": "c", "pageToken": ""})).request();
        assert_eq!(req.query_value("pageToken"), None);
    }

    #[test]
    fn replies_list_request() {
        let req = input(&RepliesList, json!({"fileId": "f", "commentId": "c", "pageSize": 3})).request();
        assert_eq!(req.path, "/files/f/comments/c/replies");
        assert_eq!(req.query_value("pageSize"), Some("3"));
        assert_eq!(req.query_value("includeDeleted"), Some("false"));
        assert_eq!(
            req.query_value("fields"),
            Some("nextPageToken,replies(id,content,createdTime,modifiedTime,author,deleted,htmlContent,action)")
        );
    }

    #[test]
    fn replies_list_page_size_is_bounded() {
        let err = REPLIES_LIST_SHAPE
            .validate(args(json!({"fileId": "f", "commentId": "c", "pageSize": 101})))
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));
    }

    #[test]
    fn reply_get_and_update_paths() {
        let req = input(&ReplyGet, json!({"fileId": "f", "commentId": "c", "replyId": "r"})).request();
        assert_eq!(req.path, "/files/f/comments/c/replies/r");
        assert_eq!(req.query_value("fields"), Some(REPLY_PROJECTION));

        let req = input(&ReplyUpdate, json!({"fileId": "f", "commentId": "c", "replyId": "r", "content": "edit"}))
            .request();
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.body, Some(json!({"content": "edit"})));
        assert_eq!(req.query_value("fields"), Some(UPDATED_REPLY_PROJECTION));
    }

    #[test]
    fn reply_update_is_strict() {
        let err = REPLY_UPDATE_SHAPE
            .validate(args(json!({"fileId": "f", "commentId": "c", "replyId": "r", "content": "x", "action": "resolve"})))
            .unwrap_err();
        assert!(err.to_string().contains("action"));
    }

    #[tokio::test]
    async fn reply_delete_acknowledges() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(DELETE).path("/files/f/comments/c/replies/r");
            then.status(204);
        });
        let out = call(&ReplyDelete, &server, json!({"fileId": "f", "commentId": "c", "replyId": "r"}))
            .await
            .unwrap();
        m.assert();
        assert_eq!(out, json!({"success": true, "message": "Reply deleted successfully"}));
    }

    #[tokio::test]
    async fn reply_get_keeps_unknown_fields() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/f/comments/c/replies/r");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "r", "content": "hi", "kind": "drive#reply"}));
        });
        let out = call(&ReplyGet, &server, json!({"fileId": "f", "commentId": "c", "replyId": "r"}))
            .await
            .unwrap();
        assert_eq!(out["kind"], "drive#reply");
    }
}
