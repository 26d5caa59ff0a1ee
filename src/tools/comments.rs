use async_trait::async_trait;
use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{check_rfc3339, present, run, PAGE_TOKEN};
use crate::clients::drive::ApiRequest;
use crate::core::error::GatewayError;
use crate::core::shape::{Field, InputShape, Kind, Literal};
use crate::core::tool::{CallContext, Contract, SideEffect, ToolSpec};
use crate::domain::comments::{Comment, CommentList, Reply};

const COMMENT_PROJECTION: &str =
    "id,content,createdTime,modifiedTime,author,resolved,deleted,htmlContent,quotedFileContent,anchor,replies";
const CREATED_COMMENT_PROJECTION: &str = "id,content,createdTime,author,anchor";
const CREATED_REPLY_PROJECTION: &str = "id,content,createdTime,author";
const RESOLUTION_PROJECTION: &str = "id,action,content,author";

const FILE_ID: Field = Field::required("fileId", Kind::String, "The ID of the file");

// ---- comments_list ----

static COMMENTS_LIST_FIELDS: &[Field] = &[
    FILE_ID,
    Field::defaulted(
        "pageSize",
        Kind::Integer { min: 1, max: 100 },
        Literal::Int(20),
        "Maximum number of comments to return (1-100)",
    ),
    PAGE_TOKEN,
    Field::defaulted("includeDeleted", Kind::Boolean, Literal::Bool(false), "Include deleted comments"),
    Field::optional(
        "startModifiedTime",
        Kind::String,
        "Only return comments modified after this time (RFC 3339)",
    ),
];
static COMMENTS_LIST_SHAPE: InputShape =
    InputShape::strict(COMMENTS_LIST_FIELDS, &[("cursor", "pageToken")]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsListInput {
    file_id: String,
    page_size: u32,
    page_token: Option<String>,
    include_deleted: bool,
    start_modified_time: Option<String>,
}

impl CommentsListInput {
    pub fn request(&self) -> Result<ApiRequest, GatewayError> {
        let start_modified_time = present(&self.start_modified_time);
        if let Some(ts) = start_modified_time {
            check_rfc3339("startModifiedTime", ts)?;
        }
        Ok(ApiRequest::get(format!("/files/{}/comments", self.file_id))
            .param("pageSize", self.page_size)
            .param("includeDeleted", self.include_deleted)
            .param("fields", format!("nextPageToken,comments({COMMENT_PROJECTION})"))
            .param_opt("pageToken", present(&self.page_token))
            .param_opt("startModifiedTime", start_modified_time))
    }
}

pub struct CommentsList;

#[async_trait]
impl Contract for CommentsList {
    type Input = CommentsListInput;
    type Output = CommentList;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "comments_list",
            title: "List comments",
            description: "List comments on a file. Works with Google Docs, Sheets, Slides and other Drive files.",
            side_effect: SideEffect::ReadOnly,
            input: &COMMENTS_LIST_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: CommentsListInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()?).await
    }
}

// ---- comment_get ----

static COMMENT_GET_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("commentId", Kind::String, "The ID of the comment"),
    Field::defaulted("includeDeleted", Kind::Boolean, Literal::Bool(false), "Include deleted replies"),
];
static COMMENT_GET_SHAPE: InputShape = InputShape::passthrough(COMMENT_GET_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentGetInput {
    file_id: String,
    comment_id: String,
    include_deleted: bool,
}

impl CommentGetInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::get(format!("/files/{}/comments/{}", self.file_id, self.comment_id))
            .param("includeDeleted", self.include_deleted)
            .param("fields", COMMENT_PROJECTION)
    }
}

pub struct CommentGet;

#[async_trait]
impl Contract for CommentGet {
    type Input = CommentGetInput;
    type Output = Comment;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "comment_get",
            title: "Get comment",
            description: "Get a specific comment and its replies.",
            side_effect: SideEffect::ReadOnly,
            input: &COMMENT_GET_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: CommentGetInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- comment_create ----

static COMMENT_CREATE_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to comment on"),
    Field::required("content", Kind::String, "The text content of the comment"),
    Field::optional(
        "anchor",
        Kind::String,
        "JSON anchor for region comments on images: [null,[null,[x,y,width,height]],null,null] with fractions 0-1. Not supported on Google Docs/Sheets/Slides.",
    ),
];
static COMMENT_CREATE_SHAPE: InputShape = InputShape::passthrough(COMMENT_CREATE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateInput {
    file_id: String,
    content: String,
    anchor: Option<String>,
}

impl CommentCreateInput {
    pub fn request(&self) -> ApiRequest {
        let mut body = JsonObject::new();
        body.insert("content".into(), json!(self.content));
        if let Some(anchor) = self.anchor.as_deref().filter(|a| !a.is_empty()) {
            body.insert("anchor".into(), json!(anchor));
        }
        ApiRequest::post(format!("/files/{}/comments", self.file_id))
            .param("fields", CREATED_COMMENT_PROJECTION)
            .json(Value::Object(body))
    }
}

pub struct CommentCreate;

#[async_trait]
impl Contract for CommentCreate {
    type Input = CommentCreateInput;
    type Output = Comment;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "comment_create",
            title: "Create comment",
            description: "Add a comment to a file.\n\
                Images accept anchored comments via `anchor` ([null,[null,[x,y,width,height]],null,null], fractions 0-1).\n\
                Google Docs/Sheets/Slides only accept unanchored comments, shown in the sidebar; use comment_reply to answer existing anchored comments.",
            side_effect: SideEffect::Mutating,
            input: &COMMENT_CREATE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: CommentCreateInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- comment_reply ----

static COMMENT_REPLY_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("commentId", Kind::String, "The ID of the comment to reply to"),
    Field::required("content", Kind::String, "The text content of the reply"),
];
static COMMENT_REPLY_SHAPE: InputShape = InputShape::passthrough(COMMENT_REPLY_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReplyInput {
    file_id: String,
    comment_id: String,
    content: String,
}

impl CommentReplyInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::post(format!("/files/{}/comments/{}/replies", self.file_id, self.comment_id))
            .param("fields", CREATED_REPLY_PROJECTION)
            .json(json!({ "content": self.content }))
    }
}

pub struct CommentReply;

#[async_trait]
impl Contract for CommentReply {
    type Input = CommentReplyInput;
    type Output = Reply;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "comment_reply",
            title: "Reply to comment",
            description: "Add a reply to an existing comment.",
            side_effect: SideEffect::Mutating,
            input: &COMMENT_REPLY_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: CommentReplyInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- comment_resolve ----

static COMMENT_RESOLVE_FIELDS: &[Field] = &[
    FILE_ID,
    Field::required("commentId", Kind::String, "The ID of the comment to resolve or reopen"),
    Field::defaulted(
        "action",
        Kind::Enum(&["resolve", "reopen"]),
        Literal::Str("resolve"),
        "\"resolve\" marks the comment resolved, \"reopen\" unresolves it",
    ),
    Field::optional("content", Kind::String, "Optional message to post with the action"),
];
static COMMENT_RESOLVE_SHAPE: InputShape = InputShape::passthrough(COMMENT_RESOLVE_FIELDS, &[]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Resolve,
    Reopen,
}

impl Resolution {
    fn as_str(self) -> &'static str {
        match self {
            Resolution::Resolve => "resolve",
            Resolution::Reopen => "reopen",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResolveInput {
    file_id: String,
    comment_id: String,
    action: Resolution,
    content: Option<String>,
}

impl CommentResolveInput {
    pub fn request(&self) -> ApiRequest {
        let mut body = JsonObject::new();
        body.insert("action".into(), json!(self.action.as_str()));
        if let Some(content) = self.content.as_deref().filter(|c| !c.is_empty()) {
            body.insert("content".into(), json!(content));
        }
        ApiRequest::post(format!("/files/{}/comments/{}/replies", self.file_id, self.comment_id))
            .param("fields", RESOLUTION_PROJECTION)
            .json(Value::Object(body))
    }
}

pub struct CommentResolve;

#[async_trait]
impl Contract for CommentResolve {
    type Input = CommentResolveInput;
    type Output = Reply;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "comment_resolve",
            title: "Resolve or reopen comment",
            description: "Resolve or reopen a comment by posting a reply that carries the action.",
            side_effect: SideEffect::Mutating,
            input: &COMMENT_RESOLVE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: CommentResolveInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}
