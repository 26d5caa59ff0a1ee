use async_trait::async_trait;
use base64::Engine;
use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{decode_content, present, run, run_delete, PAGE_TOKEN, SUPPORTS_ALL_DRIVES};
use crate::clients::drive::{ApiRequest, Retrieval, Upload};
use crate::core::error::GatewayError;
use crate::core::shape::{Field, InputShape, Kind, Literal};
use crate::core::tool::{CallContext, Contract, SideEffect, ToolSpec};
use crate::domain::files::{DriveFile, FileContent, FileList, FOLDER_MIME_TYPE};
use crate::domain::Acknowledgement;

const FILES_LIST_PROJECTION: &str = "nextPageToken,incompleteSearch,files(id,name,mimeType,parents,webViewLink,webContentLink,createdTime,modifiedTime,size,owners,shared,trashed)";
const FILE_GET_PROJECTION: &str = "id,name,mimeType,parents,webViewLink,webContentLink,createdTime,modifiedTime,size,description,starred,trashed,owners,lastModifyingUser,shared,capabilities";
const OCTET_STREAM: &str = "application/octet-stream";

pub const FILE_DELETED: &str = "File permanently deleted";

// ---- files_list ----

static FILES_LIST_FIELDS: &[Field] = &[
    Field::optional(
        "query",
        Kind::String,
        "Search query in Drive search syntax, e.g. \"name contains 'report'\" or \"mimeType='application/pdf'\"",
    ),
    Field::defaulted(
        "pageSize",
        Kind::Integer { min: 1, max: 1000 },
        Literal::Int(100),
        "Maximum number of files to return (1-1000)",
    ),
    PAGE_TOKEN,
    Field::optional("orderBy", Kind::String, "Sort order, e.g. \"modifiedTime desc\" or \"name\""),
    Field::optional("fields", Kind::String, "Fields to include in the response. Defaults to common fields."),
    Field::defaulted(
        "spaces",
        Kind::Enum(&["drive", "appDataFolder"]),
        Literal::Str("drive"),
        "Spaces to search",
    ),
    Field::defaulted(
        "includeItemsFromAllDrives",
        Kind::Boolean,
        Literal::Bool(true),
        "Include files from shared drives",
    ),
    SUPPORTS_ALL_DRIVES,
];
static FILES_LIST_SHAPE: InputShape =
    InputShape::passthrough(FILES_LIST_FIELDS, &[("q", "query"), ("cursor", "pageToken")]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListInput {
    query: Option<String>,
    page_size: u32,
    page_token: Option<String>,
    order_by: Option<String>,
    fields: Option<String>,
    spaces: String,
    include_items_from_all_drives: bool,
    supports_all_drives: bool,
}

impl FilesListInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::get("/files")
            .param_opt("q", present(&self.query))
            .param("pageSize", self.page_size)
            .param_opt("pageToken", present(&self.page_token))
            .param_opt("orderBy", present(&self.order_by))
            .param("spaces", &self.spaces)
            .param("includeItemsFromAllDrives", self.include_items_from_all_drives)
            .param("supportsAllDrives", self.supports_all_drives)
            .param("fields", present(&self.fields).unwrap_or(FILES_LIST_PROJECTION))
    }
}

pub struct FilesList;

#[async_trait]
impl Contract for FilesList {
    type Input = FilesListInput;
    type Output = FileList;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "files_list",
            title: "List files",
            description: "List files in Google Drive. Use the query parameter to filter results with Drive search syntax.",
            side_effect: SideEffect::ReadOnly,
            input: &FILES_LIST_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FilesListInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- file_get ----

static FILE_GET_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to retrieve"),
    Field::optional("fields", Kind::String, "Fields to include in the response. Defaults to all common fields."),
    SUPPORTS_ALL_DRIVES,
];
static FILE_GET_SHAPE: InputShape = InputShape::strict(FILE_GET_FIELDS, &[("id", "fileId")]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGetInput {
    file_id: String,
    fields: Option<String>,
    supports_all_drives: bool,
}

impl FileGetInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::get(format!("/files/{}", self.file_id))
            .param("supportsAllDrives", self.supports_all_drives)
            .param("fields", present(&self.fields).unwrap_or(FILE_GET_PROJECTION))
    }
}

pub struct FileGet;

#[async_trait]
impl Contract for FileGet {
    type Input = FileGetInput;
    type Output = DriveFile;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_get",
            title: "Get file metadata",
            description: "Get metadata for a file by ID. Use file_download for the file content.",
            side_effect: SideEffect::ReadOnly,
            input: &FILE_GET_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileGetInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- file_download ----

static FILE_DOWNLOAD_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to download"),
    Field::optional(
        "exportMimeType",
        Kind::String,
        "For Google Docs/Sheets/Slides, the MIME type to export as, e.g. \"text/plain\", \"application/pdf\" or \"text/csv\"",
    ),
];
static FILE_DOWNLOAD_SHAPE: InputShape = InputShape::passthrough(FILE_DOWNLOAD_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownloadInput {
    file_id: String,
    export_mime_type: Option<String>,
}

impl FileDownloadInput {
    pub fn retrieval(&self) -> Retrieval {
        match self.export_mime_type.as_deref().filter(|m| !m.is_empty()) {
            Some(mime) => Retrieval::Export(mime.to_owned()),
            None => Retrieval::Media,
        }
    }
}

/// Text stays text; anything that is not UTF-8 is base64-encoded and flagged.
pub fn file_content(bytes: Vec<u8>, mime_type: String) -> FileContent {
    match String::from_utf8(bytes) {
        Ok(content) => FileContent { content, mime_type, is_base64: None },
        Err(e) => FileContent {
            content: base64::engine::general_purpose::STANDARD.encode(e.into_bytes()),
            mime_type,
            is_base64: Some(true),
        },
    }
}

pub struct FileDownload;

#[async_trait]
impl Contract for FileDownload {
    type Input = FileDownloadInput;
    type Output = FileContent;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_download",
            title: "Download file content",
            description: "Download the content of a file. For Google Docs/Sheets/Slides, set exportMimeType to pick a format (e.g. \"text/plain\" for Docs, \"text/csv\" for Sheets). Binary content comes back base64-encoded with isBase64 set.",
            side_effect: SideEffect::ReadOnly,
            input: &FILE_DOWNLOAD_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileDownloadInput) -> Result<Value, GatewayError> {
        let retrieval = input.retrieval();
        let downloaded = ctx
            .client
            .download(ctx.credential, retrieval.request(&input.file_id))
            .await?;
        let mime_type = match retrieval {
            Retrieval::Export(mime) => mime,
            Retrieval::Media => downloaded.content_type.unwrap_or_else(|| OCTET_STREAM.to_owned()),
        };
        serde_json::to_value(file_content(downloaded.bytes, mime_type))
            .map_err(|e| GatewayError::OutputValidation(e.to_string()))
    }
}

// ---- file_upload ----

static FILE_UPLOAD_FIELDS: &[Field] = &[
    Field::required("name", Kind::String, "The name of the file"),
    Field::required(
        "content",
        Kind::String,
        "The content of the file. For binary files (images, PDFs, etc.) provide base64 and set isBase64.",
    ),
    Field::required(
        "mimeType",
        Kind::String,
        "The MIME type of the file, e.g. \"text/plain\", \"image/jpeg\" or \"application/pdf\"",
    ),
    Field::optional("isBase64", Kind::Boolean, "Set to true if content is base64-encoded"),
    Field::optional("parents", Kind::StringArray, "Parent folder IDs. Defaults to the root folder."),
    Field::optional("description", Kind::String, "Description of the file"),
];
static FILE_UPLOAD_SHAPE: InputShape = InputShape::strict(FILE_UPLOAD_FIELDS, &[("mime_type", "mimeType")]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadInput {
    name: String,
    content: String,
    mime_type: String,
    #[serde(default)]
    is_base64: bool,
    #[serde(default)]
    parents: Vec<String>,
    description: Option<String>,
}

impl FileUploadInput {
    pub fn upload(self) -> Result<Upload, GatewayError> {
        let mut metadata = JsonObject::new();
        metadata.insert("name".into(), Value::String(self.name));
        metadata.insert("mimeType".into(), Value::String(self.mime_type.clone()));
        if !self.parents.is_empty() {
            metadata.insert("parents".into(), json!(self.parents));
        }
        if let Some(description) = self.description.filter(|d| !d.is_empty()) {
            metadata.insert("description".into(), Value::String(description));
        }
        Ok(Upload {
            metadata,
            content: decode_content(self.content, self.is_base64)?,
            mime_type: self.mime_type,
            file_id: None,
        })
    }
}

pub struct FileUpload;

#[async_trait]
impl Contract for FileUpload {
    type Input = FileUploadInput;
    type Output = DriveFile;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_upload",
            title: "Upload file",
            description: "Upload a new file to Google Drive.",
            side_effect: SideEffect::Mutating,
            input: &FILE_UPLOAD_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileUploadInput) -> Result<Value, GatewayError> {
        let upload = input.upload()?;
        Ok(ctx.client.upload(ctx.credential, upload).await?.into_value())
    }
}

// ---- file_update ----

static FILE_UPDATE_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to update"),
    Field::optional("content", Kind::String, "New content for the file"),
    Field::optional("mimeType", Kind::String, "MIME type of the content (required when content is given)"),
    Field::optional("isBase64", Kind::Boolean, "Set to true if content is base64-encoded"),
    Field::optional("name", Kind::String, "New name for the file"),
    Field::optional("description", Kind::String, "New description for the file"),
    Field::optional("starred", Kind::Boolean, "Star or unstar the file"),
    Field::optional(
        "trashed",
        Kind::Boolean,
        "Move to trash (true) or restore from trash (false). Trashed files can be restored within 30 days.",
    ),
    SUPPORTS_ALL_DRIVES,
];
static FILE_UPDATE_SHAPE: InputShape = InputShape::strict(FILE_UPDATE_FIELDS, &[("mime_type", "mimeType")]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdateInput {
    file_id: String,
    content: Option<String>,
    mime_type: Option<String>,
    #[serde(default)]
    is_base64: bool,
    name: Option<String>,
    description: Option<String>,
    starred: Option<bool>,
    trashed: Option<bool>,
    supports_all_drives: bool,
}

/// What a `file_update` call turns into, decided only by whether content was
/// supplied.
#[derive(Debug)]
pub enum UpdatePlan {
    Content(Upload),
    Metadata(ApiRequest),
}

impl FileUpdateInput {
    fn changed_metadata(&self) -> JsonObject {
        let mut metadata = JsonObject::new();
        if let Some(name) = &self.name {
            metadata.insert("name".into(), json!(name));
        }
        if let Some(description) = &self.description {
            metadata.insert("description".into(), json!(description));
        }
        if let Some(starred) = self.starred {
            metadata.insert("starred".into(), json!(starred));
        }
        if let Some(trashed) = self.trashed {
            metadata.insert("trashed".into(), json!(trashed));
        }
        metadata
    }

    pub fn plan(self) -> Result<UpdatePlan, GatewayError> {
        let metadata = self.changed_metadata();
        let Some(content) = self.content else {
            let req = ApiRequest::patch(format!("/files/{}", self.file_id))
                .param("supportsAllDrives", self.supports_all_drives)
                .json(Value::Object(metadata));
            return Ok(UpdatePlan::Metadata(req));
        };
        let mime_type = self
            .mime_type
            .filter(|m| !m.is_empty())
            .ok_or_else(|| GatewayError::precondition("mimeType is required when updating content"))?;
        Ok(UpdatePlan::Content(Upload {
            metadata,
            content: decode_content(content, self.is_base64)?,
            mime_type,
            file_id: Some(self.file_id),
        }))
    }
}

pub struct FileUpdate;

#[async_trait]
impl Contract for FileUpdate {
    type Input = FileUpdateInput;
    type Output = DriveFile;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_update",
            title: "Update file",
            description: "Update a file's content or metadata. Provide content to replace the file content, or only metadata fields for a metadata update.",
            side_effect: SideEffect::Mutating,
            input: &FILE_UPDATE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileUpdateInput) -> Result<Value, GatewayError> {
        match input.plan()? {
            UpdatePlan::Content(upload) => Ok(ctx.client.upload(ctx.credential, upload).await?.into_value()),
            UpdatePlan::Metadata(req) => run(ctx, req).await,
        }
    }
}

// ---- file_copy ----

static FILE_COPY_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to copy"),
    Field::optional("name", Kind::String, "Name for the copy. Defaults to \"Copy of <original name>\"."),
    Field::optional("parents", Kind::StringArray, "Parent folder IDs for the copy"),
    SUPPORTS_ALL_DRIVES,
];
static FILE_COPY_SHAPE: InputShape = InputShape::strict(FILE_COPY_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCopyInput {
    file_id: String,
    name: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    supports_all_drives: bool,
}

impl FileCopyInput {
    pub fn request(&self) -> ApiRequest {
        let mut body = JsonObject::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            body.insert("name".into(), json!(name));
        }
        if !self.parents.is_empty() {
            body.insert("parents".into(), json!(self.parents));
        }
        ApiRequest::post(format!("/files/{}/copy", self.file_id))
            .param("supportsAllDrives", self.supports_all_drives)
            .json(Value::Object(body))
    }
}

pub struct FileCopy;

#[async_trait]
impl Contract for FileCopy {
    type Input = FileCopyInput;
    type Output = DriveFile;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_copy",
            title: "Copy file",
            description: "Create a copy of a file.",
            side_effect: SideEffect::Mutating,
            input: &FILE_COPY_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileCopyInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- file_move ----

static FILE_MOVE_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to move"),
    Field::required("addParents", Kind::StringArray, "Folder IDs to add as parents (where to move the file)"),
    Field::optional("removeParents", Kind::StringArray, "Folder IDs to remove as parents (current locations)"),
    SUPPORTS_ALL_DRIVES,
];
static FILE_MOVE_SHAPE: InputShape = InputShape::passthrough(FILE_MOVE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMoveInput {
    file_id: String,
    add_parents: Vec<String>,
    #[serde(default)]
    remove_parents: Vec<String>,
    supports_all_drives: bool,
}

impl FileMoveInput {
    pub fn request(&self) -> ApiRequest {
        let joined = |ids: &[String]| (!ids.is_empty()).then(|| ids.join(","));
        ApiRequest::patch(format!("/files/{}", self.file_id))
            .param("supportsAllDrives", self.supports_all_drives)
            .param_opt("addParents", joined(&self.add_parents))
            .param_opt("removeParents", joined(&self.remove_parents))
            .json(json!({}))
    }
}

pub struct FileMove;

#[async_trait]
impl Contract for FileMove {
    type Input = FileMoveInput;
    type Output = DriveFile;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_move",
            title: "Move file",
            description: "Move a file to a different folder by changing its parents.",
            side_effect: SideEffect::Mutating,
            input: &FILE_MOVE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileMoveInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}

// ---- file_delete ----

static FILE_DELETE_FIELDS: &[Field] = &[
    Field::required("fileId", Kind::String, "The ID of the file to permanently delete"),
    SUPPORTS_ALL_DRIVES,
];
static FILE_DELETE_SHAPE: InputShape = InputShape::passthrough(FILE_DELETE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeleteInput {
    file_id: String,
    supports_all_drives: bool,
}

impl FileDeleteInput {
    pub fn request(&self) -> ApiRequest {
        ApiRequest::delete(format!("/files/{}", self.file_id))
            .param("supportsAllDrives", self.supports_all_drives)
    }
}

pub struct FileDelete;

#[async_trait]
impl Contract for FileDelete {
    type Input = FileDeleteInput;
    type Output = Acknowledgement;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "file_delete",
            title: "Delete file permanently",
            description: "Permanently delete a file. This cannot be undone. Prefer file_update with trashed:true, which moves the file to trash where it can be restored within 30 days.",
            side_effect: SideEffect::Destructive,
            input: &FILE_DELETE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FileDeleteInput) -> Result<Value, GatewayError> {
        run_delete(ctx, input.request(), FILE_DELETED).await
    }
}

// ---- folder_create ----

static FOLDER_CREATE_FIELDS: &[Field] = &[
    Field::required("name", Kind::String, "The name of the folder"),
    Field::optional("parents", Kind::StringArray, "Parent folder IDs. Defaults to the root folder."),
    Field::optional("description", Kind::String, "Description of the folder"),
];
static FOLDER_CREATE_SHAPE: InputShape = InputShape::passthrough(FOLDER_CREATE_FIELDS, &[]);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCreateInput {
    name: String,
    #[serde(default)]
    parents: Vec<String>,
    description: Option<String>,
}

impl FolderCreateInput {
    pub fn request(&self) -> ApiRequest {
        let mut body = JsonObject::new();
        body.insert("name".into(), json!(self.name));
        body.insert("mimeType".into(), json!(FOLDER_MIME_TYPE));
        if !self.parents.is_empty() {
            body.insert("parents".into(), json!(self.parents));
        }
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            body.insert("description".into(), json!(description));
        }
        ApiRequest::post("/files").json(Value::Object(body))
    }
}

pub struct FolderCreate;

#[async_trait]
impl Contract for FolderCreate {
    type Input = FolderCreateInput;
    type Output = DriveFile;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "folder_create",
            title: "Create folder",
            description: "Create a new folder in Google Drive.",
            side_effect: SideEffect::Mutating,
            input: &FOLDER_CREATE_SHAPE,
        }
    }

    async fn handle(&self, ctx: CallContext<'_>, input: FolderCreateInput) -> Result<Value, GatewayError> {
        run(ctx, input.request()).await
    }
}
