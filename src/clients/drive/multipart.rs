//! `multipart/related` bodies for uploads: JSON metadata, then raw content.

use reqwest::Method;
use rmcp::model::JsonObject;
use serde_json::Value;

pub const BOUNDARY: &str = "-------314159265358979323846";

pub fn content_type() -> String {
    format!("multipart/related; boundary=\"{BOUNDARY}\"")
}

/// File content as handed over by a tool. Base64 has already been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadContent {
    Text(String),
    Binary(Vec<u8>),
}

impl UploadContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UploadContent::Text(s) => s.as_bytes(),
            UploadContent::Binary(b) => b,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub metadata: JsonObject,
    pub content: UploadContent,
    pub mime_type: String,
    /// Replace the content of this file instead of creating a new one.
    pub file_id: Option<String>,
}

impl Upload {
    pub fn method(&self) -> Method {
        if self.file_id.is_some() {
            Method::PATCH
        } else {
            Method::POST
        }
    }

    pub fn path(&self) -> String {
        match &self.file_id {
            Some(id) => format!("/files/{id}"),
            None => "/files".to_owned(),
        }
    }

    pub fn body(&self) -> Vec<u8> {
        encode(&self.metadata, self.content.as_bytes(), &self.mime_type)
    }
}

pub fn encode(metadata: &JsonObject, content: &[u8], mime_type: &str) -> Vec<u8> {
    let delimiter = format!("\r\n--{BOUNDARY}\r\n");
    let close = format!("\r\n--{BOUNDARY}--");
    let metadata_json = Value::Object(metadata.clone()).to_string();

    let mut body = Vec::with_capacity(content.len() + metadata_json.len() + 256);
    body.extend_from_slice(delimiter.as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(delimiter.as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(close.as_bytes());
    body
}
