//! Google Drive v3 REST client: one authenticated request per call, no retries.

pub mod multipart;
pub mod response;

use std::time::Instant;

use reqwest::{header::ACCEPT, header::CONTENT_TYPE, Client, Method, RequestBuilder, Response};
use serde_json::Value;

use crate::core::content::ApiResponse;
use crate::core::credential::Credential;
use crate::core::error::GatewayError;
use crate::infra::config::DriveConfig;
use crate::infra::http::headers::add_standard_headers;

pub use multipart::{Upload, UploadContent};

pub const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// One Drive call, built from validated tool input and never mutated after.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn param_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// Only emit `key=true`; `false` leaves the API default in place.
    pub fn flag(self, key: &'static str, on: bool) -> Self {
        if on {
            self.param(key, true)
        } else {
            self
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// How `file_download` obtains content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Stored bytes, `alt=media`.
    Media,
    /// Server-side conversion of a Docs/Sheets/Slides file.
    Export(String),
}

impl Retrieval {
    pub fn request(&self, file_id: &str) -> ApiRequest {
        match self {
            Retrieval::Media => ApiRequest::get(format!("/files/{file_id}")).param("alt", "media"),
            Retrieval::Export(mime) => {
                ApiRequest::get(format!("/files/{file_id}/export")).param("mimeType", mime)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Downloaded {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct DriveClient {
    api_base: String,
    upload_base: String,
    http: Client,
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::with_base_urls(DRIVE_API_BASE_URL, DRIVE_UPLOAD_BASE_URL)
    }
}

impl DriveClient {
    pub fn with_base_urls(api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            upload_base: upload_base.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(cfg: &DriveConfig) -> Self {
        Self::with_base_urls(cfg.api_base_url.clone(), cfg.upload_base_url.clone())
    }

    fn url(base: &str, path: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    /// JSON call against the API base.
    pub async fn dispatch(
        &self,
        credential: &Credential,
        req: ApiRequest,
    ) -> Result<ApiResponse, GatewayError> {
        let url = Self::url(&self.api_base, &req.path);
        let mut builder = self
            .http
            .request(req.method.clone(), url)
            .bearer_auth(credential.token())
            .header(ACCEPT, "application/json");
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        let resp = self.send(builder, &req.method, &req.path).await?;
        response::read(resp).await
    }

    /// Multipart create (POST) or content replacement (PATCH).
    pub async fn upload(
        &self,
        credential: &Credential,
        upload: Upload,
    ) -> Result<ApiResponse, GatewayError> {
        let method = upload.method();
        let path = upload.path();
        let url = Self::url(&self.upload_base, &path);
        let builder = self
            .http
            .request(method.clone(), url)
            .query(&[("uploadType", "multipart")])
            .bearer_auth(credential.token())
            .header(CONTENT_TYPE, multipart::content_type())
            .body(upload.body());
        let resp = self.send(builder, &method, &path).await?;
        response::read(resp).await
    }

    /// Raw content retrieval; the body is returned as bytes, unnormalized.
    pub async fn download(
        &self,
        credential: &Credential,
        req: ApiRequest,
    ) -> Result<Downloaded, GatewayError> {
        let url = Self::url(&self.api_base, &req.path);
        let builder = self
            .http
            .request(req.method.clone(), url)
            .query(&req.query)
            .bearer_auth(credential.token());
        let resp = self.send(builder, &req.method, &req.path).await?;
        let resp = response::ensure_success(resp).await?;
        let content_type = response::content_type(&resp);
        let bytes = resp.bytes().await?.to_vec();
        Ok(Downloaded { bytes, content_type })
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<Response, GatewayError> {
        let (builder, rid) = add_standard_headers(builder, None);
        tracing::debug!(request_id = %rid, %method, path, "drive request");
        let start = Instant::now();
        let res = builder.send().await;
        let elapsed_ms = start.elapsed().as_millis() as f64;
        match &res {
            Ok(resp) => {
                let status = resp.status();
                tracing::debug!(request_id = %rid, status = status.as_u16(), elapsed_ms, "drive response");
                crate::infra::logging::record_api_call(method.as_str(), status.as_u16(), elapsed_ms);
            }
            Err(e) => {
                tracing::warn!(request_id = %rid, %method, path, error = %e, "drive request failed");
                crate::infra::logging::record_api_call(method.as_str(), 0, elapsed_ms);
            }
        }
        Ok(res?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rmcp::model::JsonObject;
    use serde_json::json;

    fn client(server: &MockServer) -> DriveClient {
        DriveClient::with_base_urls(server.base_url(), server.base_url())
    }

    fn token() -> Credential {
        Credential::new("test-token")
    }

    #[tokio::test]
    async fn dispatch_sends_bearer_accept_and_query() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/files/abc")
                .query_param("supportsAllDrives", "true")
                .query_param("fields", "id,name")
                .header("authorization", "Bearer test-token")
                .header("accept", "application/json")
                .header_exists("x-request-id")
                .header_exists("user-agent");
            then.status(200)
                .header("content-type", "application/json; charset=UTF-8")
                .body(r#"{"id":"abc","name":"a.txt"}"#);
        });

        let req = ApiRequest::get("/files/abc")
            .param("supportsAllDrives", true)
            .param("fields", "id,name");
        let out = client(&server).dispatch(&token(), req).await.unwrap();
        m.assert();
        assert_eq!(out, ApiResponse::Json(json!({"id": "abc", "name": "a.txt"})));
    }

    #[tokio::test]
    async fn dispatch_serializes_json_body() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/files/abc")
                .header("content-type", "application/json")
                .json_body(json!({"name": "renamed"}));
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"abc","name":"renamed","mimeType":"text/plain"}"#);
        });

        let req = ApiRequest::patch("/files/abc").json(json!({"name": "renamed"}));
        let out = client(&server).dispatch(&token(), req).await.unwrap();
        m.assert();
        assert_eq!(out.into_value()["name"], "renamed");
    }

    #[tokio::test]
    async fn dispatch_surfaces_api_errors_without_retrying() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(DELETE).path("/files/gone");
            then.status(404)
                .header("content-type", "application/json")
                .body(r#"{"error":{"code":404,"message":"File not found: gone."}}"#);
        });

        let err = client(&server)
            .dispatch(&token(), ApiRequest::delete("/files/gone"))
            .await
            .unwrap_err();
        m.assert_hits(1);
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("File not found: gone."));
    }

    #[tokio::test]
    async fn empty_body_without_content_type_is_success_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(DELETE).path("/files/abc");
            then.status(204);
        });

        let out = client(&server)
            .dispatch(&token(), ApiRequest::delete("/files/abc"))
            .await
            .unwrap();
        assert_eq!(out, ApiResponse::Text("Success".into()));
    }

    #[tokio::test]
    async fn upload_posts_multipart_to_upload_endpoint() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/files")
                .query_param("uploadType", "multipart")
                .header("authorization", "Bearer test-token")
                .header("content-type", "multipart/related; boundary=\"-------314159265358979323846\"")
                .body_contains("{\"name\":\"a.txt\"}")
                .body_contains("Content-Type: text/plain\r\n\r\nhello");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"new","name":"a.txt","mimeType":"text/plain"}"#);
        });

        let upload = Upload {
            metadata: json!({"name": "a.txt"}).as_object().cloned().unwrap(),
            content: UploadContent::Text("hello".into()),
            mime_type: "text/plain".into(),
            file_id: None,
        };
        let out = client(&server).upload(&token(), upload).await.unwrap();
        m.assert();
        assert_eq!(out.into_value()["id"], "new");
    }

    #[tokio::test]
    async fn upload_with_file_id_patches_that_file() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/files/abc")
                .query_param("uploadType", "multipart");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id":"abc","name":"a.txt","mimeType":"text/plain"}"#);
        });

        let upload = Upload {
            metadata: JsonObject::new(),
            content: UploadContent::Text("v2".into()),
            mime_type: "text/plain".into(),
            file_id: Some("abc".into()),
        };
        client(&server).upload(&token(), upload).await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn download_returns_bytes_and_content_type() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/files/abc").query_param("alt", "media");
            then.status(200).header("content-type", "text/csv").body("a,b\n1,2\n");
        });

        let out = client(&server)
            .download(&token(), Retrieval::Media.request("abc"))
            .await
            .unwrap();
        m.assert();
        assert_eq!(out.bytes, b"a,b\n1,2\n");
        assert_eq!(out.content_type.as_deref(), Some("text/csv"));
    }

    #[tokio::test]
    async fn download_failure_is_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/abc/export");
            then.status(403).body("exportSizeLimitExceeded");
        });

        let err = client(&server)
            .download(&token(), Retrieval::Export("application/pdf".into()).request("abc"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403 Forbidden - exportSizeLimitExceeded"));
    }

    #[test]
    fn retrieval_modes_map_to_distinct_endpoints() {
        let media = Retrieval::Media.request("abc");
        assert_eq!(media.path, "/files/abc");
        assert_eq!(media.query_value("alt"), Some("media"));
        assert_eq!(media.query_value("mimeType"), None);

        let export = Retrieval::Export("text/csv".into()).request("abc");
        assert_eq!(export.path, "/files/abc/export");
        assert_eq!(export.query_value("mimeType"), Some("text/csv"));
        assert_eq!(export.query_value("alt"), None);
    }
}
