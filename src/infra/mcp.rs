//! MCP server integration for drive-mcp-gateway.
//!
//! `DriveSvc` implements `ServerHandler` directly over the tool [`Registry`]:
//! `tools/list` renders each tool's static spec, `tools/call` resolves the
//! caller's credential and runs the tool. The same handler serves both the
//! streamable HTTP transport at `/mcp` and stdio.

use std::sync::Arc;

use axum::http::request::Parts;
use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool as McpTool, ToolAnnotations,
    },
    service::RequestContext,
    ErrorData as McpError, RoleServer, ServerHandler,
};

use crate::clients::drive::DriveClient;
use crate::core::credential::Credential;
use crate::core::error::GatewayError;
use crate::core::tool::{CallContext, SideEffect, Tool};
use crate::infra::config::Config;
use crate::tools::registry::{build_registry, Registry};

const INSTRUCTIONS: &str = "Google Drive tools: list, read, upload and update files and folders, \
manage comments and replies, and share files through permissions. Every call runs with the \
caller's bearer token; list tools return nextPageToken, pass it back unchanged as pageToken.";

#[derive(Clone)]
pub struct DriveSvc {
    registry: Registry,
    client: DriveClient,
    fallback: Option<Credential>,
}

impl DriveSvc {
    pub fn new(registry: Registry, client: DriveClient, fallback: Option<Credential>) -> Self {
        Self { registry, client, fallback }
    }

    /// Bearer token of the inbound HTTP request wins; the configured token is
    /// only used when the caller sent none (always the case over stdio).
    fn resolve_credential(&self, parts: Option<&Parts>) -> Result<Credential, GatewayError> {
        parts
            .and_then(|p| p.headers.get(axum::http::header::AUTHORIZATION))
            .and_then(|v| v.to_str().ok())
            .and_then(Credential::from_header_value)
            .or_else(|| self.fallback.clone())
            .ok_or(GatewayError::MissingCredential)
    }

    /// Run one tool and map the outcome onto MCP: argument problems become
    /// JSON-RPC invalid params, everything else an `isError` tool result.
    pub async fn invoke(
        &self,
        name: &str,
        args: JsonObject,
        parts: Option<&Parts>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = match self.resolve_credential(parts) {
            Ok(credential) => {
                let ctx = CallContext { client: &self.client, credential: &credential };
                self.registry.call(name, ctx, args).await
            }
            Err(e) => Err(e),
        };
        match outcome {
            Ok(value) => Ok(CallToolResult::structured(value)),
            Err(e) if e.is_caller_error() => {
                tracing::debug!(tool = name, error = %e, "rejected tool arguments");
                Err(McpError::invalid_params(e.to_string(), None))
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    pub fn tools(&self) -> Vec<McpTool> {
        self.registry.tools().map(to_mcp_tool).collect()
    }
}

/// Render a tool the way `tools/list` publishes it.
pub fn to_mcp_tool(source: &dyn Tool) -> McpTool {
    let spec = source.spec();
    let mut tool = McpTool::new(spec.name, spec.description, Arc::new(spec.input.json_schema()));
    tool.output_schema = Some(Arc::new(source.output_schema()));
    tool.annotations = Some(ToolAnnotations {
        title: Some(spec.title.to_owned()),
        read_only_hint: Some(spec.side_effect == SideEffect::ReadOnly),
        destructive_hint: Some(spec.side_effect == SideEffect::Destructive),
        idempotent_hint: None,
        open_world_hint: Some(true),
    });
    tool
}

impl ServerHandler for DriveSvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.into()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult { tools: self.tools(), next_cursor: None })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request.arguments.unwrap_or_default();
        let parts = context.extensions.get::<Parts>();
        self.invoke(&request.name, args, parts).await
    }
}

/// Factory for transports that build one handler per session.
pub fn make_factory(cfg: &Config) -> impl Fn() -> DriveSvc + Clone + Send + Sync + 'static {
    let registry = build_registry();
    let client = DriveClient::from_config(&cfg.drive);
    let fallback = cfg.access_token.clone();
    move || DriveSvc::new(registry.clone(), client.clone(), fallback.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn svc(server: &MockServer, fallback: Option<&str>) -> DriveSvc {
        DriveSvc::new(
            build_registry(),
            DriveClient::with_base_urls(server.base_url(), server.base_url()),
            fallback.map(Credential::new),
        )
    }

    fn parts_with_auth(value: &str) -> Parts {
        axum::http::Request::builder()
            .header("authorization", value)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn args(v: serde_json::Value) -> JsonObject {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn annotations_follow_side_effects() {
        let svc = DriveSvc::new(build_registry(), DriveClient::default(), None);
        let tools = svc.tools();
        assert_eq!(tools.len(), 23);

        let delete = tools.iter().find(|t| t.name == "file_delete").unwrap();
        let ann = delete.annotations.as_ref().unwrap();
        assert_eq!(ann.destructive_hint, Some(true));
        assert_eq!(ann.read_only_hint, Some(false));
        assert_eq!(ann.title.as_deref(), Some("Delete file permanently"));

        let list = tools.iter().find(|t| t.name == "files_list").unwrap();
        assert_eq!(list.annotations.as_ref().unwrap().read_only_hint, Some(true));
        assert_eq!(list.input_schema["additionalProperties"], true);
        assert!(list.input_schema["properties"]["q"].is_object());

        for tool in &tools {
            let output = tool.output_schema.as_ref().unwrap();
            assert_eq!(output["type"], "object", "{}", tool.name);
        }
        let output = list.output_schema.as_ref().unwrap();
        assert!(output["properties"]["files"].is_object());
    }

    #[test]
    fn server_info_enables_tools() {
        let svc = DriveSvc::new(build_registry(), DriveClient::default(), None);
        let info = svc.get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "drive-mcp-gateway");
    }

    #[tokio::test]
    async fn header_token_wins_over_configured_token() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/files/abc").header("authorization", "Bearer from-header");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "abc", "name": "a", "mimeType": "text/plain"}));
        });
        let parts = parts_with_auth("Bearer from-header");
        let res = svc(&server, Some("from-config"))
            .invoke("file_get", args(json!({"fileId": "abc"})), Some(&parts))
            .await
            .unwrap();
        m.assert();
        assert_ne!(res.is_error, Some(true));
        assert_eq!(res.structured_content.unwrap()["id"], "abc");
    }

    #[tokio::test]
    async fn configured_token_used_without_header() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/files").header("authorization", "Bearer from-config");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"files": []}));
        });
        let res = svc(&server, Some("from-config"))
            .invoke("files_list", JsonObject::new(), None)
            .await
            .unwrap();
        m.assert();
        assert_eq!(res.structured_content, Some(json!({"files": []})));
    }

    #[tokio::test]
    async fn empty_bearer_header_falls_back_to_configured_token() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/files").header("authorization", "Bearer from-config");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"files": []}));
        });
        let parts = parts_with_auth("Bearer ");
        let res = svc(&server, Some("from-config"))
            .invoke("files_list", JsonObject::new(), Some(&parts))
            .await
            .unwrap();
        m.assert();
        assert_ne!(res.is_error, Some(true));
    }

    #[tokio::test]
    async fn missing_credential_fails_before_network() {
        let server = MockServer::start();
        let any = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });
        let res = svc(&server, None)
            .invoke("files_list", JsonObject::new(), None)
            .await
            .unwrap();
        any.assert_hits(0);
        assert_eq!(res.is_error, Some(true));
    }

    #[tokio::test]
    async fn bad_arguments_are_invalid_params() {
        let server = MockServer::start();
        let err = svc(&server, Some("t"))
            .invoke("file_get", args(json!({"fileId": "a", "bogus": 1})), None)
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("bogus"));

        let err = svc(&server, Some("t"))
            .invoke("no_such_tool", JsonObject::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn api_failures_are_tool_errors_with_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files/missing");
            then.status(404)
                .header("content-type", "application/json")
                .body(r#"{"error":{"message":"File not found: missing."}}"#);
        });
        let res = svc(&server, Some("t"))
            .invoke("file_get", args(json!({"fileId": "missing"})), None)
            .await
            .unwrap();
        assert_eq!(res.is_error, Some(true));
        let text = serde_json::to_string(&res.content).unwrap();
        assert!(text.contains("404"));
        assert!(text.contains("File not found: missing."));
    }
}
