use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::model::JsonObject;
use serde_json::Value;

use super::comments::{CommentCreate, CommentGet, CommentReply, CommentResolve, CommentsList};
use super::files::{
    FileCopy, FileDelete, FileDownload, FileGet, FileMove, FileUpdate, FileUpload, FilesList,
    FolderCreate,
};
use super::permissions::{
    PermissionCreate, PermissionDelete, PermissionGet, PermissionUpdate, PermissionsList,
};
use super::replies::{RepliesList, ReplyDelete, ReplyGet, ReplyUpdate};
use crate::core::error::GatewayError;
use crate::core::tool::{CallContext, Tool, ToolSpec};

/// Every tool the gateway serves, keyed by name. Built once at startup and
/// shared read-only afterwards.
#[derive(Clone)]
pub struct Registry {
    by_name: Arc<BTreeMap<&'static str, Arc<dyn Tool>>>,
}

impl Registry {
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let by_name = tools.into_iter().map(|t| (t.spec().name, t)).collect();
        Self { by_name: Arc::new(by_name) }
    }

    /// Specs in name order.
    pub fn list(&self) -> Vec<ToolSpec> {
        self.by_name.values().map(|t| t.spec()).collect()
    }

    /// Tools in name order.
    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> + '_ {
        self.by_name.values().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub async fn call(
        &self,
        name: &str,
        ctx: CallContext<'_>,
        args: JsonObject,
    ) -> Result<Value, GatewayError> {
        let tool = self
            .by_name
            .get(name)
            .ok_or_else(|| GatewayError::UnknownTool(name.to_owned()))?;
        tool.call(ctx, args).await
    }
}

fn shared<T: Tool + 'static>(tool: T) -> Arc<dyn Tool> {
    Arc::new(tool)
}

pub fn build_registry() -> Registry {
    Registry::with_tools(vec![
        shared(FilesList),
        shared(FileGet),
        shared(FileDownload),
        shared(FileUpload),
        shared(FileUpdate),
        shared(FileCopy),
        shared(FileMove),
        shared(FileDelete),
        shared(FolderCreate),
        shared(CommentsList),
        shared(CommentGet),
        shared(CommentCreate),
        shared(CommentReply),
        shared(CommentResolve),
        shared(RepliesList),
        shared(ReplyGet),
        shared(ReplyUpdate),
        shared(ReplyDelete),
        shared(PermissionsList),
        shared(PermissionGet),
        shared(PermissionCreate),
        shared(PermissionUpdate),
        shared(PermissionDelete),
    ])
}
