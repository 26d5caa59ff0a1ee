use async_trait::async_trait;
use rmcp::model::JsonObject;
use schemars::{generate::SchemaSettings, JsonSchema};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::clients::drive::DriveClient;
use crate::core::credential::Credential;
use crate::core::error::GatewayError;
use crate::core::shape::InputShape;

/// Declared side effect of a tool, published to the host for its own gating.
/// The gateway never enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    ReadOnly,
    Mutating,
    Destructive,
}

/// Static metadata every tool exposes.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub side_effect: SideEffect,
    pub input: &'static InputShape,
}

/// Everything a handler needs for its single outbound call.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    pub client: &'a DriveClient,
    pub credential: &'a Credential,
}

/// Object-safe tool surface used by the registry.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    /// JSON schema of the structured result, published in `tools/list`.
    fn output_schema(&self) -> JsonObject;
    async fn call(&self, ctx: CallContext<'_>, args: JsonObject) -> Result<Value, GatewayError>;
}

/// Typed tool contract: input struct, output shape and a handler.
///
/// Implementors only map a validated `Input` onto one Drive call; argument
/// checking before the handler and output checking after it happen in the
/// blanket [`Tool`] impl.
#[async_trait]
pub trait Contract: Send + Sync + 'static {
    type Input: DeserializeOwned + Send + 'static;
    type Output: DeserializeOwned + Serialize + JsonSchema;

    fn spec(&self) -> ToolSpec;
    async fn handle(&self, ctx: CallContext<'_>, input: Self::Input) -> Result<Value, GatewayError>;
}

#[async_trait]
impl<C: Contract> Tool for C {
    fn spec(&self) -> ToolSpec {
        Contract::spec(self)
    }

    fn output_schema(&self) -> JsonObject {
        output_schema::<C::Output>()
    }

    async fn call(&self, ctx: CallContext<'_>, args: JsonObject) -> Result<Value, GatewayError> {
        let spec = Contract::spec(self);
        let args = spec.input.validate(args)?;
        let input: C::Input = serde_json::from_value(Value::Object(args))
            .map_err(|e| GatewayError::InvalidInput(e.to_string()))?;
        tracing::debug!(tool = spec.name, "tool invoked");
        let raw = self.handle(ctx, input).await?;
        conform::<C::Output>(raw)
    }
}

/// Self-contained schema of `O`: subschemas inlined, no `$schema` key.
pub fn output_schema<O: JsonSchema>() -> JsonObject {
    let schema = SchemaSettings::draft2020_12()
        .with(|s| {
            s.meta_schema = None;
            s.inline_subschemas = true;
        })
        .into_generator()
        .into_root_schema_for::<O>();
    schema.as_object().cloned().unwrap_or_default()
}

/// Check `raw` against output shape `O` and return it re-serialized. Unknown
/// fields survive wherever `O` flattens an extra-field bag.
pub fn conform<O: DeserializeOwned + Serialize>(raw: Value) -> Result<Value, GatewayError> {
    let typed: O =
        serde_json::from_value(raw).map_err(|e| GatewayError::OutputValidation(e.to_string()))?;
    serde_json::to_value(typed).map_err(|e| GatewayError::OutputValidation(e.to_string()))
}
