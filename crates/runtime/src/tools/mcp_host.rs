//! MCP-backed tool host.

use super::{ToolError, ToolHost};
use crate::model::{ToolCall, ToolSpec};
use crate::registry::{self, ToolDescriptor};
use mcp::{Channel, ChannelConfig, Content};
use serde_json::Value;
use tracing::debug;

/// Dispatches tool calls to one MCP server over its channel.
///
/// Specs are translated once at connect time from the validated registry,
/// so every round offers the model the same tool set.
#[derive(Debug)]
pub struct McpToolHost {
    channel: Channel,
    descriptors: Vec<ToolDescriptor>,
    specs: Vec<ToolSpec>,
}

impl McpToolHost {
    /// Spawn the server, run the handshake, and fetch the registry.
    /// Any failure here aborts the connect; the subprocess is reaped on drop.
    pub async fn connect(config: ChannelConfig) -> crate::Result<Self> {
        let channel = Channel::spawn(config)?;
        channel.initialize().await?;
        let descriptors = registry::discover(&channel).await?;
        let specs = descriptors.iter().map(ToolDescriptor::to_spec).collect();
        Ok(Self {
            channel,
            descriptors,
            specs,
        })
    }

    /// The validated registry, as discovered at connect time.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Release the channel and its subprocess.
    pub async fn shutdown(self) -> crate::Result<()> {
        self.channel.shutdown().await?;
        Ok(())
    }
}

impl ToolHost for McpToolHost {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let arguments = normalize_arguments(&call.input)?;

        // One outbound call, no retries. The name is forwarded unchecked;
        // the server is authoritative about what exists.
        let result = self
            .channel
            .call_tool(&call.name, arguments)
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        let text = flatten_content(&result.content);
        debug!(tool = %call.name, is_error = result.is_error, "tool call returned");

        if result.is_error {
            return Err(ToolError::Execution(text));
        }
        Ok(Value::String(text))
    }
}

/// Normalize model-supplied arguments to what `tools/call` accepts.
///
/// Objects pass through; a string is parsed as a JSON object (providers
/// that stream arguments deliver them that way); null means no arguments.
/// Anything else is an argument-parse failure.
pub(crate) fn normalize_arguments(input: &Value) -> Result<Option<Value>, ToolError> {
    match input {
        Value::Object(_) => Ok(Some(input.clone())),
        Value::Null => Ok(None),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Object(_)) => Ok(Some(parsed)),
            Ok(other) => Err(ToolError::InvalidArguments(format!(
                "expected a JSON object, got {other}"
            ))),
            Err(e) => Err(ToolError::InvalidArguments(format!(
                "arguments are not valid JSON: {e}"
            ))),
        },
        other => Err(ToolError::InvalidArguments(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Collapse tool output blocks into one text payload. Non-text blocks are
/// serialized as JSON rather than dropped.
fn flatten_content(blocks: &[Content]) -> String {
    blocks
        .iter()
        .map(|block| match block.as_text() {
            Some(text) => text.to_string(),
            None => serde_json::to_string(block).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
