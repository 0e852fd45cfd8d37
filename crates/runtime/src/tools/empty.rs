//! No-op tool host.

use super::{ToolError, ToolHost};
use crate::model::{ToolCall, ToolSpec};
use serde_json::Value;

/// A host with no tools. Useful in tests and for chat without a server.
#[derive(Debug, Default)]
pub struct EmptyToolHost;

impl ToolHost for EmptyToolHost {
    fn specs(&self) -> &[ToolSpec] {
        &[]
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        Err(ToolError::Execution(format!("unknown tool: {}", call.name)))
    }
}
