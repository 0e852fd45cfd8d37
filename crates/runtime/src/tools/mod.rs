//! Tool dispatch.

mod empty;
mod errors;
mod mcp_host;

pub use empty::EmptyToolHost;
pub use errors::ToolError;
pub use mcp_host::McpToolHost;
pub(crate) use mcp_host::normalize_arguments;

use crate::model::{ToolCall, ToolSpec};
use serde_json::Value;
use std::future::Future;

/// The dispatcher seam between the orchestration loop and side effects.
///
/// Implementations expose the tool specs the model may call and execute
/// one call at a time. `execute` makes exactly one outbound attempt; a
/// failure is returned, never retried.
pub trait ToolHost: Send + Sync {
    /// Tool specifications to offer the model.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a single tool call.
    fn execute(&self, call: &ToolCall) -> impl Future<Output = Result<Value, ToolError>> + Send;
}
