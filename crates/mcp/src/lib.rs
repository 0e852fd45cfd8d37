//! MCP (Model Context Protocol) client transport.
//!
//! Spawns a tool server as a subprocess and speaks newline-delimited
//! JSON-RPC 2.0 over its stdio. Exposes the three operations the rest of
//! the system needs: `initialize`, `tools/list`, and `tools/call`.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Channel, ChannelConfig};
//!
//! # async fn example() -> mcp::Result<()> {
//! let channel = Channel::spawn(ChannelConfig::new("python3").arg("weather.py"))?;
//! channel.initialize().await?;
//!
//! for tool in channel.list_tools().await? {
//!     println!("{}: {}", tool.name, tool.description.unwrap_or_default());
//! }
//!
//! let result = channel
//!     .call_tool("get_alerts", Some(serde_json::json!({ "state": "CA" })))
//!     .await?;
//! println!("is_error={}", result.is_error);
//!
//! channel.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod channel;
mod error;
mod protocol;

pub use channel::{Channel, ChannelConfig, MAX_RESPONSE_BYTES, REQUEST_TIMEOUT};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, Content, InitializeParams, InitializeResult, ListToolsResult,
    RpcError, RpcId, RpcNotification, RpcRequest, RpcResponse, ServerCapabilities, ServerInfo,
    Tool, ToolsCapability,
};
