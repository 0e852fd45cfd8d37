//! Moor runtime — the bridge between a chat model and an MCP tool server.
//!
//! # Overview
//!
//! - **Session**: owns one channel to a spawned tool server plus the tool
//!   registry cached at connect time.
//! - **Backend**: the model gateway trait; [`providers::AnthropicBackend`]
//!   implements it against the Messages API.
//! - **ToolHost**: the dispatcher trait; [`tools::McpToolHost`] delegates
//!   to the channel.
//! - **run_query**: the orchestration loop — model call, in-order tool
//!   dispatch, result relay, bounded rounds.
//!
//! # Example
//!
//! ```ignore
//! use mcp::ChannelConfig;
//! use runtime::{providers::AnthropicBackend, Session};
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = AnthropicBackend::builder("sk-ant-api01-...").build();
//! let session = Session::connect(backend, ChannelConfig::new("python3").arg("weather.py")).await?;
//!
//! let answer = session.process_query("What's the weather alert for CA?").await?;
//! println!("{answer}");
//!
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
pub mod providers;
mod query;
pub mod registry;
pub mod schema;
mod session;
pub mod tools;

pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult,
    ToolSpec, Usage,
};
pub use query::{run_query, DEFAULT_MAX_ROUNDS};
pub use registry::ToolDescriptor;
pub use schema::{SchemaError, SchemaKind, SchemaNode};
pub use session::Session;
pub use tools::{EmptyToolHost, McpToolHost, ToolError, ToolHost};
