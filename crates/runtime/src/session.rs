//! Session lifecycle.

use crate::model::Backend;
use crate::query::{run_query, DEFAULT_MAX_ROUNDS};
use crate::registry::ToolDescriptor;
use crate::tools::McpToolHost;
use crate::Result;
use mcp::ChannelConfig;

/// One conversation-capable connection to a tool server.
///
/// Owns the channel and the registry cached at connect time. Queries run
/// one at a time; each starts a fresh conversation buffer, so nothing
/// carries over between queries except the tool set.
pub struct Session<B: Backend> {
    backend: B,
    host: McpToolHost,
    max_rounds: usize,
}

impl<B: Backend> Session<B> {
    /// Spawn the tool server, perform the handshake, and fetch the
    /// registry. Any failure aborts the connect; no session is returned
    /// and the subprocess is reaped.
    pub async fn connect(backend: B, config: ChannelConfig) -> Result<Self> {
        let host = McpToolHost::connect(config).await?;
        Ok(Self {
            backend,
            host,
            max_rounds: DEFAULT_MAX_ROUNDS,
        })
    }

    /// Cap the model calls per query.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    /// The tools discovered at connect time.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        self.host.descriptors()
    }

    /// Run one query to completion.
    ///
    /// A gateway failure surfaces here and aborts only this query; the
    /// session remains usable for the next one.
    pub async fn process_query(&self, query: &str) -> Result<String> {
        run_query(&self.backend, &self.host, query, self.max_rounds).await
    }

    /// Release the channel and its subprocess.
    pub async fn shutdown(self) -> Result<()> {
        self.host.shutdown().await
    }
}
