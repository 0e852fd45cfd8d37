//! Transport error taxonomy.

use crate::protocol::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn tool server: {0}")]
    Spawn(std::io::Error),

    #[error("channel i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("channel not initialized")]
    NotInitialized,

    #[error("tool server exited unexpectedly")]
    ServerExited,

    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),

    #[error("framing: {0}")]
    Framing(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("server error: {0}")]
    Rpc(#[from] RpcError),

    #[error("response line too large: {size} bytes (limit {limit})")]
    OversizedResponse { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
