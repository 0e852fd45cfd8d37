use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from dispatching one tool call.
///
/// All of these are recovered locally: the loop folds them into an
/// error-flagged result so the model can react, instead of aborting the
/// query. Serializable because failures travel inside conversation
/// messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ToolError {
    /// Model-supplied arguments were not a JSON object (or a string that
    /// parses into one).
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The server ran the tool and reported failure.
    #[error("execution failed: {0}")]
    Execution(String),

    /// The channel itself failed (disconnect, timeout, framing).
    #[error("transport: {0}")]
    Transport(String),
}
