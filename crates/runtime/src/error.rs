use crate::model::ModelError;
use crate::schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The channel to the tool server failed.
    #[error(transparent)]
    Transport(#[from] mcp::Error),

    /// A tool advertised a schema we could not validate.
    #[error("tool \"{tool}\": {source}")]
    Schema {
        tool: String,
        #[source]
        source: SchemaError,
    },

    /// The model gateway call failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, Error>;
