use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Saved parameters do not fit the network they are loaded into.
    #[error("shape mismatch: expected {expected}, found {found}")]
    Shape { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, Error>;
