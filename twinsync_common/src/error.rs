use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwinSyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0} cancelled")]
    Cancelled(&'static str),
}

pub type Result<T> = std::result::Result<T, TwinSyncError>;
