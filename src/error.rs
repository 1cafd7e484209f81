use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid poll interval {0:?}: expected <integer><s|m|h|d|w>")]
    InvalidPollInterval(String),

    #[error("Failed to bind dispatch master port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;
