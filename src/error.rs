use thiserror::Error;

/// Target placement failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no free cell left on a {width}x{height} board")]
    BoardFull { width: i32, height: i32 },
}

/// High-score store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("score store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration load or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
