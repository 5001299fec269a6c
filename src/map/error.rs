use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("boundary dataset read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("boundary dataset parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("boundary dataset missing '{0}' member")]
    MissingMember(&'static str),
}
