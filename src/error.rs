use thiserror::Error;

/// Every failure a sink can hit. None of them are recovered; the router turns
/// them all into a 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command exited with {status}: {stderr}")]
    Command { status: String, stderr: String },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reconstruction error: {0}")]
    Reconstruct(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] multer::Error),

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("Body read error: {0}")]
    Body(Box<dyn std::error::Error + Send + Sync>),

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}
