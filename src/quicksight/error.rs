use thiserror::Error;

/// Errors surfaced by the remote catalog. AlreadyExists is deliberately its
/// own variant: the migration treats it as a non-fatal, idempotent outcome.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("{op} timed out")]
    Timeout { op: &'static str },

    #[error("{op} failed: {message}")]
    Operation { op: &'static str, message: String },
}
