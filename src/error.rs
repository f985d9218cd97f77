use thiserror::Error;

/// Adapter-wide error types.
///
/// These never cross the repository boundary: list and lookup operations
/// swallow them into empty/default results so a rendering layer always
/// receives a well-formed structure.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote source rejected a filter or sort referencing a property
    /// that no longer exists. Triggers one degraded retry.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Notion API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to generate summary")]
    Summary,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContentError {
    /// Whether this failure class is eligible for the degraded-query retry.
    pub fn is_schema_validation(&self) -> bool {
        matches!(self, ContentError::SchemaValidation(_))
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for ContentError {
    fn from(err: anyhow::Error) -> Self {
        ContentError::Internal(err.to_string())
    }
}
