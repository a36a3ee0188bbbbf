use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitMixError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for UnitMixError {
    fn from(e: serde_json::Error) -> Self {
        UnitMixError::SerializationError(e.to_string())
    }
}
