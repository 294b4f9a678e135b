use thiserror::Error;

/// Rejections raised before a request reaches the comparison engine.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{field} must be {requirement}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
    },

    #[error("Invalid API JSON payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl InputError {
    pub fn out_of_range(field: &'static str, requirement: &'static str) -> Self {
        InputError::OutOfRange { field, requirement }
    }
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::Serialization(e.to_string())
    }
}
