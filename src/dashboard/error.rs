use thiserror::Error;

/// Structural validation failure for a loosely-typed filter or command
/// payload. Raised at the boundary, before the value reaches any core logic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected an object payload")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}': {message}")]
    Field {
        field: &'static str,
        message: String,
    },
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

impl ValidationError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field,
            message: message.into(),
        }
    }
}
