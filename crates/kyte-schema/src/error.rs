use std::fmt::Display;

/// Errors raised while resolving the field table of a source value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("source is not a struct")]
    NotStruct,
    #[error("unsupported source: {0}")]
    Unsupported(String),
}

impl serde::ser::Error for SchemaError {
    fn custom<T: Display>(msg: T) -> Self {
        SchemaError::Unsupported(msg.to_string())
    }
}

impl serde::de::Error for SchemaError {
    fn custom<T: Display>(msg: T) -> Self {
        SchemaError::Unsupported(msg.to_string())
    }
}
