use kyte_schema::SchemaError;

/// Errors produced while building a filter or pipeline.
///
/// Builders keep only the first error they encounter; every later operation
/// is skipped and `build()` returns that error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("field is empty, use a field name or a reference into the source")]
    EmptyField,
    #[error("field must be a string when no source is bound")]
    FieldMustBeString,
    #[error(
        "field `{0}` is not in the source struct (disable with `validate_field(false)` to allow it)"
    )]
    NotValidFieldForQuery(String),
    #[error(
        "field of type `{0}` was omitted when the source was serialized, bind a source with the field populated"
    )]
    FieldOmitted(String),
    #[error("invalid bson type")]
    InvalidBsonType,
    #[error("value must be an array")]
    ValueMustBeArray,
    #[error("invalid regex option: {0}")]
    InvalidRegexOption(char),
    #[error("{0} requires a non-empty filter")]
    EmptyLogicalOperand(&'static str),
    #[error("`_id` holds the group key and cannot be an accumulator output")]
    ReservedGroupField,
    #[error("json error: {0}")]
    Json(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
