use thiserror::Error;

use crate::model::ConfigField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodingError {
    #[error("malformed structured text at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("expected an object literal, found {found}")]
    NotAnObject { found: &'static str },
}

impl From<serde_json::Error> for TranscodingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("category name is blank")]
    BlankCategory,
    #[error("category `{0}` appears more than once")]
    DuplicateCategory(String),
    #[error("category `{0}` does not exist")]
    UnknownCategory(String),
    #[error("category `{0}` must be an array of strings")]
    KeywordShape(String),
    #[error("category `{0}` contains a blank keyword")]
    BlankKeyword(String),
    #[error("keyword `{keyword}` appears more than once in category `{category}`")]
    DuplicateKeyword { category: String, keyword: String },
    #[error("position {index} is out of range for {len} entries")]
    OutOfRange { index: usize, len: usize },
    #[error("this field does not accept {edit} edits")]
    UnsupportedEdit { edit: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorCause {
    #[error(transparent)]
    Transcoding(#[from] TranscodingError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {cause}")]
pub struct FieldError {
    pub field: ConfigField,
    pub cause: FieldErrorCause,
}

impl FieldError {
    pub fn new(field: ConfigField, cause: impl Into<FieldErrorCause>) -> Self {
        Self {
            field,
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("pipeline service unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },
    #[error("pipeline service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode pipeline service response: {0}")]
    Decode(String),
    #[error("could not read staged file {path}: {message}")]
    LocalFile { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0} already in progress")]
    Busy(&'static str),
    #[error("no configuration loaded")]
    NoConfig,
    #[error("configuration rejected with {} field error(s)", .0.len())]
    Rejected(Vec<FieldError>),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
