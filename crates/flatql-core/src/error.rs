use crate::{
    compile::CompileError,
    condition::ParseError,
    resolve::ResolveError,
    schema::InferError,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error as ThisError;

const DIAGNOSTIC_HEADER: &str = "Error in dynamic SQL generation";
const DIAGNOSTIC_FOOTER: &str = "Please verify your inputs and try again;";
const COMMENT_PREFIX: &str = "-- ";

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, ErrorOrigin::Input, message)
    }

    /// Render the comment-only diagnostic handed back in place of a query.
    ///
    /// Every line is comment-prefixed, including each line of a multi-line
    /// message, so the text is inert if executed.
    #[must_use]
    pub fn to_comment(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{COMMENT_PREFIX}{DIAGNOSTIC_HEADER}");

        let body = format!("Error message: {self}");
        for line in body.lines() {
            let _ = writeln!(out, "{COMMENT_PREFIX}{line}");
        }

        out.push_str(COMMENT_PREFIX);
        out.push_str(DIAGNOSTIC_FOOTER);
        out
    }
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Self {
        let message = err.to_string();
        let (kind, origin) = match err {
            GenerateError::InvalidInput(_) => (ErrorKind::InvalidInput, ErrorOrigin::Input),
            GenerateError::Parse(_) => (ErrorKind::Parse, ErrorOrigin::Parse),
            GenerateError::Infer(err) => (err.kind(), ErrorOrigin::Schema),
            GenerateError::Resolve(ResolveError::FieldNotFound { .. }) => {
                (ErrorKind::FieldNotFound, ErrorOrigin::Resolve)
            }
            GenerateError::Compile(err) => (err.kind(), ErrorOrigin::Compile),
        };

        Self::new(kind, origin, message)
    }
}

///
/// ErrorKind
/// Public error taxonomy.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Malformed condition grammar, including BETWEEN arity.
    Parse,

    /// No schema path matches a requested field.
    FieldNotFound,

    /// Operator not permitted for the field's type category.
    InvalidOperator,

    /// Cast target outside the allow-list.
    InvalidCastType,

    /// A literal does not fit the category it is compared against.
    InvalidValue,

    /// Sampling failed after bounded retries.
    DataFetch,

    /// Sampling returned nothing usable.
    NoData,

    /// Empty source, column, or condition list.
    InvalidInput,
}

impl ErrorKind {
    /// Stable label used as a metrics key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "Parse",
            Self::FieldNotFound => "FieldNotFound",
            Self::InvalidOperator => "InvalidOperator",
            Self::InvalidCastType => "InvalidCastType",
            Self::InvalidValue => "InvalidValue",
            Self::DataFetch => "DataFetch",
            Self::NoData => "NoData",
            Self::InvalidInput => "InvalidInput",
        }
    }
}

///
/// ErrorOrigin
/// Pipeline stage that produced the error.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Input,
    Parse,
    Schema,
    Resolve,
    Compile,
}

///
/// GenerateError
/// Internal aggregate of every stage failure.
///

#[derive(Debug, ThisError)]
pub(crate) enum GenerateError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Infer(#[from] InferError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl InferError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::DataFetch { .. } => ErrorKind::DataFetch,
            Self::NoData { .. } | Self::NoValidDocuments { .. } => ErrorKind::NoData,
        }
    }
}

impl CompileError {
    const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOperator { .. } => ErrorKind::InvalidOperator,
            Self::InvalidCastType { .. } => ErrorKind::InvalidCastType,
            Self::InvalidValue(_) | Self::MalformedValue { .. } => ErrorKind::InvalidValue,
            Self::UnplannedArray { .. } | Self::NoConditions | Self::InvalidColumn { .. } => {
                ErrorKind::InvalidInput
            }
        }
    }
}
