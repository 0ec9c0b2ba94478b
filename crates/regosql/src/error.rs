//! Conversion errors.

use thiserror::Error;

/// Failure converting a policy query into a predicate tree.
///
/// Errors raised deep in the tree are wrapped in [`ConvertError::Context`]
/// on the way out; [`ConvertError::kind`] always reports the innermost
/// category.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported term: {0}")]
    UnsupportedTerm(String),

    #[error("operator {0:?} not supported")]
    UnsupportedOperator(String),

    #[error("{operator}: expected {expected} operands, got {found}")]
    ArityMismatch {
        operator: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("variable {0} cannot be converted")]
    UnresolvedVariable(String),

    #[error("malformed reference {reference}: {message}")]
    MalformedReference { reference: String, message: String },

    #[error("query produced no boolean terms")]
    EmptyResult,

    #[error("{context}")]
    Context {
        context: String,
        source: Box<ConvertError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedTerm,
    UnsupportedOperator,
    ArityMismatch,
    TypeMismatch,
    UnresolvedVariable,
    MalformedReference,
    EmptyResult,
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::UnsupportedTerm(_) => ErrorKind::UnsupportedTerm,
            ConvertError::UnsupportedOperator(_) => ErrorKind::UnsupportedOperator,
            ConvertError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            ConvertError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            ConvertError::UnresolvedVariable(_) => ErrorKind::UnresolvedVariable,
            ConvertError::MalformedReference { .. } => ErrorKind::MalformedReference,
            ConvertError::EmptyResult => ErrorKind::EmptyResult,
            ConvertError::Context { source, .. } => source.kind(),
        }
    }

    pub fn malformed(reference: impl ToString, message: impl Into<String>) -> Self {
        ConvertError::MalformedReference {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    pub fn context(self, context: impl Into<String>) -> Self {
        ConvertError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub(crate) trait ResultExt<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T, ConvertError>;
}

impl<T> ResultExt<T> for Result<T, ConvertError> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T, ConvertError> {
        self.map_err(|err| err.context(f()))
    }
}
