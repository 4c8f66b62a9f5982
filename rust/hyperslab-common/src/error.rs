use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                dim: None,
                message: message.into(),
            }
            .into(),
        )
    }

    /// Invalid argument value in a specific dimension of a multi-dimensional argument.
    pub fn invalid_dim_arg(name: impl Into<String>, dim: usize, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                dim: Some(dim),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn rank_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Error {
        Error::invalid_arg(
            name,
            format!("rank mismatch: expected {expected}, got {actual}"),
        )
    }

    pub fn unsupported_op(op: impl Into<String>, state: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnsupportedOperation {
                op: op.into(),
                state: state.into(),
            }
            .into(),
        )
    }

    pub fn corrupt_encoding(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CorruptEncoding {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn allocation_failure(context: impl Into<String>, source: TryReserveError) -> Error {
        Error(
            ErrorKind::AllocationFailure {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }

    pub fn is_unsupported_op(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnsupportedOperation { .. })
    }

    pub fn is_corrupt_encoding(&self) -> bool {
        matches!(self.kind(), ErrorKind::CorruptEncoding { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error(
        "invalid argument {name}{}: {message}",
        .dim.map(|d| format!(" (dimension {d})")).unwrap_or_default())]
    InvalidArgument {
        name: String,
        dim: Option<usize>,
        message: String,
    },

    #[error("operation {op} is not supported for {state} selection")]
    UnsupportedOperation { op: String, state: String },

    #[error("corrupt selection encoding for '{element}': {message}")]
    CorruptEncoding { element: String, message: String },

    #[error("allocation failed while building {context}")]
    AllocationFailure {
        context: String,
        source: TryReserveError,
    },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}
