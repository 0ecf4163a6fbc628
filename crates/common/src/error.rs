pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Specification,
    Type,
    Unsupported,
    Index,
    Arithmetic,
    Internal,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Specification error: {0}")]
    Specification(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Index {index} out of range for {size} accumulated values")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Numeric overflow in {0}")]
    Overflow(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn specification(msg: impl Into<String>) -> Self {
        Error::Specification(msg.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Error::ParseError(msg.into())
    }

    pub fn function_not_found(name: impl Into<String>) -> Self {
        Error::FunctionNotFound(name.into())
    }

    pub fn field_not_found(name: impl Into<String>) -> Self {
        Error::FieldNotFound(name.into())
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedFeature(msg.into())
    }

    pub fn index_out_of_range(index: usize, size: usize) -> Self {
        Error::IndexOutOfRange { index, size }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        Error::Overflow(operation.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Specification(_) | Error::ParseError(_) | Error::FunctionNotFound(_) => {
                ErrorKind::Specification
            }
            Error::FieldNotFound(_) | Error::TypeMismatch { .. } => ErrorKind::Type,
            Error::UnsupportedFeature(_) => ErrorKind::Unsupported,
            Error::IndexOutOfRange { .. } => ErrorKind::Index,
            Error::DivisionByZero | Error::Overflow(_) => ErrorKind::Arithmetic,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_specification_error(&self) -> bool {
        self.kind() == ErrorKind::Specification
    }
}
