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
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(name: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: Default::default(),
            }
            .into(),
        )
    }

    pub fn unsupported(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnsupportedOperation {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn position_out_of_bounds(pos: u64, size: u64) -> Error {
        Error(ErrorKind::PositionOutOfBounds { pos, size }.into())
    }

    pub fn range_out_of_bounds(start: u64, end: u64, size: u64) -> Error {
        Error(ErrorKind::RangeOutOfBounds { start, end, size }.into())
    }

    pub fn allocation_declined(existing: usize, required: usize) -> Error {
        Error(ErrorKind::AllocationDeclined { existing, required }.into())
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
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("position {pos} is out of bounds for sequence of size {size}")]
    PositionOutOfBounds { pos: u64, size: u64 },

    #[error("range [{start}, {end}) is out of bounds for sequence of size {size}")]
    RangeOutOfBounds { start: u64, end: u64, size: u64 },

    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    #[error("store declined block of {required} bytes (currently allocated: {existing})")]
    AllocationDeclined { existing: usize, required: usize },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
