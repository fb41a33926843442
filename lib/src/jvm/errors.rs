use super::Version;
use std::fmt::{Display, Error as FmtError, Formatter};

/// Failure to build a class model out of a class file
///
/// Everything that goes wrong structurally is a [`Error::ClassFormat`]. Lower-level failures
/// (truncated payloads, out of range indices, wrong constant kinds) are mapped into that variant
/// at the point they are detected so that nothing more specific escapes the model boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Structurally invalid class file
    ClassFormat {
        class_name: Option<String>,
        message: String,
    },

    /// Class file version outside of the supported range
    UnsupportedClassVersion { class_name: String, version: Version },

    /// Input that is valid, but that this crate does not know how to handle
    NotImplemented(String),
}

impl Error {
    /// Format error that is not (yet) associated with a class
    pub fn format(message: impl Into<String>) -> Error {
        Error::ClassFormat {
            class_name: None,
            message: message.into(),
        }
    }

    /// Format error in a known class
    pub fn format_in(class_name: &str, message: impl Into<String>) -> Error {
        Error::ClassFormat {
            class_name: Some(class_name.to_owned()),
            message: message.into(),
        }
    }

    /// Attach a class name to a format error that does not have one yet
    pub fn in_class(self, name: &str) -> Error {
        match self {
            Error::ClassFormat {
                class_name: None,
                message,
            } => Error::ClassFormat {
                class_name: Some(name.to_owned()),
                message,
            },
            other => other,
        }
    }

    /// Message without the class name
    pub fn message(&self) -> String {
        match self {
            Error::ClassFormat { message, .. } => message.clone(),
            Error::UnsupportedClassVersion { version, .. } => {
                format!("Unsupported major.minor version {}", version)
            }
            Error::NotImplemented(message) => message.clone(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Error::ClassFormat {
                class_name: Some(class_name),
                message,
            } => write!(f, "{} ({})", class_name, message),
            Error::ClassFormat {
                class_name: None,
                message,
            } => f.write_str(message),
            Error::UnsupportedClassVersion { class_name, .. } => {
                write!(f, "{} ({})", class_name, self.message())
            }
            Error::NotImplemented(message) => write!(f, "not implemented: {}", message),
        }
    }
}

impl std::error::Error for Error {}

/// Payload readers only fail on truncation
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::format("Truncated class file"),
            _ => Error::format(format!("Malformed class file: {}", err)),
        }
    }
}

/// Problem in a method body that only becomes an error once something tries to use the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    pub message: String,
}

impl VerifyError {
    pub fn new(message: impl Into<String>) -> VerifyError {
        VerifyError {
            message: message.into(),
        }
    }
}

impl Display for VerifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.message)
    }
}

impl std::error::Error for VerifyError {}
