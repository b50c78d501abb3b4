use std::error::Error as StdError;
use std::fmt;
use uuid::Uuid;

/// Failures the lifecycle resolves internally. They never reach the
/// callers of lifecycle operations: each one is logged and surfaces only
/// as a `None` return value or as the error argument of an after-hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Storage holds nothing of the expected kind under this uuid.
    NotFound {
        expected: &'static str,
        uuid: Uuid,
    },
    NoActiveContainer,
    NoActiveTest,
    NoActiveStep,
    NoActiveExecutionContext,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound { expected, uuid } => {
                write!(f, "{} (UUID: {}) is not found in storage", expected, uuid)
            }
            Error::NoActiveContainer => f.write_str("no container is active on the current thread"),
            Error::NoActiveTest => {
                f.write_str("no test or fixture is running on the current thread")
            }
            Error::NoActiveStep => f.write_str("no step is running on the current thread"),
            Error::NoActiveExecutionContext => {
                f.write_str("nothing is running on the current thread")
            }
        }
    }
}

impl StdError for Error {}
