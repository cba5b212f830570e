use thiserror::Error;

/// Every failure an orchestrator can surface.
///
/// The gateway produces `Network`, `Service` and `Decode`; orchestrators add
/// `Validation` for local precondition failures; the effect runner adds `Io`
/// when a save or clipboard write fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    Validation(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("service error (status {status}): {message}")]
    Service { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Service,
    Decode,
    Io,
}

impl ConsoleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::Validation(_) => ErrorKind::Validation,
            ConsoleError::Network(_) => ErrorKind::Network,
            ConsoleError::Service { .. } => ErrorKind::Service,
            ConsoleError::Decode(_) => ErrorKind::Decode,
            ConsoleError::Io(_) => ErrorKind::Io,
        }
    }

    /// Message shown to the operator. Service errors show the service's own
    /// detail rather than the status line.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        ConsoleError::Io(err.to_string())
    }
}
