use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    MissingPrecondition,
    MalformedState,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("{filename}: unsupported file type (allowed: {allowed})")]
    UnsupportedType { filename: String, allowed: String },
    #[error("{filename} exceeds the {limit_mb} MB size limit")]
    TooLarge {
        filename: String,
        size: u64,
        limit_mb: u64,
    },
    #[error("could not read {filename}: {message}")]
    Unreadable { filename: String, message: String },
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("cannot retry {filename}: the original file is no longer in memory, please upload it again")]
    MissingPayload { filename: String },
    #[error("{filename} cannot be {action} while {status}")]
    InvalidState {
        filename: String,
        action: &'static str,
        status: &'static str,
    },
    #[error("file is no longer tracked")]
    UnknownFile,
    #[error("stored dashboard data is malformed: {0}")]
    MalformedState(String),
}

impl ConsoleError {
    pub fn transport(operation: &'static str, err: &impl std::fmt::Display) -> Self {
        Self::Transport {
            operation,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType { .. } | Self::TooLarge { .. } | Self::Unreadable { .. } => {
                ErrorKind::Validation
            }
            Self::Transport { .. } => ErrorKind::Transport,
            Self::MissingPayload { .. } | Self::InvalidState { .. } | Self::UnknownFile => {
                ErrorKind::MissingPrecondition
            }
            Self::MalformedState(_) => ErrorKind::MalformedState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_names_the_operation() {
        let err = ConsoleError::transport("Analysis", &"file service unreachable: timed out");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.to_string(), "Analysis failed: file service unreachable: timed out");
    }

    #[test]
    fn malformed_state_is_its_own_kind() {
        let err = ConsoleError::MalformedState("expected value at line 1".to_string());
        assert_eq!(err.kind(), ErrorKind::MalformedState);
        assert!(err.to_string().contains("malformed"));
    }
}
