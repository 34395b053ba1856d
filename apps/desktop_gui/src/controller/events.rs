//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ConsoleError, ErrorKind, UploadEvent};
use storage::SnapshotLoad;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    Upload(UploadEvent),
    SnapshotLoaded(SnapshotLoad),
    SnapshotSaved,
    SnapshotCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    Dashboard,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("unsupported")
            || message_lower.contains("size limit")
            || message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("sqlite")
            || message_lower.contains("session store")
            || message_lower.contains("database")
            || message_lower.contains("failed to copy")
            || message_lower.contains("download dir")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("unreachable")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
            || message_lower.contains("rejected")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_console(context: UiErrorContext, err: &ConsoleError) -> Self {
        let category = match err.kind() {
            ErrorKind::Validation | ErrorKind::MissingPrecondition => UiErrorCategory::Validation,
            ErrorKind::Transport => UiErrorCategory::Transport,
            ErrorKind::MalformedState => UiErrorCategory::Storage,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_service_failures_as_transport() {
        let err = UiError::from_message(
            UiErrorContext::Upload,
            "file service unreachable: error sending request: connection refused",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::Upload);
    }

    #[test]
    fn classifies_backend_command_processor_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected (possible startup/runtime failure)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
    }

    #[test]
    fn session_store_failures_are_storage_errors() {
        let err = UiError::from_message(
            UiErrorContext::BackendStartup,
            "failed to open session store sqlite::memory:",
        );
        assert_eq!(err.category(), UiErrorCategory::Storage);
        assert_eq!(err_label(err.category()), "Storage");
    }

    #[test]
    fn console_errors_map_by_kind() {
        let err = ConsoleError::MissingPayload {
            filename: "q1.csv".into(),
        };
        let ui = UiError::from_console(UiErrorContext::Upload, &err);
        assert_eq!(ui.category(), UiErrorCategory::Validation);
        assert_eq!(ui.message(), err.to_string());
    }

    #[test]
    fn failed_upload_events_carry_transport_errors() {
        let event = UploadEvent::AnalyzeAllFailed {
            optimistic: Vec::new(),
            error: ConsoleError::transport("Analysis", &"file service rejected the request: busy"),
        };
        let err = event.error().expect("failure event");
        let ui = UiError::from_console(UiErrorContext::Upload, err);
        assert_eq!(ui.category(), UiErrorCategory::Transport);
        assert_eq!(err_label(ui.category()), "Connection");

        assert!(UploadEvent::Listed(Vec::new()).error().is_none());
    }
}
