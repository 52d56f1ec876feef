use thiserror::Error;

/// Errors that can occur while driving a chat application.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutomationError {
    /// The application cannot be launched or reached at all.
    #[error("Target unavailable: {0}")]
    TargetUnavailable(String),

    /// A UI reference failed to resolve after exhausting every layout variant.
    #[error("Element unavailable: {0}")]
    ElementUnavailable(String),

    /// The scripting layer itself failed (permissions, syntax, process crash).
    #[error("Bridge failure during {intent}: {message}")]
    BridgeFailure { intent: String, message: String },

    /// Another cooperating process holds a live lock on the target.
    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    /// The overall deadline elapsed while waiting.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The caller aborted the call.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutomationError {
    /// Whether this error is an expected-absent path resolution, recoverable
    /// by trying the next layout variant.
    pub fn is_element_unavailable(&self) -> bool {
        matches!(self, AutomationError::ElementUnavailable(_))
    }

    /// Re-wrap with call context (which operation, which target) before the
    /// error surfaces at the boundary.
    pub fn with_context(self, operation: &str, target: &str) -> AutomationError {
        match self {
            AutomationError::TargetUnavailable(msg) => {
                AutomationError::TargetUnavailable(format!("{operation} on {target}: {msg}"))
            }
            AutomationError::ElementUnavailable(msg) => {
                AutomationError::ElementUnavailable(format!("{operation} on {target}: {msg}"))
            }
            AutomationError::ResourceBusy(msg) => {
                AutomationError::ResourceBusy(format!("{operation} on {target}: {msg}"))
            }
            AutomationError::Timeout(msg) => {
                AutomationError::Timeout(format!("{operation} on {target}: {msg}"))
            }
            AutomationError::Cancelled(msg) => {
                AutomationError::Cancelled(format!("{operation} on {target}: {msg}"))
            }
            other => other,
        }
    }
}
