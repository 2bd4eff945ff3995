use serde::{Deserialize, Serialize};

/// Status of the submitted verification request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Pending,
    Success,
    Error(String),
}

impl RequestLifecycle {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestLifecycle::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestLifecycle::Success)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RequestLifecycle::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestLifecycle::Error(message) => Some(message),
            _ => None,
        }
    }
}
