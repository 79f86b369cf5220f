use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    Busy,
    NetworkFailure,
    Timeout,
    MalformedResponse,
}

impl FailureKind {
    /// Failures that originate at the service boundary and may be retried by
    /// repeating the same action.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::NetworkFailure | Self::Timeout | Self::MalformedResponse
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: FailureKind,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
