use std::time::Duration;

use shared::{
    domain::Phase,
    error::{ErrorDescriptor, FailureKind},
};
use thiserror::Error;

/// Failure of a single call against the classification service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("request timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid service endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NetworkFailure(_) | Self::InvalidEndpoint { .. } => FailureKind::NetworkFailure,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::MalformedResponse(_) | Self::Status { .. } => FailureKind::MalformedResponse,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { after: timeout }
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::NetworkFailure(err.to_string())
        }
    }
}

impl From<&ServiceError> for ErrorDescriptor {
    fn from(value: &ServiceError) -> Self {
        ErrorDescriptor::new(value.kind(), value.to_string())
    }
}

/// Local rejection of a user action. None of these reach the network layer
/// and none of them are recorded as the session's last error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("a service request is already in flight")]
    Busy,
    #[error("action is not available while {phase}")]
    NotAvailable { phase: Phase },
}

impl WorkflowError {
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::InvalidInput(_) => Some(FailureKind::InvalidInput),
            Self::Busy => Some(FailureKind::Busy),
            Self::NotAvailable { .. } => None,
        }
    }
}
