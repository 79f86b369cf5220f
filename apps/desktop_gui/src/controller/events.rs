//! Backend-to-UI events and error modeling for the desktop GUI.

use client_core::{Overlay, Prediction, RequestTicket, ServiceError, WorkflowError};
use shared::error::FailureKind;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    ServiceConfigured {
        service_url: String,
    },
    PredictionFinished {
        ticket: RequestTicket,
        outcome: Result<Prediction, ServiceError>,
    },
    VisualizationFinished {
        ticket: RequestTicket,
        outcome: Result<Overlay, ServiceError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Input,
    Busy,
    Transport,
    Timeout,
    Protocol,
    Startup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Selection,
    Predict,
    Visualize,
    HealthCheck,
    Export,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    kind: Option<FailureKind>,
    message: String,
}

impl UiError {
    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            kind: None,
            message: message.into(),
        }
    }

    fn with_kind(mut self, kind: Option<FailureKind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn from_workflow(context: UiErrorContext, err: &WorkflowError) -> Self {
        let category = match err.kind() {
            Some(FailureKind::Busy) => UiErrorCategory::Busy,
            _ => UiErrorCategory::Input,
        };
        Self::new(category, context, err.to_string()).with_kind(err.kind())
    }

    pub fn from_service(context: UiErrorContext, err: &ServiceError) -> Self {
        let category = match err.kind() {
            FailureKind::Timeout => UiErrorCategory::Timeout,
            FailureKind::MalformedResponse => UiErrorCategory::Protocol,
            FailureKind::InvalidInput | FailureKind::Busy => UiErrorCategory::Input,
            FailureKind::NetworkFailure => UiErrorCategory::Transport,
        };
        Self::new(category, context, err.to_string()).with_kind(Some(err.kind()))
    }

    /// Busy rejections are expected while a request is pending and are not
    /// shown as failures.
    pub fn is_quiet(&self) -> bool {
        self.category == UiErrorCategory::Busy
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_some_and(FailureKind::is_retryable)
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
