//! Backend commands queued from UI to backend worker.

use std::time::Duration;

use client_core::ServiceRequest;

pub enum BackendCommand {
    Configure {
        service_url: String,
        request_timeout: Duration,
    },
    CheckHealth,
    Predict(ServiceRequest),
    Visualize(ServiceRequest),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Configure { .. } => "configure",
            Self::CheckHealth => "check_health",
            Self::Predict(_) => "predict",
            Self::Visualize(_) => "visualize",
        }
    }
}
