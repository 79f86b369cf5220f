//! Async driver that executes the controller's service requests.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};

use crate::{
    controller::{Completion, WorkflowController, WorkflowEvent},
    error::WorkflowError,
    session::Session,
    with_deadline, ClassifierService,
};

/// Owns a [`WorkflowController`] and runs its network actions on the tokio
/// runtime. The controller lock is released before every service call and
/// re-acquired only to apply the outcome.
#[derive(Clone)]
pub struct Workflow {
    controller: Arc<Mutex<WorkflowController>>,
    service: Arc<dyn ClassifierService>,
    request_timeout: Duration,
}

impl Workflow {
    pub fn new(service: Arc<dyn ClassifierService>, request_timeout: Duration) -> Self {
        Self {
            controller: Arc::new(Mutex::new(WorkflowController::new())),
            service,
            request_timeout,
        }
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.controller.lock().await.subscribe()
    }

    pub async fn snapshot(&self) -> Session {
        self.controller.lock().await.snapshot()
    }

    pub async fn select_image(
        &self,
        bytes: Vec<u8>,
        file_name: Option<&str>,
    ) -> Result<(), WorkflowError> {
        self.controller.lock().await.select_image(bytes, file_name)
    }

    pub async fn submit_prediction(&self) -> Result<JoinHandle<Completion>, WorkflowError> {
        let request = self.controller.lock().await.submit_prediction()?;
        let controller = Arc::clone(&self.controller);
        let service = Arc::clone(&self.service);
        let timeout = self.request_timeout;
        Ok(tokio::spawn(async move {
            let outcome = with_deadline(timeout, service.predict(&request.image, timeout)).await;
            controller
                .lock()
                .await
                .complete_prediction(request.ticket, outcome)
        }))
    }

    pub async fn request_visualization(&self) -> Result<JoinHandle<Completion>, WorkflowError> {
        let request = self.controller.lock().await.request_visualization()?;
        let controller = Arc::clone(&self.controller);
        let service = Arc::clone(&self.service);
        let timeout = self.request_timeout;
        Ok(tokio::spawn(async move {
            let outcome = with_deadline(timeout, service.visualize(&request.image, timeout)).await;
            controller
                .lock()
                .await
                .complete_visualization(request.ticket, outcome)
        }))
    }

    pub async fn reset(&self) {
        self.controller.lock().await.reset();
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
