use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use shared::{domain::Phase, error::FailureKind, protocol::ServiceBanner};
use tokio::sync::Notify;

use super::*;
use crate::{
    error::ServiceError,
    intake::ImagePayload,
    test_support::{edible_prediction, overlay, png_bytes},
    types::{Overlay, Prediction},
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Replays queued outcomes. With a gate, each call parks until the test
/// releases it, which keeps requests observably in flight.
#[derive(Default)]
struct ScriptedService {
    predict_calls: AtomicUsize,
    visualize_calls: AtomicUsize,
    predictions: std::sync::Mutex<VecDeque<Result<Prediction, ServiceError>>>,
    overlays: std::sync::Mutex<VecDeque<Result<Overlay, ServiceError>>>,
    seen_images: std::sync::Mutex<Vec<ImagePayload>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedService {
    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    fn push_prediction(&self, outcome: Result<Prediction, ServiceError>) {
        self.predictions.lock().expect("lock").push_back(outcome);
    }

    fn push_overlay(&self, outcome: Result<Overlay, ServiceError>) {
        self.overlays.lock().expect("lock").push_back(outcome);
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ClassifierService for ScriptedService {
    async fn predict(
        &self,
        image: &ImagePayload,
        _timeout: Duration,
    ) -> Result<Prediction, ServiceError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_images.lock().expect("lock").push(image.clone());
        self.wait_for_gate().await;
        self.predictions
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::NetworkFailure("no scripted outcome".into())))
    }

    async fn visualize(
        &self,
        image: &ImagePayload,
        _timeout: Duration,
    ) -> Result<Overlay, ServiceError> {
        self.visualize_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_images.lock().expect("lock").push(image.clone());
        self.wait_for_gate().await;
        self.overlays
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::NetworkFailure("no scripted outcome".into())))
    }

    async fn health(&self, _timeout: Duration) -> Result<ServiceBanner, ServiceError> {
        Ok(ServiceBanner {
            message: "scripted".to_string(),
        })
    }
}

fn workflow_with(service: Arc<ScriptedService>, timeout: Duration) -> Workflow {
    Workflow::new(service, timeout)
}

#[tokio::test]
async fn scenario_predict_then_visualize() {
    let service = Arc::new(ScriptedService::default());
    service.push_prediction(Ok(edible_prediction()));
    service.push_overlay(Ok(overlay()));
    let workflow = workflow_with(service.clone(), TIMEOUT);

    workflow
        .select_image(png_bytes(4, 4), Some("cap.png"))
        .await
        .expect("select");
    let completion = workflow
        .submit_prediction()
        .await
        .expect("submit")
        .await
        .expect("join");
    assert_eq!(completion, Completion::Applied(Phase::Predicted));

    let session = workflow.snapshot().await;
    assert_eq!(session.prediction(), Some(&edible_prediction()));
    assert_eq!(
        crate::view::project(&session)
            .outcome
            .expect("outcome")
            .confidence_text,
        "92.00%"
    );

    let completion = workflow
        .request_visualization()
        .await
        .expect("visualize")
        .await
        .expect("join");
    assert_eq!(completion, Completion::Applied(Phase::Visualized));

    let session = workflow.snapshot().await;
    assert_eq!(session.visualization(), Some(&overlay()));
    assert_eq!(session.prediction(), Some(&edible_prediction()));

    let seen = service.seen_images.lock().expect("lock");
    assert_eq!(seen.len(), 2);
    assert!(seen[0].is_same_selection(&seen[1]));
}

#[tokio::test]
async fn rapid_actions_dispatch_a_single_call() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()));
    service.push_prediction(Ok(edible_prediction()));
    let workflow = workflow_with(service.clone(), TIMEOUT);
    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");

    let pending = workflow.submit_prediction().await.expect("first submit");
    for _ in 0..5 {
        assert_eq!(
            workflow.submit_prediction().await.err(),
            Some(WorkflowError::Busy)
        );
        assert_eq!(
            workflow.request_visualization().await.err(),
            Some(WorkflowError::Busy)
        );
    }

    gate.notify_one();
    assert_eq!(
        pending.await.expect("join"),
        Completion::Applied(Phase::Predicted)
    );
    assert_eq!(service.predict_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.visualize_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rapid_actions_while_visualizing_dispatch_a_single_call() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()));
    service.push_prediction(Ok(edible_prediction()));
    service.push_overlay(Ok(overlay()));
    let workflow = workflow_with(service.clone(), TIMEOUT);
    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");

    let predicted = workflow.submit_prediction().await.expect("submit");
    gate.notify_one();
    assert_eq!(
        predicted.await.expect("join"),
        Completion::Applied(Phase::Predicted)
    );

    let pending = workflow.request_visualization().await.expect("visualize");
    for _ in 0..5 {
        assert_eq!(
            workflow.request_visualization().await.err(),
            Some(WorkflowError::Busy)
        );
        assert_eq!(
            workflow.submit_prediction().await.err(),
            Some(WorkflowError::Busy)
        );
        assert_eq!(
            workflow.select_image(png_bytes(3, 3), None).await.err(),
            Some(WorkflowError::Busy)
        );
    }
    assert_eq!(workflow.snapshot().await.phase(), Phase::VisualizeRequested);

    gate.notify_one();
    assert_eq!(
        pending.await.expect("join"),
        Completion::Applied(Phase::Visualized)
    );
    assert_eq!(service.predict_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.visualize_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn late_overlay_after_reset_is_discarded() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()));
    service.push_prediction(Ok(edible_prediction()));
    service.push_overlay(Ok(overlay()));
    let workflow = workflow_with(service.clone(), TIMEOUT);
    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");
    let predicted = workflow.submit_prediction().await.expect("submit");
    gate.notify_one();
    predicted.await.expect("join");

    let pending = workflow.request_visualization().await.expect("visualize");
    workflow.reset().await;
    workflow
        .select_image(png_bytes(5, 5), None)
        .await
        .expect("new selection");

    gate.notify_one();
    assert_eq!(pending.await.expect("join"), Completion::Discarded);

    let session = workflow.snapshot().await;
    assert_eq!(session.phase(), Phase::Selected);
    assert!(session.prediction().is_none());
    assert!(session.visualization().is_none());
}

#[tokio::test]
async fn late_response_after_reset_is_discarded() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()));
    service.push_prediction(Ok(edible_prediction()));
    let workflow = workflow_with(service.clone(), TIMEOUT);
    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");

    let pending = workflow.submit_prediction().await.expect("submit");
    workflow.reset().await;
    workflow
        .select_image(png_bytes(5, 5), None)
        .await
        .expect("new selection");

    gate.notify_one();
    assert_eq!(pending.await.expect("join"), Completion::Discarded);

    let session = workflow.snapshot().await;
    assert_eq!(session.phase(), Phase::Selected);
    assert!(session.prediction().is_none());
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn timeout_returns_to_selected_and_retry_succeeds() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(gate.clone()));
    service.push_prediction(Ok(edible_prediction()));
    let workflow = workflow_with(service.clone(), Duration::from_millis(50));
    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");

    let completion = workflow
        .submit_prediction()
        .await
        .expect("submit")
        .await
        .expect("join");
    assert_eq!(completion, Completion::Applied(Phase::Selected));
    let session = workflow.snapshot().await;
    assert!(session.selected_image().is_some());
    assert_eq!(
        session.last_error().map(|err| err.kind),
        Some(FailureKind::Timeout)
    );

    gate.notify_one();
    let completion = workflow
        .submit_prediction()
        .await
        .expect("retry")
        .await
        .expect("join");
    assert_eq!(completion, Completion::Applied(Phase::Predicted));
    assert!(workflow.snapshot().await.last_error().is_none());
    assert_eq!(service.predict_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_visualization_preserves_prediction() {
    let service = Arc::new(ScriptedService::default());
    service.push_prediction(Ok(edible_prediction()));
    service.push_overlay(Err(ServiceError::malformed("gradcam_image is empty")));
    let workflow = workflow_with(service, TIMEOUT);
    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");
    workflow
        .submit_prediction()
        .await
        .expect("submit")
        .await
        .expect("join");

    let completion = workflow
        .request_visualization()
        .await
        .expect("visualize")
        .await
        .expect("join");
    assert_eq!(completion, Completion::Applied(Phase::Predicted));

    let session = workflow.snapshot().await;
    assert_eq!(session.prediction(), Some(&edible_prediction()));
    assert!(session.visualization().is_none());
    assert_eq!(
        session.last_error().map(|err| err.kind),
        Some(FailureKind::MalformedResponse)
    );
}

#[tokio::test]
async fn submit_without_image_never_reaches_service() {
    let service = Arc::new(ScriptedService::default());
    let workflow = workflow_with(service.clone(), TIMEOUT);

    let err = workflow.submit_prediction().await.err();
    assert!(matches!(err, Some(WorkflowError::InvalidInput(_))));
    assert_eq!(workflow.snapshot().await.phase(), Phase::Idle);
    assert_eq!(service.predict_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn subscribers_observe_transient_phases() {
    let service = Arc::new(ScriptedService::default());
    service.push_prediction(Ok(edible_prediction()));
    let workflow = workflow_with(service, TIMEOUT);
    let mut events = workflow.subscribe().await;

    workflow
        .select_image(png_bytes(2, 2), None)
        .await
        .expect("select");
    workflow
        .submit_prediction()
        .await
        .expect("submit")
        .await
        .expect("join");

    let mut phases = Vec::new();
    while let Ok(WorkflowEvent::PhaseChanged { to, .. }) = events.try_recv() {
        phases.push(to);
    }
    assert_eq!(
        phases,
        vec![Phase::Selected, Phase::Predicting, Phase::Predicted]
    );
}
