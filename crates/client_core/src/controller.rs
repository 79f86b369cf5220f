//! Interaction state machine.
//!
//! The controller never performs I/O. Network actions hand back a
//! [`ServiceRequest`]; whoever executes it reports the outcome through
//! [`WorkflowController::complete_prediction`] or
//! [`WorkflowController::complete_visualization`]. Outcomes are applied only when
//! their ticket still matches the request in flight, so responses that target a
//! reset or replaced session are dropped.

use shared::{
    domain::{Generation, Phase, RequestId, RequestKind},
    error::ErrorDescriptor,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::{ServiceError, WorkflowError},
    intake::ImagePayload,
    session::{PredictionRecord, Session},
    types::{Overlay, Prediction},
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub generation: Generation,
    pub request_id: RequestId,
    pub kind: RequestKind,
}

/// A network call the controller has committed to. `image` is the selection
/// made for the current session, never a re-derived copy.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub ticket: RequestTicket,
    pub image: ImagePayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(Phase),
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    PhaseChanged {
        generation: Generation,
        from: Phase,
        to: Phase,
    },
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: RequestTicket,
    resume_phase: Phase,
}

pub struct WorkflowController {
    session: Session,
    in_flight: Option<InFlight>,
    next_request_id: RequestId,
    events: broadcast::Sender<WorkflowEvent>,
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowController {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: Session::empty(Generation::default()),
            in_flight: None,
            next_request_id: RequestId::default(),
            events,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> Session {
        self.session.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight.map(|pending| pending.ticket)
    }

    /// Starts a fresh session around `bytes`. On rejection the current session is
    /// left untouched.
    pub fn select_image(
        &mut self,
        bytes: impl Into<Vec<u8>>,
        file_name: Option<&str>,
    ) -> Result<(), WorkflowError> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::Busy);
        }
        let mut image = ImagePayload::sniff(bytes)?;
        if let Some(file_name) = file_name {
            image = image.with_file_name(file_name);
        }

        let generation = self.session.generation.next();
        info!(
            generation = %generation,
            file_name = image.file_name(),
            bytes = image.len(),
            mime_type = image.mime_type(),
            "image selected"
        );
        let from = self.session.phase;
        self.session = Session::with_image(generation, image);
        self.emit(from, Phase::Selected);
        Ok(())
    }

    pub fn submit_prediction(&mut self) -> Result<ServiceRequest, WorkflowError> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::Busy);
        }
        let Some(image) = self.session.selected_image.clone() else {
            return Err(WorkflowError::InvalidInput("no image selected".to_string()));
        };
        if !self.session.accepts_submit() {
            return Err(WorkflowError::NotAvailable {
                phase: self.session.phase,
            });
        }
        Ok(self.dispatch(RequestKind::Predict, Phase::Predicting, image))
    }

    pub fn request_visualization(&mut self) -> Result<ServiceRequest, WorkflowError> {
        if self.in_flight.is_some() {
            return Err(WorkflowError::Busy);
        }
        if !self.session.accepts_visualize() {
            return Err(WorkflowError::NotAvailable {
                phase: self.session.phase,
            });
        }
        let Some(image) = self.session.selected_image.clone() else {
            return Err(WorkflowError::InvalidInput("no image selected".to_string()));
        };
        Ok(self.dispatch(RequestKind::Visualize, Phase::VisualizeRequested, image))
    }

    /// Clears the whole session. Any request still in flight is orphaned and its
    /// outcome will be discarded on arrival.
    pub fn reset(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            debug!(
                request_id = %pending.ticket.request_id,
                kind = pending.ticket.kind.as_str(),
                "orphaning in-flight request on reset"
            );
        }
        let generation = self.session.generation.next();
        let from = self.session.phase;
        self.session = Session::empty(generation);
        info!(generation = %generation, "session reset");
        self.emit(from, Phase::Idle);
    }

    pub fn complete_prediction(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<Prediction, ServiceError>,
    ) -> Completion {
        let Some(pending) = self.take_matching(ticket, RequestKind::Predict) else {
            return Completion::Discarded;
        };
        let next = match outcome {
            Ok(prediction) => {
                info!(
                    generation = %ticket.generation,
                    request_id = %ticket.request_id,
                    verdict = prediction.verdict.as_str(),
                    confidence = prediction.confidence,
                    "prediction received"
                );
                self.session.result = Some(PredictionRecord::new(prediction));
                Phase::Predicted
            }
            Err(err) => {
                warn!(
                    generation = %ticket.generation,
                    request_id = %ticket.request_id,
                    "prediction failed: {err}"
                );
                self.session.last_error = Some(ErrorDescriptor::from(&err));
                pending.resume_phase
            }
        };
        self.transition(next);
        Completion::Applied(next)
    }

    pub fn complete_visualization(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<Overlay, ServiceError>,
    ) -> Completion {
        let Some(pending) = self.take_matching(ticket, RequestKind::Visualize) else {
            return Completion::Discarded;
        };
        let next = match (outcome, self.session.result.as_mut()) {
            (Ok(overlay), Some(record)) => {
                info!(
                    generation = %ticket.generation,
                    request_id = %ticket.request_id,
                    bytes = overlay.bytes().len(),
                    "visualization received"
                );
                record.attach_visualization(overlay);
                Phase::Visualized
            }
            (Ok(_), None) => {
                warn!(
                    generation = %ticket.generation,
                    "visualization arrived without a prediction to attach to"
                );
                pending.resume_phase
            }
            (Err(err), _) => {
                warn!(
                    generation = %ticket.generation,
                    request_id = %ticket.request_id,
                    "visualization failed: {err}"
                );
                self.session.last_error = Some(ErrorDescriptor::from(&err));
                pending.resume_phase
            }
        };
        self.transition(next);
        Completion::Applied(next)
    }

    fn dispatch(&mut self, kind: RequestKind, phase: Phase, image: ImagePayload) -> ServiceRequest {
        self.next_request_id = self.next_request_id.next();
        let ticket = RequestTicket {
            generation: self.session.generation,
            request_id: self.next_request_id,
            kind,
        };
        self.in_flight = Some(InFlight {
            ticket,
            resume_phase: self.session.phase,
        });
        self.session.last_error = None;
        info!(
            generation = %ticket.generation,
            request_id = %ticket.request_id,
            kind = kind.as_str(),
            "dispatching service request"
        );
        self.transition(phase);
        ServiceRequest { ticket, image }
    }

    fn take_matching(&mut self, ticket: RequestTicket, kind: RequestKind) -> Option<InFlight> {
        match self.in_flight {
            Some(pending) if pending.ticket == ticket && ticket.kind == kind => {
                self.in_flight = None;
                Some(pending)
            }
            _ => {
                debug!(
                    generation = %ticket.generation,
                    current_generation = %self.session.generation,
                    request_id = %ticket.request_id,
                    kind = ticket.kind.as_str(),
                    "discarding stale service response"
                );
                None
            }
        }
    }

    fn transition(&mut self, to: Phase) {
        let from = self.session.phase;
        self.session.phase = to;
        self.emit(from, to);
    }

    fn emit(&self, from: Phase, to: Phase) {
        debug!(generation = %self.session.generation, %from, %to, "phase changed");
        let _ = self.events.send(WorkflowEvent::PhaseChanged {
            generation: self.session.generation,
            from,
            to,
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
