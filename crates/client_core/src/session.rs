use shared::{
    domain::{Generation, Phase},
    error::ErrorDescriptor,
};

use crate::{
    intake::ImagePayload,
    types::{Overlay, Prediction},
};

/// A successful prediction plus the overlay explaining it, once requested.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub prediction: Prediction,
    visualization: Option<Overlay>,
}

impl PredictionRecord {
    pub fn new(prediction: Prediction) -> Self {
        Self {
            prediction,
            visualization: None,
        }
    }

    pub fn visualization(&self) -> Option<&Overlay> {
        self.visualization.as_ref()
    }

    pub(crate) fn attach_visualization(&mut self, overlay: Overlay) {
        self.visualization = Some(overlay);
    }
}

/// Transient state of one interaction. Only the controller mutates it; render
/// surfaces read clones.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) generation: Generation,
    pub(crate) phase: Phase,
    pub(crate) selected_image: Option<ImagePayload>,
    pub(crate) result: Option<PredictionRecord>,
    pub(crate) last_error: Option<ErrorDescriptor>,
}

impl Session {
    pub(crate) fn empty(generation: Generation) -> Self {
        Self {
            generation,
            phase: Phase::Idle,
            selected_image: None,
            result: None,
            last_error: None,
        }
    }

    pub(crate) fn with_image(generation: Generation, image: ImagePayload) -> Self {
        Self {
            generation,
            phase: Phase::Selected,
            selected_image: Some(image),
            result: None,
            last_error: None,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_image(&self) -> Option<&ImagePayload> {
        self.selected_image.as_ref()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.result.as_ref().map(|record| &record.prediction)
    }

    pub fn visualization(&self) -> Option<&Overlay> {
        self.result.as_ref().and_then(PredictionRecord::visualization)
    }

    pub fn last_error(&self) -> Option<&ErrorDescriptor> {
        self.last_error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_image.is_none() && self.result.is_none() && self.last_error.is_none()
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_in_flight()
    }

    pub fn accepts_selection(&self) -> bool {
        !self.is_busy()
    }

    pub fn accepts_submit(&self) -> bool {
        self.selected_image.is_some()
            && matches!(
                self.phase,
                Phase::Selected | Phase::Predicted | Phase::Visualized
            )
    }

    pub fn accepts_visualize(&self) -> bool {
        self.phase == Phase::Predicted && self.selected_image.is_some() && self.result.is_some()
    }

    pub fn accepts_reset(&self) -> bool {
        self.phase != Phase::Idle || !self.is_empty()
    }
}
