//! Pure projection from [`Session`] to what a render surface displays.

use shared::domain::{Phase, Verdict};

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeView {
    pub verdict_headline: String,
    pub tone: Tone,
    pub confidence_fraction: f32,
    pub confidence_text: String,
    pub edible_text: String,
    pub poisonous_text: String,
    pub entropy_text: String,
    pub margin_text: String,
    pub inference_time_text: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub phase: Phase,
    pub status_text: &'static str,
    pub busy_label: Option<&'static str>,
    pub can_select: bool,
    pub can_submit: bool,
    pub can_visualize: bool,
    pub can_reset: bool,
    pub image_caption: Option<String>,
    pub outcome: Option<OutcomeView>,
    pub overlay_available: bool,
    pub error_text: Option<String>,
}

pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn status_text(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Select a mushroom image to classify",
        Phase::Selected => "Ready to predict",
        Phase::Predicting => "Predicting…",
        Phase::Predicted => "Prediction ready",
        Phase::VisualizeRequested => "Generating heatmap…",
        Phase::Visualized => "Heatmap ready",
        Phase::Failed => "Something went wrong; reset to start over",
    }
}

pub fn project(session: &Session) -> ResultView {
    let phase = session.phase();
    let busy_label = match phase {
        Phase::Predicting => Some("Predicting…"),
        Phase::VisualizeRequested => Some("Generating heatmap…"),
        _ => None,
    };

    let image_caption = session.selected_image().map(|image| {
        let preview = image.preview();
        match preview.dimensions {
            Some((width, height)) => format!(
                "{} · {} · {width}×{height}",
                image.file_name(),
                preview.mime_type
            ),
            None => format!("{} · {}", image.file_name(), preview.mime_type),
        }
    });

    let outcome = session.prediction().map(|prediction| OutcomeView {
        verdict_headline: prediction.verdict.as_str().to_ascii_uppercase(),
        tone: match prediction.verdict {
            Verdict::Edible => Tone::Success,
            Verdict::Poisonous => Tone::Danger,
        },
        confidence_fraction: prediction.confidence as f32,
        confidence_text: percent(prediction.confidence),
        edible_text: percent(prediction.probabilities.edible),
        poisonous_text: percent(prediction.probabilities.poisonous),
        entropy_text: format!("{:.4}", prediction.entropy),
        margin_text: format!("{:.4}", prediction.margin),
        inference_time_text: format!("{} ms", prediction.inference_time_ms),
        note: prediction.note.clone(),
    });

    ResultView {
        phase,
        status_text: status_text(phase),
        busy_label,
        can_select: session.accepts_selection(),
        can_submit: session.accepts_submit(),
        can_visualize: session.accepts_visualize(),
        can_reset: session.accepts_reset(),
        image_caption,
        outcome,
        overlay_available: session.visualization().is_some(),
        error_text: session.last_error().map(|err| err.message.clone()),
    }
}

impl ResultView {
    pub fn tone(&self) -> Tone {
        self.outcome
            .as_ref()
            .map(|outcome| outcome.tone)
            .unwrap_or(Tone::Neutral)
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
