//! Text and JSON rendering of a projected session.

use client_core::{ResultView, Tone};
use serde_json::{json, Value};
use shared::domain::Phase;

const BAR_WIDTH: usize = 30;

pub fn progress_line(phase: Phase) -> &'static str {
    match phase {
        Phase::Predicting => "⏳ Predicting…",
        Phase::VisualizeRequested => "⏳ Generating heatmap…",
        _ => "",
    }
}

fn confidence_bar(fraction: f32) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f32).round()) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Success => "success",
        Tone::Danger => "danger",
        Tone::Neutral => "neutral",
    }
}

pub fn view_text(view: &ResultView) -> String {
    let mut out = String::new();
    if let Some(caption) = &view.image_caption {
        out.push_str(&format!("Image:       {caption}\n"));
    }
    match &view.outcome {
        Some(outcome) => {
            out.push_str(&format!("Verdict:     {}\n", outcome.verdict_headline));
            out.push_str(&format!(
                "Confidence:  {} {}\n",
                confidence_bar(outcome.confidence_fraction),
                outcome.confidence_text
            ));
            out.push_str(&format!("Edible:      {}\n", outcome.edible_text));
            out.push_str(&format!("Poisonous:   {}\n", outcome.poisonous_text));
            out.push_str(&format!("Entropy:     {}\n", outcome.entropy_text));
            out.push_str(&format!("Margin:      {}\n", outcome.margin_text));
            out.push_str(&format!("Inference:   {}\n", outcome.inference_time_text));
            if let Some(note) = &outcome.note {
                out.push_str(&format!("Note:        {note}\n"));
            }
        }
        None => out.push_str(&format!("Status:      {}\n", view.status_text)),
    }
    if view.overlay_available {
        out.push_str("Heatmap:     available\n");
    }
    if let Some(error) = &view.error_text {
        out.push_str(&format!("Error:       {error}\n"));
    }
    out
}

pub fn view_json(view: &ResultView) -> Value {
    let outcome = view.outcome.as_ref().map(|outcome| {
        json!({
            "verdict": outcome.verdict_headline.to_ascii_lowercase(),
            "tone": tone_label(outcome.tone),
            "confidence": outcome.confidence_text,
            "probabilities": {
                "edible": outcome.edible_text,
                "poisonous": outcome.poisonous_text,
            },
            "entropy": outcome.entropy_text,
            "margin": outcome.margin_text,
            "inference_time": outcome.inference_time_text,
            "note": outcome.note,
        })
    });
    json!({
        "phase": view.phase,
        "image": view.image_caption,
        "result": outcome,
        "heatmap_available": view.overlay_available,
        "error": view.error_text,
    })
}
