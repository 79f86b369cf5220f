//! Fixtures shared by the unit test modules.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use shared::{
    domain::{Probabilities, Verdict},
    protocol::{PredictResponse, ProbabilitiesPayload},
};

use crate::{intake::ImagePayload, types::Overlay, types::Prediction};

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([120, 90, 60]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn png_payload() -> ImagePayload {
    ImagePayload::sniff(png_bytes(4, 3)).expect("sniff png")
}

pub fn edible_response() -> PredictResponse {
    PredictResponse {
        class_label: "edible".to_string(),
        confidence: 0.92,
        probabilities: ProbabilitiesPayload {
            edible: 0.92,
            poisonous: 0.08,
        },
        entropy: 0.29,
        margin: 0.84,
        inference_time_ms: 120.0,
        note: None,
    }
}

pub fn edible_prediction() -> Prediction {
    Prediction {
        verdict: Verdict::Edible,
        confidence: 0.92,
        probabilities: Probabilities {
            edible: 0.92,
            poisonous: 0.08,
        },
        entropy: 0.29,
        margin: 0.84,
        inference_time_ms: 120,
        note: None,
    }
}

pub fn poisonous_prediction() -> Prediction {
    Prediction {
        verdict: Verdict::Poisonous,
        confidence: 0.55,
        probabilities: Probabilities {
            edible: 0.45,
            poisonous: 0.55,
        },
        entropy: 0.688139,
        margin: 0.1,
        inference_time_ms: 14,
        note: Some("Low confidence — image may be ambiguous or unclear.".to_string()),
    }
}

pub fn overlay_b64() -> String {
    STANDARD.encode(png_bytes(2, 2))
}

pub fn overlay() -> Overlay {
    Overlay::from_base64(&overlay_b64()).expect("overlay")
}
