//! Validated results of the two service calls.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use shared::{
    domain::{Probabilities, Verdict},
    protocol::{PredictResponse, VisualizeResponse},
};

use crate::error::ServiceError;

/// Allowed deviation of `edible + poisonous` from 1. The service rounds each
/// probability to four decimals before responding.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub verdict: Verdict,
    pub confidence: f64,
    pub probabilities: Probabilities,
    pub entropy: f64,
    pub margin: f64,
    pub inference_time_ms: u64,
    pub note: Option<String>,
}

fn unit_interval(name: &str, value: f64) -> Result<f64, ServiceError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ServiceError::malformed(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64, ServiceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ServiceError::malformed(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

impl TryFrom<PredictResponse> for Prediction {
    type Error = ServiceError;

    fn try_from(value: PredictResponse) -> Result<Self, Self::Error> {
        let verdict = Verdict::from_label(&value.class_label).ok_or_else(|| {
            ServiceError::malformed(format!("unknown class '{}'", value.class_label))
        })?;
        let confidence = unit_interval("confidence", value.confidence)?;
        let probabilities = Probabilities {
            edible: unit_interval("probabilities.edible", value.probabilities.edible)?,
            poisonous: unit_interval("probabilities.poisonous", value.probabilities.poisonous)?,
        };
        let sum = probabilities.sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ServiceError::malformed(format!(
                "probabilities must sum to 1, got {sum:.4}"
            )));
        }
        let entropy = non_negative("entropy", value.entropy)?;
        let margin = unit_interval("margin", value.margin)?;
        let inference_time_ms = non_negative("inference_time_ms", value.inference_time_ms)?;

        Ok(Self {
            verdict,
            confidence,
            probabilities,
            entropy,
            margin,
            inference_time_ms: inference_time_ms.round() as u64,
            note: value.note.filter(|note| !note.trim().is_empty()),
        })
    }
}

/// Explanation overlay returned by the visualize call.
#[derive(Clone, PartialEq, Eq)]
pub struct Overlay {
    encoded: String,
    bytes: Vec<u8>,
    format: Option<ImageFormat>,
}

impl Overlay {
    pub fn from_base64(encoded: &str) -> Result<Self, ServiceError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(ServiceError::malformed("gradcam_image is empty"));
        }
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|err| ServiceError::malformed(format!("gradcam_image is not base64: {err}")))?;
        if bytes.is_empty() {
            return Err(ServiceError::malformed("gradcam_image decodes to no bytes"));
        }
        let format = image::guess_format(&bytes).ok();
        Ok(Self {
            encoded: encoded.to_string(),
            bytes,
            format,
        })
    }

    /// The payload exactly as the service sent it.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn suggested_extension(&self) -> &'static str {
        self.format
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

impl TryFrom<VisualizeResponse> for Overlay {
    type Error = ServiceError;

    fn try_from(value: VisualizeResponse) -> Result<Self, Self::Error> {
        Self::from_base64(&value.gradcam_image)
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
