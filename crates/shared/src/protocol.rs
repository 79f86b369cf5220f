use serde::{Deserialize, Serialize};

/// Multipart field name carrying the image bytes on both endpoints.
pub const UPLOAD_FIELD: &str = "file";
pub const PREDICT_PATH: &str = "predict";
pub const VISUALIZE_PATH: &str = "visualize";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f64,
    pub probabilities: ProbabilitiesPayload,
    pub entropy: f64,
    pub margin: f64,
    pub inference_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilitiesPayload {
    pub edible: f64,
    pub poisonous: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeResponse {
    pub gradcam_image: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBanner {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_response_reads_class_and_optional_note() {
        let body = r#"{
            "class": "poisonous",
            "confidence": 0.55,
            "probabilities": {"edible": 0.45, "poisonous": 0.55},
            "entropy": 0.688139,
            "margin": 0.1,
            "inference_time_ms": 14.27,
            "note": "Low confidence"
        }"#;
        let parsed: PredictResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.class_label, "poisonous");
        assert_eq!(parsed.note.as_deref(), Some("Low confidence"));
        assert!((parsed.inference_time_ms - 14.27).abs() < f64::EPSILON);
    }

    #[test]
    fn predict_response_requires_metrics() {
        let body = r#"{"class": "edible", "confidence": 0.9}"#;
        assert!(serde_json::from_str::<PredictResponse>(body).is_err());
    }

    #[test]
    fn predict_response_serializes_class_key() {
        let response = PredictResponse {
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
        };
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["class"], "edible");
        assert!(value.get("note").is_none());
    }
}
