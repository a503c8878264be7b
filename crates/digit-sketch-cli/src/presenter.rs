//! Rendering of predictions and model status for the terminal.

use chrono::{DateTime, Utc};
use serde::Serialize;

use digit_sketch::{FeatureVector, ModelInfo, ModelStatus, Prediction, FEATURE_SIDE};

use crate::types::{CliError, CliResult};

/// Width of a full confidence bar in characters.
const BAR_WIDTH: usize = 30;

/// Intensity ramp for the feature preview, dark to bright.
const PREVIEW_RAMP: &[u8] = b" .:-=+*#%@";

/// Prompt shown while the pad is empty or after a clear.
pub const DRAW_PROMPT: &str = "Draw a digit to begin";

pub const LOADING: &str = "Loading model...";

pub const PREDICTING: &str = "Recognizing...";

/// A prediction stamped with where and when it was made.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport<'a> {
    pub source: &'a str,
    pub predicted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub prediction: &'a Prediction,
}

/// Human-readable result with one confidence bar per ranked class.
pub fn render_text(prediction: &Prediction) -> String {
    let mut out = String::new();
    out.push_str(&format!("Predicted digit: {}\n", prediction.predicted));
    out.push_str(&format!(
        "Confidence: {:.1}%\n",
        prediction.confidence * 100.0
    ));
    for ranked in &prediction.top {
        out.push_str(&format!(
            "  {} {} {:>5.1}%\n",
            ranked.class,
            bar(ranked.probability),
            ranked.probability * 100.0
        ));
    }
    out
}

/// JSON report for scripting.
pub fn render_json(prediction: &Prediction, source: &str) -> serde_json::Result<String> {
    let report = PredictionReport {
        source,
        predicted_at: Utc::now(),
        prediction,
    };
    serde_json::to_string_pretty(&report)
}

/// One-line description of the model slot.
pub fn status_line(status: &ModelStatus) -> String {
    match status {
        ModelStatus::NotLoaded => "Model not loaded".to_string(),
        ModelStatus::Ready { info } => format!(
            "Model loaded \u{2713} (input '{}' {:?}, output '{}')",
            info.input_name, info.input_shape, info.output_name
        ),
        ModelStatus::Failed { reason } => format!("Model error: {reason}"),
    }
}

/// Line reported when a model load finishes.
///
/// Load errors are already recorded in `status`; anything else (a worker that
/// died) is not, so it is reported directly.
pub fn load_outcome_line(outcome: &CliResult<ModelInfo>, status: &ModelStatus) -> String {
    match outcome {
        Ok(_) | Err(CliError::Sketch(_)) => status_line(status),
        Err(e) => format!("Model error: {e}"),
    }
}

pub fn prediction_error_line(err: &dyn std::fmt::Display) -> String {
    format!("Prediction error: {err}")
}

/// 28x28 ASCII view of what the model will see.
pub fn render_preview(features: &FeatureVector) -> String {
    let side = FEATURE_SIDE as usize;
    let mut out = String::with_capacity((side * 2 + 3) * (side + 2));
    let border = format!("+{}+\n", "-".repeat(side * 2));
    out.push_str(&border);
    for row in 0..side {
        out.push('|');
        for col in 0..side {
            let c = shade(features.at(row, col));
            out.push(c);
            out.push(c);
        }
        out.push_str("|\n");
    }
    out.push_str(&border);
    out
}

fn bar(probability: f32) -> String {
    let filled = ((probability.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(BAR_WIDTH - filled)
    )
}

fn shade(value: f32) -> char {
    let last = PREVIEW_RAMP.len() - 1;
    let idx = (value.clamp(0.0, 1.0) * last as f32).round() as usize;
    PREVIEW_RAMP[idx.min(last)] as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use digit_sketch::{RankedClass, FEATURE_LEN};

    fn prediction() -> Prediction {
        Prediction {
            predicted: 7,
            confidence: 0.934,
            top: vec![
                RankedClass {
                    class: 7,
                    probability: 0.934,
                },
                RankedClass {
                    class: 1,
                    probability: 0.041,
                },
                RankedClass {
                    class: 9,
                    probability: 0.02,
                },
            ],
            probabilities: vec![0.0005; 10],
            elapsed_ms: 1.5,
        }
    }

    #[test]
    fn test_text_lists_ranked_classes() {
        let text = render_text(&prediction());
        assert!(text.starts_with("Predicted digit: 7\n"));
        assert!(text.contains("Confidence: 93.4%"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].trim_start().starts_with('7'));
        assert!(lines[2].ends_with("93.4%"));
        assert!(lines[3].ends_with("4.1%"));
    }

    #[test]
    fn test_bar_lengths() {
        assert_eq!(bar(1.0).chars().filter(|&c| c == '\u{2588}').count(), BAR_WIDTH);
        assert_eq!(bar(0.0).chars().filter(|&c| c == '\u{2588}').count(), 0);
        assert_eq!(bar(0.5).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn test_json_report_fields() {
        let json = render_json(&prediction(), "digit.png").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "digit.png");
        assert_eq!(value["predicted"], 7);
        assert_eq!(value["top"][1]["class"], 1);
        assert!(value["predicted_at"].is_string());
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status_line(&ModelStatus::NotLoaded), "Model not loaded");
        let ready = ModelStatus::Ready {
            info: ModelInfo {
                input_name: "input".to_string(),
                output_name: "logits".to_string(),
                input_shape: vec![1, 1, 28, 28],
                output_shape: None,
            },
        };
        assert!(status_line(&ready).contains("'input'"));
        let failed = ModelStatus::Failed {
            reason: "file not found".to_string(),
        };
        assert_eq!(status_line(&failed), "Model error: file not found");

        let err = digit_sketch::SketchError::Inference("bad output".to_string());
        assert!(prediction_error_line(&err).starts_with("Prediction error: "));
    }

    #[tokio::test]
    async fn test_load_outcome_reports_worker_failure() {
        let join_err = tokio::spawn(async { panic!("worker died") })
            .await
            .unwrap_err();
        let outcome: CliResult<ModelInfo> = Err(CliError::Join(join_err));
        let line = load_outcome_line(&outcome, &ModelStatus::NotLoaded);
        assert!(line.starts_with("Model error: Background task failed"));

        let failed = ModelStatus::Failed {
            reason: "file not found".to_string(),
        };
        let outcome: CliResult<ModelInfo> = Err(CliError::Sketch(
            digit_sketch::SketchError::ModelLoad("file not found".to_string()),
        ));
        assert_eq!(
            load_outcome_line(&outcome, &failed),
            "Model error: file not found"
        );
    }

    #[test]
    fn test_preview_dimensions() {
        let features = FeatureVector::from_values(vec![1.0; FEATURE_LEN]).unwrap();
        let preview = render_preview(&features);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 30);
        assert_eq!(lines[1], format!("|{}|", "@".repeat(56)));
    }
}
