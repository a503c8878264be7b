//! Core data types shared across the drawing, inference and scoring stages.

use serde::{Deserialize, Serialize};

/// Side of the square grid the model consumes.
pub const FEATURE_SIDE: u32 = 28;

/// Number of values in a feature vector (28x28).
pub const FEATURE_LEN: usize = (FEATURE_SIDE * FEATURE_SIDE) as usize;

/// Number of classes the digit model scores (0-9).
pub const NUM_CLASSES: usize = 10;

/// Number of ranked classes reported per prediction.
pub const TOP_K: usize = 3;

/// A point in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Raw class scores produced by one forward pass.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitVector(Vec<f32>);

impl LogitVector {
    /// Wrap raw scores, rejecting an empty output.
    pub fn new(values: Vec<f32>) -> SketchResult<Self> {
        if values.is_empty() {
            return Err(SketchError::Inference(
                "model produced an empty output tensor".to_string(),
            ));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A class index paired with its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedClass {
    pub class: usize,
    pub probability: f32,
}

/// Interpreted output of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Softmax distribution, one entry per class.
    pub probabilities: Vec<f32>,
    /// Index of the highest probability, lowest index on ties.
    pub predicted: usize,
    /// Up to [`TOP_K`] classes, descending by probability.
    pub top: Vec<RankedClass>,
}

impl RankedResult {
    /// Probability of the predicted class.
    pub fn confidence(&self) -> f32 {
        self.probabilities
            .get(self.predicted)
            .copied()
            .unwrap_or_default()
    }
}

/// What the front-end renders after a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted: usize,
    pub confidence: f32,
    pub top: Vec<RankedClass>,
    pub probabilities: Vec<f32>,
    /// Wall time spent inside the inference runtime.
    pub elapsed_ms: f64,
}

impl Prediction {
    pub fn from_ranked(ranked: RankedResult, elapsed_ms: f64) -> Self {
        Self {
            predicted: ranked.predicted,
            confidence: ranked.confidence(),
            top: ranked.top,
            probabilities: ranked.probabilities,
            elapsed_ms,
        }
    }
}

/// Input/output description of a loaded model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub input_name: String,
    pub output_name: String,
    /// Declared input dimensions; dynamic axes are reported as -1.
    pub input_shape: Vec<i64>,
    pub output_shape: Option<Vec<i64>>,
}

impl ModelInfo {
    /// Concrete input shape for a single 28x28 sample.
    ///
    /// Dynamic axes take their value from the layout matching the declared
    /// rank: NCHW `[1, 1, 28, 28]`, `[1, 28, 28]` or flat `[1, 784]`. A
    /// partly dynamic shape that still does not hold 784 values, or no shape
    /// at all, falls back to NCHW. Fully static shapes must hold 784 values.
    pub fn resolved_input_shape(&self) -> SketchResult<Vec<usize>> {
        let nchw = default_input_shape();
        if self.input_shape.is_empty() {
            return Ok(nchw);
        }

        let side = FEATURE_SIDE as usize;
        let layout: Vec<usize> = match self.input_shape.len() {
            4 => nchw.clone(),
            3 => vec![1, side, side],
            2 => vec![1, FEATURE_LEN],
            _ => Vec::new(),
        };

        let shape: Vec<usize> = self
            .input_shape
            .iter()
            .enumerate()
            .map(|(axis, &d)| {
                if d > 0 {
                    d as usize
                } else {
                    layout.get(axis).copied().unwrap_or(1)
                }
            })
            .collect();

        let elements: usize = shape.iter().product();
        if elements == FEATURE_LEN {
            return Ok(shape);
        }

        if self.input_shape.iter().any(|&d| d <= 0) {
            tracing::warn!(
                "Declared input shape {:?} does not fit a 28x28 sample; using {nchw:?}",
                self.input_shape
            );
            return Ok(nchw);
        }

        Err(SketchError::ShapeMismatch {
            model: elements,
            features: FEATURE_LEN,
        })
    }
}

fn default_input_shape() -> Vec<usize> {
    let side = FEATURE_SIDE as usize;
    vec![1, 1, side, side]
}

/// Errors that can occur in the digit-sketch library.
#[derive(thiserror::Error, Debug)]
pub enum SketchError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Input shape mismatch: model input holds {model} values, features have {features}")]
    ShapeMismatch { model: usize, features: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Gesture script error: {0}")]
    Script(#[from] serde_json::Error),
}

/// Convenience result type.
pub type SketchResult<T> = Result<T, SketchError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn info(shape: Vec<i64>) -> ModelInfo {
        ModelInfo {
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            input_shape: shape,
            output_shape: None,
        }
    }

    #[test]
    fn test_dynamic_batch_resolves_to_one() {
        let shape = info(vec![-1, 1, 28, 28]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 1, 28, 28]);
    }

    #[test]
    fn test_dynamic_spatial_axes_filled_from_nchw() {
        let shape = info(vec![-1, 1, -1, -1]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 1, 28, 28]);

        let shape = info(vec![-1, -1, -1]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 28, 28]);

        let shape = info(vec![0, -1]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 784]);
    }

    #[test]
    fn test_unusable_dynamic_shape_falls_back_to_nchw() {
        let shape = info(vec![-1, 3, -1, -1]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 1, 28, 28]);

        let shape = info(vec![-1]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 1, 28, 28]);
    }

    #[test]
    fn test_flat_input_shape_accepted() {
        let shape = info(vec![1, 784]).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 784]);
    }

    #[test]
    fn test_missing_shape_defaults_to_nchw() {
        let shape = info(Vec::new()).resolved_input_shape().unwrap();
        assert_eq!(shape, vec![1, 1, 28, 28]);
    }

    #[test]
    fn test_incompatible_shape_rejected() {
        let err = info(vec![1, 3, 224, 224]).resolved_input_shape().unwrap_err();
        assert!(matches!(
            err,
            SketchError::ShapeMismatch {
                model: 150528,
                features: 784
            }
        ));
    }

    #[test]
    fn test_empty_logits_rejected() {
        assert!(LogitVector::new(Vec::new()).is_err());
        assert_eq!(LogitVector::new(vec![0.5]).unwrap().len(), 1);
    }
}
