//! Owning context for one drawing pad: canvas state and the model slot.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::features::{extract_features, FeatureVector};
use crate::inference::{InferenceBackend, OnnxClassifier};
use crate::interpret::interpret;
use crate::pen::Pen;
use crate::surface::{StrokeSurface, SurfaceConfig};
use crate::types::{ModelInfo, Point, Prediction, SketchError, SketchResult, NUM_CLASSES};

/// The drawing surface together with the pen that strokes it.
#[derive(Debug, Clone)]
pub struct Canvas {
    surface: StrokeSurface,
    pen: Pen,
}

impl Canvas {
    /// Create a cleared canvas.
    pub fn new(config: SurfaceConfig) -> SketchResult<Self> {
        Ok(Self {
            surface: StrokeSurface::new(config)?,
            pen: Pen::new(),
        })
    }

    /// Use an existing surface, e.g. a drawing loaded from disk.
    pub fn from_surface(surface: StrokeSurface) -> Self {
        Self {
            surface,
            pen: Pen::new(),
        }
    }

    pub fn surface(&self) -> &StrokeSurface {
        &self.surface
    }

    pub fn pen(&self) -> &Pen {
        &self.pen
    }

    pub fn start_stroke(&mut self, at: Point) {
        self.pen.start(at);
    }

    pub fn continue_stroke(&mut self, to: Point) {
        self.pen.move_to(&mut self.surface, to);
    }

    pub fn stop_stroke(&mut self) {
        self.pen.stop();
    }

    /// Clear the surface and drop any stroke in progress.
    pub fn clear(&mut self) {
        self.pen.stop();
        self.surface.reset();
    }

    /// Snapshot the current drawing as model input.
    pub fn features(&self) -> FeatureVector {
        extract_features(&self.surface)
    }
}

/// Where the model slot stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    NotLoaded,
    Ready { info: ModelInfo },
    Failed { reason: String },
}

enum ModelSlot {
    NotLoaded,
    Ready(Box<dyn InferenceBackend>),
    Failed(String),
}

/// Holds at most one inference backend and turns features into predictions.
pub struct Classifier {
    slot: ModelSlot,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("status", &self.status())
            .finish()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            slot: ModelSlot::NotLoaded,
        }
    }

    /// Load an ONNX model, replacing whatever was there.
    ///
    /// On failure the previous backend is dropped and predictions stay
    /// disabled until a later load or attach succeeds.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> SketchResult<ModelInfo> {
        match OnnxClassifier::load(path) {
            Ok(model) => {
                let info = model.info().clone();
                self.slot = ModelSlot::Ready(Box::new(model));
                Ok(info)
            }
            Err(e) => {
                tracing::warn!("Model load failed: {e}");
                self.slot = ModelSlot::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Install an already-constructed backend.
    pub fn attach(&mut self, backend: Box<dyn InferenceBackend>) {
        tracing::info!("Attached backend for input '{}'", backend.info().input_name);
        self.slot = ModelSlot::Ready(backend);
    }

    pub fn status(&self) -> ModelStatus {
        match &self.slot {
            ModelSlot::NotLoaded => ModelStatus::NotLoaded,
            ModelSlot::Ready(backend) => ModelStatus::Ready {
                info: backend.info().clone(),
            },
            ModelSlot::Failed(reason) => ModelStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, ModelSlot::Ready(_))
    }

    /// Run one inference and interpret the scores.
    ///
    /// Runtime errors are returned as-is and leave the backend in place.
    pub fn classify(&mut self, features: &FeatureVector) -> SketchResult<Prediction> {
        let backend = match &mut self.slot {
            ModelSlot::Ready(backend) => backend,
            ModelSlot::NotLoaded => {
                return Err(SketchError::ModelNotLoaded(
                    "no model has been loaded".to_string(),
                ))
            }
            ModelSlot::Failed(reason) => {
                return Err(SketchError::ModelNotLoaded(format!(
                    "last load failed: {reason}"
                )))
            }
        };

        let started = Instant::now();
        let logits = backend.infer(features)?;
        if logits.len() != NUM_CLASSES {
            return Err(SketchError::Inference(format!(
                "model produced {} scores, expected {NUM_CLASSES}",
                logits.len()
            )));
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let prediction = Prediction::from_ranked(interpret(&logits), elapsed_ms);
        tracing::info!(
            "Predicted digit {} ({:.1}%)",
            prediction.predicted,
            prediction.confidence * 100.0
        );
        Ok(prediction)
    }
}

/// A canvas and a classifier driven by one caller.
#[derive(Debug)]
pub struct DigitPad {
    pub canvas: Canvas,
    pub classifier: Classifier,
}

impl DigitPad {
    pub fn new(config: SurfaceConfig) -> SketchResult<Self> {
        Ok(Self {
            canvas: Canvas::new(config)?,
            classifier: Classifier::new(),
        })
    }

    /// Classify the current drawing.
    pub fn predict(&mut self) -> SketchResult<Prediction> {
        let features = self.canvas.features();
        self.classifier.classify(&features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogitVector, FEATURE_LEN};

    struct FixedLogits {
        info: ModelInfo,
        logits: Vec<f32>,
        fail: bool,
    }

    impl FixedLogits {
        fn new(logits: Vec<f32>) -> Self {
            Self {
                info: ModelInfo {
                    input_name: "input".to_string(),
                    output_name: "logits".to_string(),
                    input_shape: vec![1, 1, 28, 28],
                    output_shape: Some(vec![1, 10]),
                },
                logits,
                fail: false,
            }
        }
    }

    impl InferenceBackend for FixedLogits {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn infer(&mut self, features: &FeatureVector) -> SketchResult<LogitVector> {
            assert_eq!(features.len(), FEATURE_LEN);
            if self.fail {
                return Err(SketchError::Inference("shape mismatch".to_string()));
            }
            LogitVector::new(self.logits.clone())
        }
    }

    #[test]
    fn test_predict_without_model() {
        let mut pad = DigitPad::new(SurfaceConfig::default()).unwrap();
        let err = pad.predict().unwrap_err();
        assert!(matches!(err, SketchError::ModelNotLoaded(_)));
        assert_eq!(pad.classifier.status(), ModelStatus::NotLoaded);
    }

    #[test]
    fn test_failed_load_disables_prediction_but_not_drawing() {
        let mut pad = DigitPad::new(SurfaceConfig::default()).unwrap();
        assert!(pad.classifier.load_model("/nonexistent/model.onnx").is_err());
        assert!(matches!(
            pad.classifier.status(),
            ModelStatus::Failed { .. }
        ));
        assert!(matches!(
            pad.predict().unwrap_err(),
            SketchError::ModelNotLoaded(_)
        ));

        pad.canvas.start_stroke(Point::new(10.0, 10.0));
        pad.canvas.continue_stroke(Point::new(100.0, 100.0));
        assert!(!pad.canvas.surface().is_blank());

        let mut logits = vec![0.0; 10];
        logits[7] = 4.0;
        pad.classifier.attach(Box::new(FixedLogits::new(logits)));
        assert_eq!(pad.predict().unwrap().predicted, 7);
    }

    #[test]
    fn test_inference_error_keeps_backend() {
        let mut backend = FixedLogits::new(vec![0.0; 10]);
        backend.fail = true;
        let mut classifier = Classifier::new();
        classifier.attach(Box::new(backend));

        let features = FeatureVector::from_values(vec![0.0; FEATURE_LEN]).unwrap();
        assert!(matches!(
            classifier.classify(&features).unwrap_err(),
            SketchError::Inference(_)
        ));
        assert!(classifier.is_ready());
    }

    #[test]
    fn test_wrong_class_count_rejected() {
        let mut logits = vec![0.0; 1000];
        logits[512] = 20.0;
        let mut classifier = Classifier::new();
        classifier.attach(Box::new(FixedLogits::new(logits)));

        let features = FeatureVector::from_values(vec![0.0; FEATURE_LEN]).unwrap();
        match classifier.classify(&features).unwrap_err() {
            SketchError::Inference(msg) => assert!(msg.contains("1000")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(classifier.is_ready());

        classifier.attach(Box::new(FixedLogits::new(vec![1.0; 3])));
        assert!(classifier.classify(&features).is_err());
    }

    #[test]
    fn test_clear_drops_active_stroke() {
        let mut canvas = Canvas::new(SurfaceConfig::default()).unwrap();
        canvas.start_stroke(Point::new(20.0, 20.0));
        canvas.continue_stroke(Point::new(60.0, 20.0));
        canvas.clear();
        assert!(canvas.surface().is_blank());
        assert!(!canvas.pen().is_drawing());

        canvas.continue_stroke(Point::new(200.0, 200.0));
        assert!(canvas.surface().is_blank());
    }
}
