//! Drawing session lifecycle: canvas input, model loading and predictions.

use std::sync::Arc;

use tokio::sync::Mutex;

use digit_sketch::{
    Canvas, Classifier, FeatureVector, GestureScript, InferenceBackend, ModelInfo, ModelStatus,
    Point, Prediction, ReplayStats, StrokeSurface, SurfaceConfig,
};

use crate::types::{CliError, CliResult};

/// One drawing pad shared between the input loop and background work.
///
/// The canvas and the classifier sit behind separate locks, so strokes can
/// still be drawn while a model loads or an inference runs. At most one
/// model operation runs at a time; a prediction requested while another is
/// outstanding fails with [`CliError::ModelBusy`] instead of queueing.
#[derive(Clone)]
pub struct PadSession {
    canvas: Arc<Mutex<Canvas>>,
    classifier: Arc<Mutex<Classifier>>,
}

impl PadSession {
    /// Create a session with a cleared canvas and no model.
    pub fn new(config: SurfaceConfig) -> CliResult<Self> {
        Ok(Self::with_canvas(Canvas::new(config)?))
    }

    /// Create a session around an existing canvas.
    pub fn with_canvas(canvas: Canvas) -> Self {
        tracing::debug!(
            "Session started on a {}x{} surface",
            canvas.surface().width(),
            canvas.surface().height()
        );
        Self {
            canvas: Arc::new(Mutex::new(canvas)),
            classifier: Arc::new(Mutex::new(Classifier::new())),
        }
    }

    /// Load an ONNX model on a blocking worker.
    ///
    /// A failure is recorded in the classifier and disables predictions until
    /// a later load succeeds.
    pub async fn load_model(&self, path: &str) -> CliResult<ModelInfo> {
        let mut classifier = self.classifier.clone().lock_owned().await;
        let path = path.to_string();
        let info = tokio::task::spawn_blocking(move || classifier.load_model(&path)).await??;
        Ok(info)
    }

    /// Install a ready backend, replacing any loaded model.
    pub async fn attach(&self, backend: Box<dyn InferenceBackend>) {
        self.classifier.lock().await.attach(backend);
    }

    pub async fn status(&self) -> ModelStatus {
        self.classifier.lock().await.status()
    }

    /// True while a load or prediction holds the classifier.
    pub fn is_busy(&self) -> bool {
        self.classifier.try_lock().is_err()
    }

    pub async fn start_stroke(&self, at: Point) {
        self.canvas.lock().await.start_stroke(at);
    }

    pub async fn continue_stroke(&self, to: Point) {
        self.canvas.lock().await.continue_stroke(to);
    }

    pub async fn stop_stroke(&self) {
        self.canvas.lock().await.stop_stroke();
    }

    /// Draw a complete segment as one stroke.
    pub async fn line(&self, from: Point, to: Point) {
        let mut canvas = self.canvas.lock().await;
        canvas.start_stroke(from);
        canvas.continue_stroke(to);
        canvas.stop_stroke();
    }

    pub async fn clear(&self) {
        self.canvas.lock().await.clear();
    }

    pub async fn replay(&self, script: &GestureScript) -> ReplayStats {
        let mut canvas = self.canvas.lock().await;
        script.replay(&mut canvas)
    }

    /// Copy of the current surface.
    pub async fn snapshot(&self) -> StrokeSurface {
        self.canvas.lock().await.surface().clone()
    }

    pub async fn features(&self) -> FeatureVector {
        self.canvas.lock().await.features()
    }

    /// Classify the current drawing.
    ///
    /// The drawing is snapshotted first; later strokes do not affect a running
    /// prediction.
    pub async fn predict(&self) -> CliResult<Prediction> {
        let mut classifier = self
            .classifier
            .clone()
            .try_lock_owned()
            .map_err(|_| CliError::ModelBusy)?;

        let features = self.features().await;
        let prediction =
            tokio::task::spawn_blocking(move || classifier.classify(&features)).await??;
        Ok(prediction)
    }
}
