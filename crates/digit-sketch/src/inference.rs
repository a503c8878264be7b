//! Digit classification through ONNX Runtime.

use std::path::Path;
use std::time::Instant;

use ort::session::Session;
use ort::value::Tensor;

use crate::features::FeatureVector;
use crate::types::{LogitVector, ModelInfo, SketchError, SketchResult};

/// Default model directory, relative to the home directory.
pub const MODEL_DIR: &str = ".digit-sketch/models";

/// Default model filename.
pub const MODEL_FILENAME: &str = "model.onnx";

/// Something that can score a feature vector.
///
/// Implemented by [`OnnxClassifier`]; tests provide fixed-output backends.
pub trait InferenceBackend: Send {
    /// Input/output description of the loaded model.
    fn info(&self) -> &ModelInfo;

    /// Run one forward pass and return the flattened output tensor.
    fn infer(&mut self, features: &FeatureVector) -> SketchResult<LogitVector>;
}

/// An ONNX model session that maps 28x28 features to class logits.
pub struct OnnxClassifier {
    session: Session,
    info: ModelInfo,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("info", &self.info)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load a model from `path`.
    ///
    /// Fails with [`SketchError::ModelLoad`] when the file is missing, is not a
    /// valid ONNX graph, or declares no inputs/outputs.
    pub fn load(path: impl AsRef<Path>) -> SketchResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SketchError::ModelLoad(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading digit model from {}", path.display());

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| SketchError::ModelLoad(format!("failed to load ONNX model: {e}")))?;

        let info = describe(&session)?;
        tracing::info!(
            "Model loaded: input '{}' {:?}, output '{}'",
            info.input_name,
            info.input_shape,
            info.output_name
        );

        Ok(Self { session, info })
    }
}

impl InferenceBackend for OnnxClassifier {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn infer(&mut self, features: &FeatureVector) -> SketchResult<LogitVector> {
        let shape = self.info.resolved_input_shape()?;
        let input = features.to_tensor(&shape)?;

        let input_tensor = Tensor::from_array(input)
            .map_err(|e| SketchError::Inference(format!("failed to create input tensor: {e}")))?;

        let input_name = self.info.input_name.clone();
        let output_name = self.info.output_name.clone();

        let started = Instant::now();
        let outputs = self
            .session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| SketchError::Inference(format!("ONNX inference failed: {e}")))?;

        let (_shape, data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| SketchError::Inference(format!("failed to extract output: {e}")))?;

        tracing::debug!(
            "Inference finished in {:.2}ms",
            started.elapsed().as_secs_f64() * 1000.0
        );

        LogitVector::new(data.to_vec())
    }
}

/// Read the first input and output of a session.
fn describe(session: &Session) -> SketchResult<ModelInfo> {
    let input = session
        .inputs()
        .first()
        .ok_or_else(|| SketchError::ModelLoad("model declares no inputs".to_string()))?;
    let output = session
        .outputs()
        .first()
        .ok_or_else(|| SketchError::ModelLoad("model declares no outputs".to_string()))?;

    let input_shape = input
        .dtype()
        .tensor_shape()
        .map(|s| s.iter().copied().collect())
        .unwrap_or_default();
    let output_shape = output
        .dtype()
        .tensor_shape()
        .map(|s| s.iter().copied().collect());

    Ok(ModelInfo {
        input_name: input.name().to_string(),
        output_name: output.name().to_string(),
        input_shape,
        output_shape,
    })
}

/// Default model location under the user's home directory.
pub fn default_model_path() -> std::path::PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    std::path::PathBuf::from(home)
        .join(MODEL_DIR)
        .join(MODEL_FILENAME)
}
