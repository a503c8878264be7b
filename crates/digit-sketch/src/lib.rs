//! digit-sketch: hand-drawn digit capture, downsampling, ONNX inference and score interpretation.

pub mod capture;
pub mod features;
pub mod gesture;
pub mod inference;
pub mod interpret;
pub mod pad;
pub mod pen;
pub mod surface;
pub mod types;

pub use capture::{
    encode_png, is_readable_image, save_png, surface_from_base64, surface_from_file,
    surface_from_source,
};
pub use features::{extract_features, FeatureVector};
pub use gesture::{GestureEvent, GestureScript, PointerData, ReplayStats};
pub use inference::{default_model_path, InferenceBackend, OnnxClassifier};
pub use interpret::{argmax, interpret, softmax, top_k};
pub use pad::{Canvas, Classifier, DigitPad, ModelStatus};
pub use pen::{Pen, RawPointer, TouchPoint};
pub use surface::{StrokeSurface, SurfaceConfig, BACKGROUND, FOREGROUND};
pub use types::*;
