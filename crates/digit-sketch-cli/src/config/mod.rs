//! Configuration loading and resolution.

use std::path::PathBuf;

use digit_sketch::{default_model_path, SurfaceConfig};

/// Environment variable naming the model file.
pub const MODEL_ENV: &str = "DIGIT_SKETCH_MODEL";

/// Resolve the model file path.
///
/// Precedence: explicit flag, `DIGIT_SKETCH_MODEL`, `./model.onnx` when it
/// exists, then `~/.digit-sketch/models/model.onnx`.
pub fn resolve_model_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(MODEL_ENV) {
        if !env_path.is_empty() {
            return env_path;
        }
    }

    let cwd_model = PathBuf::from("model.onnx");
    if cwd_model.exists() {
        return cwd_model.display().to_string();
    }

    default_model_path().display().to_string()
}

/// Surface settings from command-line flags, falling back to the defaults.
pub fn surface_config(
    width: Option<u32>,
    height: Option<u32>,
    line_width: Option<f32>,
) -> SurfaceConfig {
    let defaults = SurfaceConfig::default();
    SurfaceConfig {
        width: width.unwrap_or(defaults.width),
        height: height.unwrap_or(defaults.height),
        line_width: line_width.unwrap_or(defaults.line_width),
    }
}

/// Size flags that have no effect when the drawing comes from an image,
/// whose own dimensions define the surface.
pub fn ignored_size_flags(width: Option<u32>, height: Option<u32>) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if width.is_some() {
        ignored.push("--width");
    }
    if height.is_some() {
        ignored.push("--height");
    }
    ignored
}
