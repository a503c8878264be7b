//! Error types and process exit codes for the CLI.

use digit_sketch::SketchError;

/// Process exit codes.
pub mod exit_codes {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const MODEL_LOAD: i32 = 3;
    pub const MODEL_NOT_LOADED: i32 = 4;
    pub const INFERENCE: i32 = 5;
    pub const INPUT: i32 = 6;
    pub const BUSY: i32 = 7;
}

/// All errors that can occur in the front-end.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Sketch(#[from] SketchError),

    #[error("Model is busy: a load or prediction is still running")]
    ModelBusy,

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        use exit_codes::*;
        match self {
            CliError::Sketch(e) => match e {
                SketchError::ModelLoad(_) => MODEL_LOAD,
                SketchError::ModelNotLoaded(_) => MODEL_NOT_LOADED,
                SketchError::Inference(_) | SketchError::ShapeMismatch { .. } => INFERENCE,
                SketchError::Image(_)
                | SketchError::InvalidInput(_)
                | SketchError::Script(_) => INPUT,
                SketchError::Io(_) => GENERAL,
            },
            CliError::ModelBusy => BUSY,
            CliError::Usage(_) => USAGE,
            CliError::Join(_) | CliError::Io(_) | CliError::Json(_) => GENERAL,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
