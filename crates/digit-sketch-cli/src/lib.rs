//! Terminal front-end for digit-sketch: draw, replay and classify hand-written digits.

pub mod config;
pub mod presenter;
pub mod repl;
pub mod session;
pub mod types;

pub use config::resolve_model_path;
pub use session::PadSession;
pub use types::{CliError, CliResult};
