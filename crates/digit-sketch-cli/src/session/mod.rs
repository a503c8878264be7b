//! Session management for a drawing pad.

pub mod manager;

pub use manager::PadSession;
