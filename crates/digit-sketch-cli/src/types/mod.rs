//! Error and result types used by the front-end.

pub mod error;

pub use error::*;
