//! Shared types.

pub mod error;

pub use error::{Error, Stage};
