//! Core types shared across imgsweep: the error taxonomy and its user-facing
//! rendering.

pub mod error;

pub use error::{ErrorContext, SweepError, user_friendly_error};
