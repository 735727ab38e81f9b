//! Core types shared by every part of the engine.
//!
//! Currently this is the error model: [`TempVarError`] for precise handling in
//! code and [`ErrorContext`] for presenting failures to people.

pub mod error;

pub use error::{ErrorContext, Result, TempVarError, user_friendly_error};
