//! Foundation module - shared utilities used throughout the shim
//!
//! - Logging setup and the validation log channel
//! - Lock helpers for the shared framework state

pub mod logging;
pub mod sync;
