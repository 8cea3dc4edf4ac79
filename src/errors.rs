//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`LimnError`] covers all failure modes of a
//! generation:
//! - Static validation rejections (before any code runs)
//! - Sandbox timeouts and cancellations
//! - Runtime errors raised by user code
//! - Mesh output validation failures
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, LimnError>`.
//!
//! ```rust,ignore
//! use limn::errors::{LimnError, Result};
//!
//! fn build_layer() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the limn engine.
///
/// Every error leaves the scene unchanged: no layer is added and no
/// existing layer is modified. The variants mirror what the host can
/// meaningfully do next (re-prompt, retry with smaller resolution, ignore).
#[derive(Error, Debug)]
pub enum LimnError {
    // ========================================================================
    // Pre-execution errors
    // ========================================================================
    /// Static analysis rejected the source before execution.
    ///
    /// Non-retryable for the same source; the reason is user-visible.
    #[error("Validation failed: {0}")]
    Validation(String),

    // ========================================================================
    // Sandbox errors
    // ========================================================================
    /// The wall-clock budget was exceeded. Retryable with reduced
    /// resolution or count.
    #[error("Generation timed out after {seconds:.0} s")]
    Timeout {
        /// Configured timeout that elapsed
        seconds: f32,
    },

    /// User code raised an error during execution.
    #[error("Runtime error{}: {message}", line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Runtime {
        /// Human-readable description of the failure
        message: String,
        /// Line in the user source, when known
        line: Option<u32>,
        /// Vertices emitted before the failure, for progress context
        vertices_so_far: u32,
    },

    /// The host requested cancellation. Cancellation returns quickly and
    /// adds no layer; hosts typically do not surface it as a failure.
    #[error("Generation cancelled")]
    Cancelled,

    // ========================================================================
    // Output errors
    // ========================================================================
    /// The produced mesh failed a hard output check and was discarded.
    #[error("Mesh validation failed: {0}")]
    MeshValidation(String),

    // ========================================================================
    // Bookkeeping errors
    // ========================================================================
    /// A layer id was not found in the store.
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),
}

impl LimnError {
    /// True when the same source could plausibly succeed on a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LimnError::Timeout { .. } | LimnError::Cancelled)
    }
}

/// Alias for `Result<T, LimnError>`.
pub type Result<T> = std::result::Result<T, LimnError>;
