//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! Per-frame code never propagates these as faults: the hot update/draw path
//! treats a missing camera, material or mesh as "skip this work" and moves on.
//! Errors surface from the cold paths — factory lookups, reparenting,
//! resource resolution — where the caller can meaningfully react.

use thiserror::Error;

/// The main error type for the Tempest engine.
#[derive(Error, Debug)]
pub enum TempestError {
    // ========================================================================
    // Scene Graph Errors
    // ========================================================================
    /// A component or actor type name has no registered factory.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// An operation would corrupt the scene graph (e.g. a reparenting cycle).
    #[error("Structural integrity violation: {0}")]
    StructuralIntegrity(String),

    /// A required collaborator is absent (no bound pose, no material, ...).
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A backend upload or decode failed; the resource moves to `Suspend`.
    #[error("Resource load failed: {path}: {reason}")]
    ResourceLoadFailure {
        /// Path the resource was resolved from.
        path: String,
        /// Loader-provided failure description.
        reason: String,
    },

    /// No resource is registered under the requested path.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A handle resolved to a resource of a different kind.
    #[error("Resource kind mismatch: expected {expected}")]
    ResourceKindMismatch {
        /// The kind the caller asked for.
        expected: &'static str,
    },

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (settings, serialized user data).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, TempestError>`.
pub type Result<T> = std::result::Result<T, TempestError>;
