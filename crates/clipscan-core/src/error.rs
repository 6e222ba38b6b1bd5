// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Clipscan.

use thiserror::Error;

/// Top-level error type for all Clipscan operations.
///
/// Crop cancellation is deliberately absent: abandoning the cropper is a
/// normal outcome and is reported through `CaptureOutcome::Cancelled`.
#[derive(Debug, Error)]
pub enum ClipscanError {
    // -- Capture errors --
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("crop failed: {0}")]
    CropFailed(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Upload errors --
    #[error("network error: {0}")]
    Network(String),

    #[error("server rejected document ({code}): {message}")]
    ServerRejected { code: String, message: String },

    // -- Coordinator errors --
    #[error("operation `{operation}` not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("an upload is already in flight")]
    UploadInFlight,

    #[error("document type cannot change while {0}")]
    DocumentTypeLocked(&'static str),

    #[error("unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("invalid document registry: {0}")]
    InvalidRegistry(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ClipscanError>;
