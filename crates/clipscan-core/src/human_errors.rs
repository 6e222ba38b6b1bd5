// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the capture screen.
//
// Every technical error is mapped to a short message, a suggestion, and the
// action the screen should offer so the user can recover locally.

use crate::error::ClipscanError;

/// Message shown for any transport-level upload failure.
pub const NETWORK_ERROR_MESSAGE: &str = "A network error occurred.";

/// What the screen should offer after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Ask for camera permission again.
    GrantPermission,
    /// Go back to the live preview and take another photo.
    RetryCapture,
    /// Keep the photo and send it again.
    RetryUpload,
    /// Nothing the user can do on this screen.
    None,
}

/// A user-facing error with message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as the alert title or body).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub recovery: Recovery,
}

/// Convert a `ClipscanError` into a `HumanError`.
pub fn humanize_error(err: &ClipscanError) -> HumanError {
    match err {
        ClipscanError::PermissionDenied => HumanError {
            message: "Camera permission is required.".into(),
            suggestion: "Allow camera access for this app, then try again.".into(),
            recovery: Recovery::GrantPermission,
        },

        ClipscanError::CaptureFailed(_) | ClipscanError::ImageError(_) => HumanError {
            message: "Something went wrong while taking the photo.".into(),
            suggestion: "Hold the document inside the frame and take the photo again.".into(),
            recovery: Recovery::RetryCapture,
        },

        ClipscanError::CropFailed(_) => HumanError {
            message: "The photo couldn't be cropped.".into(),
            suggestion: "Take the photo again.".into(),
            recovery: Recovery::RetryCapture,
        },

        ClipscanError::Network(_) => HumanError {
            message: NETWORK_ERROR_MESSAGE.into(),
            suggestion: "Check your connection and send the photo again.".into(),
            recovery: Recovery::RetryUpload,
        },

        // The server's own message is what the user needs to see.
        ClipscanError::ServerRejected { message, .. } => HumanError {
            message: if message.trim().is_empty() {
                "The document could not be verified.".into()
            } else {
                message.clone()
            },
            suggestion: "Send the photo again, or retake it if the document was unclear.".into(),
            recovery: Recovery::RetryUpload,
        },

        ClipscanError::UploadInFlight => HumanError {
            message: "The document is already being sent.".into(),
            suggestion: "Please wait for the current upload to finish.".into(),
            recovery: Recovery::None,
        },

        ClipscanError::DocumentTypeLocked(_) => HumanError {
            message: "The document type can't be changed right now.".into(),
            suggestion: "Wait until the current photo is finished.".into(),
            recovery: Recovery::None,
        },

        ClipscanError::InvalidState { .. } => HumanError {
            message: "That action isn't available right now.".into(),
            suggestion: "Return to the camera and start again.".into(),
            recovery: Recovery::RetryCapture,
        },

        ClipscanError::UnknownDocumentType(id) => HumanError {
            message: "This document type isn't supported.".into(),
            suggestion: format!("Choose a document type from the list. (Code: {id})"),
            recovery: Recovery::None,
        },

        ClipscanError::PlatformUnavailable => HumanError {
            message: "The camera isn't available on this device.".into(),
            suggestion: "Use a device with a camera.".into(),
            recovery: Recovery::None,
        },

        ClipscanError::InvalidRegistry(_)
        | ClipscanError::Config(_)
        | ClipscanError::Io(_)
        | ClipscanError::Serialization(_) => HumanError {
            message: "The scanner isn't set up correctly.".into(),
            suggestion: format!("Contact support. ({err})"),
            recovery: Recovery::None,
        },
    }
}
