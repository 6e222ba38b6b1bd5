// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture cycle states.

use std::path::PathBuf;

use clipscan_core::types::{CapturedImage, ScanDocumentResponse};

/// Where the current capture cycle is, with the data owned in that state.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// Camera permission not yet confirmed.
    AwaitingPermission,
    /// Preview live, frame overlay shown.
    Ready,
    /// Camera shutter in progress.
    Capturing,
    /// Full photo taken, cropper open.
    Cropping { photo: PathBuf },
    /// Image held, waiting for retake or upload.
    Captured(CapturedImage),
    /// Upload in flight for this image.
    Uploading(CapturedImage),
    /// Server accepted the document; the image has been released.
    Done(ScanDocumentResponse),
    /// Upload failed; the image is kept so the upload can be repeated.
    Failed { image: CapturedImage, message: String },
}

impl CaptureState {
    pub fn phase(&self) -> CapturePhase {
        match self {
            Self::AwaitingPermission => CapturePhase::AwaitingPermission,
            Self::Ready => CapturePhase::Ready,
            Self::Capturing => CapturePhase::Capturing,
            Self::Cropping { .. } => CapturePhase::Cropping,
            Self::Captured(_) => CapturePhase::Captured,
            Self::Uploading(_) => CapturePhase::Uploading,
            Self::Done(_) => CapturePhase::Done,
            Self::Failed { .. } => CapturePhase::Failed,
        }
    }

    /// The image this state owns, if any.
    pub fn image(&self) -> Option<&CapturedImage> {
        match self {
            Self::Captured(image) | Self::Uploading(image) | Self::Failed { image, .. } => {
                Some(image)
            }
            _ => None,
        }
    }
}

/// Data-free view of [`CaptureState`] for events and UI switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapturePhase {
    AwaitingPermission,
    Ready,
    Capturing,
    Cropping,
    Captured,
    Uploading,
    Done,
    Failed,
}

impl CapturePhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::AwaitingPermission => "awaiting-permission",
            Self::Ready => "ready",
            Self::Capturing => "capturing",
            Self::Cropping => "cropping",
            Self::Captured => "captured",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Document type selection is frozen while a photo or upload is in
    /// progress so the frame, the crop, and the upload metadata agree.
    pub fn locks_document_type(self) -> bool {
        matches!(self, Self::Capturing | Self::Cropping | Self::Uploading)
    }

    /// Whether the capture button should be enabled.
    pub fn can_capture(self) -> bool {
        self == Self::Ready
    }
}

impl std::fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
