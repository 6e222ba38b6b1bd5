// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// All methods are blocking; the coordinator runs them off the async runtime.

use std::path::{Path, PathBuf};

use clipscan_core::error::Result;
use clipscan_core::locator::Platform;
use clipscan_core::types::{CropSize, FrameRect, Viewport};

/// Unified bridge grouping every native capability the scanner needs.
pub trait PlatformBridge: NativeCamera + NativeCropper {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;

    /// Path normalisation rules for locators this bridge returns.
    fn platform(&self) -> Platform;
}

/// Camera permission as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet.
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Capture full-frame photos from the back camera.
pub trait NativeCamera: Send + Sync {
    /// Current permission state, without prompting.
    fn permission_status(&self) -> PermissionStatus;

    /// Show the OS permission prompt and return the resulting state.
    fn request_permission(&self) -> Result<PermissionStatus>;

    /// Take a photo with flash off and return the locator of the saved JPEG.
    fn take_photo(&self) -> Result<PathBuf>;
}

/// Everything a cropper needs to cut the guide frame out of a photo.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    pub source: PathBuf,
    /// Guide rectangle in viewport coordinates.
    pub frame: FrameRect,
    pub viewport: Viewport,
    /// Output size, taken from the rounded frame dimensions.
    pub target: CropSize,
}

impl CropRequest {
    pub fn new(source: &Path, frame: FrameRect, viewport: Viewport) -> Self {
        Self {
            source: source.to_path_buf(),
            frame,
            viewport,
            target: frame.crop_size(),
        }
    }
}

/// Result of a crop step. Cancelling is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropOutcome {
    Cropped(PathBuf),
    Cancelled,
}

/// Crop a captured photo to a fixed output size with a locked aspect ratio.
pub trait NativeCropper: Send + Sync {
    fn crop(&self, request: &CropRequest) -> Result<CropOutcome>;
}
