// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Every capability returns `PlatformUnavailable`.

use std::path::PathBuf;

use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::locator::Platform;

use crate::traits::*;

/// No-op bridge returned on platforms without a registered native bridge.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn platform(&self) -> Platform {
        Platform::Desktop
    }
}

impl NativeCamera for StubBridge {
    fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }

    fn request_permission(&self) -> Result<PermissionStatus> {
        tracing::warn!("NativeCamera::request_permission called on stub bridge");
        Err(ClipscanError::PlatformUnavailable)
    }

    fn take_photo(&self) -> Result<PathBuf> {
        tracing::warn!("NativeCamera::take_photo called on stub bridge");
        Err(ClipscanError::PlatformUnavailable)
    }
}

impl NativeCropper for StubBridge {
    fn crop(&self, _request: &CropRequest) -> Result<CropOutcome> {
        tracing::warn!("NativeCropper::crop called on stub bridge");
        Err(ClipscanError::PlatformUnavailable)
    }
}
