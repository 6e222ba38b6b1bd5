// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Clipscan — Native platform bridge abstractions.
//
// The capture pipeline talks to the camera, the permission prompt, and the
// cropping UI only through the traits in `traits`. Mobile hosts implement
// them on top of their camera SDK; desktop and CI builds get the stub.

pub mod stub;
pub mod traits;

use std::sync::Arc;

pub use traits::{
    CropOutcome, CropRequest, NativeCamera, NativeCropper, PermissionStatus, PlatformBridge,
};

/// Bridge used when the host has not registered a native implementation.
pub fn platform_bridge() -> Arc<dyn PlatformBridge> {
    Arc::new(stub::StubBridge)
}
