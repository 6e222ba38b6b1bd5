// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera backed by an image file, for headless runs.

use std::path::PathBuf;

use clipscan_bridge::{NativeCamera, PermissionStatus};
use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::types::CaptureId;
use tracing::debug;

/// "Takes" a photo by copying `source` into `work_dir` under a fresh name,
/// so every capture has its own path like a real camera roll.
#[derive(Debug, Clone)]
pub struct FileCamera {
    source: PathBuf,
    work_dir: PathBuf,
}

impl FileCamera {
    pub fn new(source: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            work_dir: work_dir.into(),
        }
    }
}

impl NativeCamera for FileCamera {
    fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    fn take_photo(&self) -> Result<PathBuf> {
        if !self.source.is_file() {
            return Err(ClipscanError::CaptureFailed(format!(
                "no image at {}",
                self.source.display()
            )));
        }
        let ext = self
            .source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        std::fs::create_dir_all(&self.work_dir)?;
        let photo = self.work_dir.join(format!("photo_{}.{ext}", CaptureId::new()));
        std::fs::copy(&self.source, &photo)
            .map_err(|e| ClipscanError::CaptureFailed(e.to_string()))?;
        debug!(source = %self.source.display(), photo = %photo.display(), "photo copied");
        Ok(photo)
    }
}
