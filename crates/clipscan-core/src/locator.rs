// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local resource locator — the single place where image paths are converted
// between plain filesystem paths and platform file URIs.
//
// iOS camera and cropper APIs hand back and expect `file://` URIs; Android
// and desktop use bare paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const FILE_SCHEME: &str = "file://";

/// Target platform, used to pick the path normalisation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Desktop,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Self::Ios
        } else if cfg!(target_os = "android") {
            Self::Android
        } else {
            Self::Desktop
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Resolves image locators for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLocator {
    platform: Platform,
}

impl ResourceLocator {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Locator in the form the platform's native APIs expect.
    pub fn to_uri(&self, path: &Path) -> String {
        let raw = path.to_string_lossy();
        match self.platform {
            Platform::Ios if !raw.starts_with(FILE_SCHEME) => format!("{FILE_SCHEME}{raw}"),
            _ => raw.into_owned(),
        }
    }

    /// Filesystem path that can be opened for reading, whatever form the
    /// locator arrived in.
    pub fn to_local_path(&self, locator: &Path) -> PathBuf {
        let raw = locator.to_string_lossy();
        match raw.strip_prefix(FILE_SCHEME) {
            Some(stripped) => PathBuf::from(stripped),
            None => locator.to_path_buf(),
        }
    }
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}
