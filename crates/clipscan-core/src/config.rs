// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClipscanError, Result};
use crate::locator::Platform;

/// Settings supplied by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Base URL of the OCR server; `/ocr/scan` and `/ocr/save` are appended.
    pub server_url: String,
    /// Member id sent as `mbUid`. Required for uploads.
    pub user_id: String,
    /// Optional issuing-country code sent as `countryCode`.
    pub country_code: Option<String>,
    /// Upload timeout. `None` means no client-side timeout.
    pub request_timeout_secs: Option<u64>,
    /// Run the crop step between capture and upload.
    pub crop_enabled: bool,
    /// Upload immediately once an image is captured.
    pub auto_upload: bool,
    /// Path normalisation rules for image locators.
    pub platform: Platform,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            user_id: String::new(),
            country_code: None,
            request_timeout_secs: None,
            crop_enabled: true,
            auto_upload: false,
            platform: Platform::current(),
        }
    }
}

impl ScannerConfig {
    pub fn new(server_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Parse `server_url`, which must be an absolute http(s) URL.
    pub fn server_base_url(&self) -> Result<Url> {
        let url = Url::parse(self.server_url.trim())
            .map_err(|e| ClipscanError::Config(format!("invalid server_url: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClipscanError::Config(format!(
                "server_url scheme must be http or https, got {other}"
            ))),
        }
    }

    /// Check the fields required before any upload can run.
    pub fn validate(&self) -> Result<()> {
        self.server_base_url()?;
        if self.user_id.trim().is_empty() {
            return Err(ClipscanError::Config("user_id is required".into()));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ClipscanError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
