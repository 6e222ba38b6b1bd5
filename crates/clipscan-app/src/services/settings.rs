// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration persistence and command-line overrides.

use std::path::{Path, PathBuf};

use clap::Args;
use clipscan_core::config::ScannerConfig;
use clipscan_core::error::Result;
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

/// Settings that can be given on the command line. Anything set here wins
/// over the stored configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Read and write configuration from this directory instead of the data dir.
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Base URL of the OCR server.
    #[arg(long, global = true, env = "CLIPSCAN_SERVER_URL")]
    pub server_url: Option<String>,

    /// Member id sent with every upload.
    #[arg(long, global = true, env = "CLIPSCAN_USER_ID")]
    pub user_id: Option<String>,

    /// Issuing-country code sent with uploads.
    #[arg(long, global = true)]
    pub country_code: Option<String>,

    /// Upload timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the crop step and upload the full photo.
    #[arg(long, global = true)]
    pub no_crop: bool,

    /// Write the effective configuration back to the config file.
    #[arg(long, global = true)]
    pub save_config: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ScannerConfig) {
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if let Some(user_id) = &self.user_id {
            config.user_id = user_id.clone();
        }
        if let Some(country) = &self.country_code {
            config.country_code = Some(country.clone()).filter(|c| !c.is_empty());
        }
        if self.timeout.is_some() {
            config.request_timeout_secs = self.timeout;
        }
        if self.no_crop {
            config.crop_enabled = false;
        }
    }
}

/// Load the stored configuration, apply overrides, and persist it if asked.
pub fn resolve_config(overrides: &ConfigOverrides, default_dir: &Path) -> Result<ScannerConfig> {
    let dir = overrides.config_dir.as_deref().unwrap_or(default_dir);
    let mut config = load_config(dir)?.unwrap_or_default();
    overrides.apply(&mut config);
    if overrides.save_config {
        std::fs::create_dir_all(dir)?;
        persist_config(dir, &config)?;
        info!(dir = %dir.display(), "configuration saved");
    }
    Ok(config)
}

/// `Ok(None)` when no configuration has been stored yet.
pub fn load_config(dir: &Path) -> Result<Option<ScannerConfig>> {
    let path = dir.join(CONFIG_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no stored configuration");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn persist_config(dir: &Path, config: &ScannerConfig) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
