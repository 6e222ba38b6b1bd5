// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where the CLI keeps its configuration and scan output.

use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "clipscan";

/// `$XDG_DATA_HOME/clipscan`, else `~/.local/share/clipscan`, else a
/// directory under the system temp dir. Created on first use.
pub fn data_dir() -> io::Result<PathBuf> {
    ensure(base_dir().join(APP_DIR))
}

/// A named directory under [`data_dir`], e.g. `scans`.
pub fn data_subdir(name: &str) -> io::Result<PathBuf> {
    ensure(data_dir()?.join(name))
}

fn base_dir() -> PathBuf {
    let xdg = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty());
    let home = std::env::var_os("HOME").filter(|v| !v.is_empty());
    match (xdg, home) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => Path::new(&home).join(".local").join("share"),
        (None, None) => std::env::temp_dir(),
    }
}

fn ensure(dir: PathBuf) -> io::Result<PathBuf> {
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
