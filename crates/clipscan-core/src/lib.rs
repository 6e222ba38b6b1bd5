// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Clipscan — Core types, guide-frame geometry, and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod locator;
pub mod registry;
pub mod types;

pub use config::ScannerConfig;
pub use error::ClipscanError;
pub use geometry::FrameGeometryCalculator;
pub use locator::{Platform, ResourceLocator};
pub use registry::DocumentRegistry;
pub use types::*;
