// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Guide-frame geometry.
//
// The frame spans 85% of the viewport width and takes its height from the
// document's physical aspect ratio, centred on both axes.

use crate::types::{DocumentType, FrameRect, Viewport};

/// Fraction of the viewport width the guide frame occupies.
pub const FRAME_WIDTH_FRACTION: f32 = 0.85;

/// Computes the on-screen capture guide for a document type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameGeometryCalculator;

impl FrameGeometryCalculator {
    pub fn compute(viewport: Viewport, document_type: &DocumentType) -> FrameRect {
        let width = viewport.width * FRAME_WIDTH_FRACTION;
        let height = width / document_type.aspect_ratio();
        FrameRect {
            x: (viewport.width - width) / 2.0,
            y: (viewport.height - height) / 2.0,
            width,
            height,
        }
    }
}
