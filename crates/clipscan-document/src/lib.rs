// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// clipscan-document — Image handling for the capture pipeline.
//
// Provides an in-process cropper that cuts the guide frame out of a full
// camera photo, JPEG encoding for upload, and a guide-overlay preview.

pub mod crop;
pub mod image;
pub mod overlay;

pub use crop::{FrameCropper, map_frame_to_image};
pub use self::image::processor::ImageProcessor;
pub use overlay::render_guide_overlay;
