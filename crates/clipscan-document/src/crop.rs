// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process cropper — cuts the guide frame out of a full camera photo
// without showing a cropping UI.
//
// The preview fills the viewport in aspect-fill mode, so the frame is mapped
// back into photo pixels through the same scale and centring offset.

use std::path::PathBuf;

use clipscan_bridge::{CropOutcome, CropRequest, NativeCropper};
use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::locator::ResourceLocator;
use clipscan_core::types::{FrameRect, Viewport};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::image::processor::{ImageProcessor, UPLOAD_JPEG_QUALITY};

/// Pixel rectangle inside a decoded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a guide frame in viewport points to pixels of a photo that was shown
/// aspect-filled in that viewport. The result is clamped to the photo.
pub fn map_frame_to_image(
    frame: &FrameRect,
    viewport: Viewport,
    image_width: u32,
    image_height: u32,
) -> PixelRect {
    let (iw, ih) = (image_width as f32, image_height as f32);
    let scale = (viewport.width / iw).max(viewport.height / ih);
    let offset_x = (viewport.width - iw * scale) / 2.0;
    let offset_y = (viewport.height - ih * scale) / 2.0;

    let left = ((frame.x - offset_x) / scale).clamp(0.0, iw);
    let top = ((frame.y - offset_y) / scale).clamp(0.0, ih);
    let right = ((frame.x + frame.width - offset_x) / scale).clamp(0.0, iw);
    let bottom = ((frame.y + frame.height - offset_y) / scale).clamp(0.0, ih);

    PixelRect {
        x: left.round() as u32,
        y: top.round() as u32,
        width: (right - left).round().max(1.0) as u32,
        height: (bottom - top).round().max(1.0) as u32,
    }
}

/// Cropper that writes the framed region as a JPEG into `output_dir`.
#[derive(Debug, Clone)]
pub struct FrameCropper {
    output_dir: PathBuf,
    locator: ResourceLocator,
    quality: u8,
}

impl FrameCropper {
    pub fn new(output_dir: impl Into<PathBuf>, locator: ResourceLocator) -> Self {
        Self {
            output_dir: output_dir.into(),
            locator,
            quality: UPLOAD_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

impl NativeCropper for FrameCropper {
    #[instrument(skip_all, fields(source = %request.source.display()))]
    fn crop(&self, request: &CropRequest) -> Result<CropOutcome> {
        let source = self.locator.to_local_path(&request.source);
        let photo = ImageProcessor::open(&source)
            .map_err(|e| ClipscanError::CropFailed(e.to_string()))?;

        let rect = map_frame_to_image(&request.frame, request.viewport, photo.width(), photo.height());
        let cropped = photo
            .crop(rect.x, rect.y, rect.width, rect.height)
            .resize_exact(request.target.width, request.target.height);

        std::fs::create_dir_all(&self.output_dir)?;
        let out = self.output_dir.join(format!("crop_{}.jpg", Uuid::new_v4()));
        cropped
            .save_jpeg(&out, self.quality)
            .map_err(|e| ClipscanError::CropFailed(e.to_string()))?;

        info!(
            path = %out.display(),
            width = request.target.width,
            height = request.target.height,
            "guide frame cropped"
        );
        Ok(CropOutcome::Cropped(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipscan_core::geometry::FrameGeometryCalculator;
    use clipscan_core::locator::Platform;
    use clipscan_core::types::DocumentType;
    use image::{DynamicImage, Rgb, RgbImage};

    fn passport() -> DocumentType {
        DocumentType::new("01", "Domestic passport", true)
    }

    #[test]
    fn maps_through_uniform_scale() {
        let vp = Viewport::new(500.0, 1000.0);
        let frame = FrameGeometryCalculator::compute(vp, &passport());
        let rect = map_frame_to_image(&frame, vp, 1000, 2000);
        assert_eq!(rect.x, 75);
        assert_eq!(rect.width, 850);
        assert_eq!(rect.height, 607);
    }

    #[test]
    fn aspect_fill_offsets_wider_photo() {
        // 4:3 landscape photo shown in a portrait viewport: sides are cut off.
        let vp = Viewport::new(300.0, 600.0);
        let frame = FrameRect {
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 600.0,
        };
        let rect = map_frame_to_image(&frame, vp, 800, 600);
        assert_eq!(rect.height, 600);
        assert_eq!(rect.width, 300);
        assert_eq!(rect.x, 250);
    }

    #[test]
    fn crops_to_target_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.jpg");
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            800,
            1688,
            Rgb([90, 90, 90]),
        )))
        .save_jpeg(&source, 80)
        .unwrap();

        let vp = Viewport::new(400.0, 844.0);
        let frame = FrameGeometryCalculator::compute(vp, &passport());
        let cropper = FrameCropper::new(dir.path().join("out"), ResourceLocator::new(Platform::Ios));
        let uri = PathBuf::from(format!("file://{}", source.display()));
        let outcome = cropper.crop(&CropRequest::new(&uri, frame, vp)).unwrap();

        let CropOutcome::Cropped(path) = outcome else {
            panic!("expected a cropped image");
        };
        let out = ImageProcessor::open(&path).unwrap();
        assert_eq!((out.width(), out.height()), (340, 243));
    }

    #[test]
    fn missing_source_is_crop_failure() {
        let dir = tempfile::tempdir().unwrap();
        let vp = Viewport::new(390.0, 844.0);
        let frame = FrameGeometryCalculator::compute(vp, &passport());
        let cropper = FrameCropper::new(dir.path(), ResourceLocator::new(Platform::Desktop));
        let req = CropRequest::new(&dir.path().join("nope.jpg"), frame, vp);
        assert!(matches!(cropper.crop(&req), Err(ClipscanError::CropFailed(_))));
    }
}
