// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, crop, exact resize, and JPEG encode. Operates on
// in-memory images using the `image` crate.

use std::path::Path;

use clipscan_core::error::ClipscanError;
use image::DynamicImage;
use tracing::{debug, info, instrument};

/// JPEG quality used for upload images.
pub const UPLOAD_JPEG_QUALITY: u8 = 90;

/// Image pipeline operating on a single in-memory image.
///
/// Each transform consumes `self` and returns a new processor, so steps
/// chain:
///
/// ```ignore
/// let bytes = ImageProcessor::open("photo.jpg")?
///     .crop(120, 640, 2600, 1640)
///     .resize_exact(332, 237)
///     .to_jpeg_bytes(UPLOAD_JPEG_QUALITY)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClipscanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ClipscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ClipscanError> {
        let img = image::load_from_memory(data)
            .map_err(|err| ClipscanError::ImageError(format!("failed to decode image: {err}")))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Crop a rectangular region. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x).max(1);
        let safe_h = height.min(img_h - safe_y).max(1);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");
        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Resize to exactly `width` x `height`. The caller is responsible for
    /// keeping the aspect ratio of the crop and the target in step.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        Self {
            image: self
                .image
                .resize_exact(width, height, image::imageops::FilterType::Lanczos3),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, ClipscanError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ClipscanError::ImageError(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode as JPEG and write to `path`.
    pub fn save_jpeg(&self, path: impl AsRef<Path>, quality: u8) -> Result<(), ClipscanError> {
        let bytes = self.to_jpeg_bytes(quality)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}
