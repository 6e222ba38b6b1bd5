// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Guide-overlay preview: dims everything outside the guide frame and outlines
// the frame, so a captured photo can be checked against what the user saw.

use clipscan_core::types::{FrameRect, Viewport};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::instrument;

use crate::crop::map_frame_to_image;

const MASK_ALPHA: f32 = 0.5;
const OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Render the mask and outline for `frame` on top of `photo`.
#[instrument(skip(photo), fields(width = photo.width(), height = photo.height()))]
pub fn render_guide_overlay(photo: &DynamicImage, frame: &FrameRect, viewport: Viewport) -> DynamicImage {
    let mut canvas: RgbaImage = photo.to_rgba8();
    let rect = map_frame_to_image(frame, viewport, canvas.width(), canvas.height());
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
        if !inside {
            let Rgba([r, g, b, a]) = *pixel;
            let dim = |c: u8| (c as f32 * (1.0 - MASK_ALPHA)) as u8;
            *pixel = Rgba([dim(r), dim(g), dim(b), a]);
        }
    }

    // Two-pixel outline.
    for inset in 0..2u32 {
        if rect.width > 2 * inset && rect.height > 2 * inset {
            let outline = Rect::at((x0 + inset) as i32, (y0 + inset) as i32)
                .of_size(rect.width - 2 * inset, rect.height - 2 * inset);
            draw_hollow_rect_mut(&mut canvas, outline, OUTLINE);
        }
    }

    DynamicImage::ImageRgba8(canvas)
}
