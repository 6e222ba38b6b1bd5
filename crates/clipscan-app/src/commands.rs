// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each returns data for `main` to print so the
// pipeline can be exercised without a terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clipscan_capture::{
    CaptureCoordinator, CaptureObserver, CaptureOutcome, CapturePhase, spawn_observer,
};
use async_trait::async_trait;
use clipscan_client::{DocumentScanClient, DocumentUploader};
use clipscan_core::config::ScannerConfig;
use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::geometry::FrameGeometryCalculator;
use clipscan_core::human_errors::HumanError;
use clipscan_core::locator::ResourceLocator;
use clipscan_core::registry::DocumentRegistry;
use clipscan_core::types::{
    CapturedImage, DocumentType, FrameRect, OcrFields, SaveOcrRequest, ScanDocumentResponse,
    Viewport,
};
use clipscan_document::{FrameCropper, ImageProcessor, render_guide_overlay};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::services::file_camera::FileCamera;

/// What a `scan` run ended with.
#[derive(Debug)]
pub enum ScanReport {
    /// Captured but not uploaded (`auto_upload` off and no `--upload`).
    Captured(CapturedImage),
    Uploaded(ScanDocumentResponse),
    Cancelled,
}

pub struct ScanOptions {
    pub image: PathBuf,
    pub document_type: Option<String>,
    /// Preview size the frame is laid out in; defaults to the image size.
    pub viewport: Option<Viewport>,
    pub upload: bool,
}

/// Progress lines on stderr for a headless run.
struct ConsoleObserver;

impl CaptureObserver for ConsoleObserver {
    fn on_state_changed(&self, _from: CapturePhase, to: CapturePhase) {
        eprintln!("  .. {to}");
    }

    fn on_image_captured(&self, image: &CapturedImage) {
        eprintln!("  captured {}", image.path.display());
    }

    fn on_error(&self, error: &HumanError) {
        eprintln!("  {} {}", error.message, error.suggestion);
    }
}

/// Stands in for the HTTP client on capture-only runs, where no server needs
/// to be configured.
struct CaptureOnly;

#[async_trait]
impl DocumentUploader for CaptureOnly {
    async fn scan(
        &self,
        _image_path: &Path,
        _document_type: &DocumentType,
        _user_id: &str,
        _country_code: Option<&str>,
    ) -> Result<ScanDocumentResponse> {
        Err(ClipscanError::Config("upload not enabled for this run".into()))
    }

    async fn save_ocr(
        &self,
        _request: &SaveOcrRequest,
        _image_path: &Path,
    ) -> Result<ScanDocumentResponse> {
        Err(ClipscanError::Config("upload not enabled for this run".into()))
    }
}

/// Capture from a file, crop to the guide frame, and optionally upload.
pub async fn scan(config: ScannerConfig, options: ScanOptions, work_dir: &Path) -> Result<ScanReport> {
    let upload = options.upload || config.auto_upload;
    if upload {
        config.validate()?;
    }

    let viewport = match options.viewport {
        Some(viewport) => viewport,
        None => image_viewport(&options.image)?,
    };
    let camera = Arc::new(FileCamera::new(&options.image, work_dir.join("captures")));
    let cropper = Arc::new(FrameCropper::new(
        work_dir.join("crops"),
        ResourceLocator::new(config.platform),
    ));
    let uploader: Arc<dyn DocumentUploader> = if upload {
        Arc::new(DocumentScanClient::new(&config)?)
    } else {
        Arc::new(CaptureOnly)
    };

    let coordinator = CaptureCoordinator::builder(config, camera, uploader, viewport)
        .cropper(cropper)
        .build();
    let observer = spawn_observer(coordinator.subscribe(), Arc::new(ConsoleObserver));

    let report = drive_scan(&coordinator, options.document_type.as_deref(), upload).await;

    drop(coordinator);
    if let Err(e) = observer.await {
        warn!(error = %e, "observer task ended abnormally");
    }
    report
}

async fn drive_scan(
    coordinator: &CaptureCoordinator,
    document_type: Option<&str>,
    upload: bool,
) -> Result<ScanReport> {
    if let Some(id) = document_type {
        coordinator.select_document_type(id)?;
    }
    if coordinator.check_permission() == CapturePhase::AwaitingPermission {
        coordinator.request_permission().await?;
    }

    let image = match coordinator.capture().await? {
        CaptureOutcome::Captured(image) => image,
        CaptureOutcome::Cancelled => return Ok(ScanReport::Cancelled),
    };
    if !upload {
        info!(path = %image.path.display(), "upload skipped");
        return Ok(ScanReport::Captured(image));
    }
    Ok(ScanReport::Uploaded(coordinator.upload().await?))
}

pub struct SaveOcrOptions {
    pub image: PathBuf,
    pub document_type: String,
    pub fields: OcrFields,
}

/// Post already-extracted values with their image to `/ocr/save`.
pub async fn save_ocr(config: &ScannerConfig, options: SaveOcrOptions) -> Result<ScanDocumentResponse> {
    config.validate()?;
    let document_type = DocumentRegistry::default()
        .require(&options.document_type)?
        .clone();
    let client = DocumentScanClient::new(config)?;
    let request = SaveOcrRequest {
        user_id: config.user_id.clone(),
        document_type_id: document_type.id,
        country_code: config.country_code.clone(),
        fields: options.fields,
    };
    client.save_ocr(&request, &options.image).await
}

/// One line per supported document type.
pub fn list_types(registry: &DocumentRegistry) -> Vec<String> {
    registry
        .iter()
        .map(|t| {
            let class = if t.is_passport_type { "passport" } else { "card" };
            format!("{}  {:<20} {class} ({}:1)", t.id, t.name, t.aspect_ratio())
        })
        .collect()
}

/// Guide rectangle for a viewport as JSON.
pub fn frame_report(registry: &DocumentRegistry, viewport: Viewport, type_id: &str) -> Result<Value> {
    let document_type = registry.require(type_id)?;
    let frame = FrameGeometryCalculator::compute(viewport, document_type);
    Ok(json!({
        "documentType": document_type.id,
        "viewport": viewport,
        "frame": frame,
        "cropSize": frame.crop_size(),
    }))
}

/// Write `image` with the guide overlay for `type_id` drawn on it.
pub fn preview(
    registry: &DocumentRegistry,
    image: &Path,
    type_id: &str,
    viewport: Option<Viewport>,
    output: &Path,
) -> Result<FrameRect> {
    let document_type = registry.require(type_id)?;
    let photo = ImageProcessor::open(image)?;
    let viewport =
        viewport.unwrap_or_else(|| Viewport::new(photo.width() as f32, photo.height() as f32));
    let frame = FrameGeometryCalculator::compute(viewport, document_type);
    render_guide_overlay(photo.as_dynamic(), &frame, viewport)
        .save(output)
        .map_err(|e| ClipscanError::ImageError(format!("{}: {e}", output.display())))?;
    info!(output = %output.display(), "preview written");
    Ok(frame)
}

fn image_viewport(path: &Path) -> Result<Viewport> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| ClipscanError::CaptureFailed(format!("{}: {e}", path.display())))?;
    Ok(Viewport::new(width as f32, height as f32))
}
