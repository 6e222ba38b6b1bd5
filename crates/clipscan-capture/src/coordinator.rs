// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture coordinator — drives one capture-to-upload cycle at a time.
//
// Every transition is caller-driven or result-driven; nothing happens on a
// timer and nothing is retried automatically. The session lock is never held
// across an await, so a second request arriving mid-capture or mid-upload
// sees the busy state and is rejected instead of queued.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clipscan_bridge::{CropOutcome, CropRequest, NativeCamera, NativeCropper, PermissionStatus};
use clipscan_client::DocumentUploader;
use clipscan_core::config::ScannerConfig;
use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::geometry::FrameGeometryCalculator;
use clipscan_core::human_errors::humanize_error;
use clipscan_core::locator::ResourceLocator;
use clipscan_core::registry::DocumentRegistry;
use clipscan_core::types::{
    CapturedImage, DocumentType, FrameRect, OcrFields, SaveOcrRequest, ScanDocumentResponse,
    Viewport,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::CaptureEvent;
use crate::state::{CapturePhase, CaptureState};

const EVENT_CAPACITY: usize = 64;

/// Result of a capture attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Captured(CapturedImage),
    /// The user backed out of the cropper; the preview is live again.
    Cancelled,
}

enum UploadKind {
    Scan,
    SaveOcr(OcrFields),
}

struct Session {
    state: CaptureState,
    selected: DocumentType,
    viewport: Viewport,
    frame: FrameRect,
}

struct Inner {
    config: ScannerConfig,
    registry: DocumentRegistry,
    camera: Arc<dyn NativeCamera>,
    cropper: Option<Arc<dyn NativeCropper>>,
    uploader: Arc<dyn DocumentUploader>,
    events: broadcast::Sender<CaptureEvent>,
    session: Mutex<Session>,
}

/// Assembles a [`CaptureCoordinator`] from its collaborators.
pub struct CaptureCoordinatorBuilder {
    config: ScannerConfig,
    registry: DocumentRegistry,
    camera: Arc<dyn NativeCamera>,
    cropper: Option<Arc<dyn NativeCropper>>,
    uploader: Arc<dyn DocumentUploader>,
    viewport: Viewport,
}

impl CaptureCoordinatorBuilder {
    /// Replace the default document-type table.
    pub fn registry(mut self, registry: DocumentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Enable the crop step. Ignored when `crop_enabled` is off in the config.
    pub fn cropper(mut self, cropper: Arc<dyn NativeCropper>) -> Self {
        self.cropper = Some(cropper);
        self
    }

    pub fn build(self) -> CaptureCoordinator {
        let selected = self.registry.default_type().clone();
        let frame = FrameGeometryCalculator::compute(self.viewport, &selected);
        let cropper = self.cropper.filter(|_| self.config.crop_enabled);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            document_type = %selected.id,
            crop = cropper.is_some(),
            "capture coordinator ready"
        );

        CaptureCoordinator {
            inner: Arc::new(Inner {
                config: self.config,
                registry: self.registry,
                camera: self.camera,
                cropper,
                uploader: self.uploader,
                events,
                session: Mutex::new(Session {
                    state: CaptureState::AwaitingPermission,
                    selected,
                    viewport: self.viewport,
                    frame,
                }),
            }),
        }
    }
}

/// Cheaply cloneable handle to one scanner screen's capture cycle.
#[derive(Clone)]
pub struct CaptureCoordinator {
    inner: Arc<Inner>,
}

impl CaptureCoordinator {
    pub fn new(
        config: ScannerConfig,
        registry: DocumentRegistry,
        camera: Arc<dyn NativeCamera>,
        cropper: Option<Arc<dyn NativeCropper>>,
        uploader: Arc<dyn DocumentUploader>,
        viewport: Viewport,
    ) -> Self {
        let mut builder = Self::builder(config, camera, uploader, viewport).registry(registry);
        builder.cropper = cropper;
        builder.build()
    }

    pub fn builder(
        config: ScannerConfig,
        camera: Arc<dyn NativeCamera>,
        uploader: Arc<dyn DocumentUploader>,
        viewport: Viewport,
    ) -> CaptureCoordinatorBuilder {
        CaptureCoordinatorBuilder {
            config,
            registry: DocumentRegistry::default(),
            camera,
            cropper: None,
            uploader,
            viewport,
        }
    }

    // -- Observation ----------------------------------------------------------

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.inner.events.subscribe()
    }

    pub fn phase(&self) -> CapturePhase {
        self.session().state.phase()
    }

    pub fn state(&self) -> CaptureState {
        self.session().state.clone()
    }

    pub fn captured_image(&self) -> Option<CapturedImage> {
        self.session().state.image().cloned()
    }

    pub fn frame(&self) -> FrameRect {
        self.session().frame
    }

    pub fn viewport(&self) -> Viewport {
        self.session().viewport
    }

    pub fn selected_document_type(&self) -> DocumentType {
        self.session().selected.clone()
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.inner.config
    }

    // -- Permission -----------------------------------------------------------

    /// Move to `Ready` if the OS already reports permission as granted.
    pub fn check_permission(&self) -> CapturePhase {
        let status = self.inner.camera.permission_status();
        debug!(?status, "camera permission checked");
        if status.is_granted() {
            let _ = self.apply_permission(status);
        }
        self.phase()
    }

    /// Prompt for camera permission. Denial leaves the screen in
    /// `AwaitingPermission` so the prompt can be offered again.
    pub async fn request_permission(&self) -> Result<()> {
        if self.phase() != CapturePhase::AwaitingPermission {
            return Ok(());
        }
        let camera = Arc::clone(&self.inner.camera);
        let status = run_blocking(move || camera.request_permission()).await?;
        self.apply_permission(status)
    }

    fn apply_permission(&self, status: PermissionStatus) -> Result<()> {
        let mut session = self.session();
        if session.state.phase() != CapturePhase::AwaitingPermission {
            return Ok(());
        }
        if status.is_granted() {
            self.transition(&mut session, CaptureState::Ready);
            Ok(())
        } else {
            warn!(?status, "camera permission not granted");
            let err = ClipscanError::PermissionDenied;
            self.emit(CaptureEvent::Error(humanize_error(&err)));
            Err(err)
        }
    }

    // -- Frame ----------------------------------------------------------------

    /// Change the document type and recompute the guide frame.
    pub fn select_document_type(&self, id: &str) -> Result<FrameRect> {
        let document_type = self.inner.registry.require(id)?.clone();
        let mut session = self.session();
        let phase = session.state.phase();
        if phase.locks_document_type() {
            return Err(ClipscanError::DocumentTypeLocked(phase.name()));
        }
        session.frame = FrameGeometryCalculator::compute(session.viewport, &document_type);
        info!(document_type = %document_type.id, "document type selected");
        session.selected = document_type;
        Ok(session.frame)
    }

    /// Recompute the guide frame after a resize or rotation.
    pub fn set_viewport(&self, viewport: Viewport) -> FrameRect {
        let mut session = self.session();
        session.viewport = viewport;
        session.frame = FrameGeometryCalculator::compute(viewport, &session.selected);
        debug!(width = viewport.width, height = viewport.height, "viewport changed");
        session.frame
    }

    // -- Capture --------------------------------------------------------------

    /// Take a photo, crop it to the guide frame when a cropper is configured,
    /// and hold the result in `Captured`.
    pub async fn capture(&self) -> Result<CaptureOutcome> {
        let (document_type, frame, viewport) = {
            let mut session = self.session();
            let phase = session.state.phase();
            if !phase.can_capture() {
                return Err(invalid("capture", phase));
            }
            self.transition(&mut session, CaptureState::Capturing);
            (session.selected.clone(), session.frame, session.viewport)
        };
        let _abandoned = self.busy_guard(CaptureState::Ready);

        let camera = Arc::clone(&self.inner.camera);
        let photo = match run_blocking(move || camera.take_photo()).await {
            Ok(photo) => photo,
            Err(ClipscanError::PermissionDenied) => {
                let mut session = self.session();
                self.transition(&mut session, CaptureState::AwaitingPermission);
                let err = ClipscanError::PermissionDenied;
                self.emit(CaptureEvent::Error(humanize_error(&err)));
                return Err(err);
            }
            Err(err @ ClipscanError::CaptureFailed(_)) => return Err(self.back_to_ready(err)),
            Err(other) => {
                return Err(self.back_to_ready(ClipscanError::CaptureFailed(other.to_string())));
            }
        };
        debug!(photo = %photo.display(), "photo taken");

        let path = match self.inner.cropper.clone() {
            Some(cropper) => match self.crop(cropper, photo, frame, viewport).await? {
                Some(cropped) => cropped,
                None => return Ok(CaptureOutcome::Cancelled),
            },
            None => photo,
        };

        let image = CapturedImage::new(path, document_type);
        {
            let mut session = self.session();
            self.transition(&mut session, CaptureState::Captured(image.clone()));
        }
        info!(
            capture_id = %image.id,
            path = %image.path.display(),
            document_type = %image.document_type.id,
            "image captured"
        );
        self.emit(CaptureEvent::ImageCaptured(image.clone()));
        Ok(CaptureOutcome::Captured(image))
    }

    /// `Ok(None)` when the user cancelled the cropper.
    async fn crop(
        &self,
        cropper: Arc<dyn NativeCropper>,
        photo: PathBuf,
        frame: FrameRect,
        viewport: Viewport,
    ) -> Result<Option<PathBuf>> {
        let request = CropRequest::new(&photo, frame, viewport);
        {
            let mut session = self.session();
            self.transition(
                &mut session,
                CaptureState::Cropping {
                    photo: photo.clone(),
                },
            );
        }

        let outcome = run_blocking(move || cropper.crop(&request)).await;
        // The uncropped photo is never needed past this point.
        if !matches!(&outcome, Ok(CropOutcome::Cropped(path)) if *path == photo) {
            self.discard_file(&photo);
        }

        match outcome {
            Ok(CropOutcome::Cropped(path)) => Ok(Some(path)),
            Ok(CropOutcome::Cancelled) => {
                info!("crop cancelled by user");
                let mut session = self.session();
                self.transition(&mut session, CaptureState::Ready);
                Ok(None)
            }
            Err(err @ ClipscanError::CropFailed(_)) => Err(self.back_to_ready(err)),
            Err(other) => Err(self.back_to_ready(ClipscanError::CropFailed(other.to_string()))),
        }
    }

    /// Drop the held image, delete its file, and go back to the live preview.
    pub fn retake(&self) -> Result<()> {
        let discarded = {
            let mut session = self.session();
            let phase = session.state.phase();
            if !matches!(phase, CapturePhase::Captured | CapturePhase::Failed) {
                return Err(invalid("retake", phase));
            }
            let discarded = session.state.image().cloned();
            self.transition(&mut session, CaptureState::Ready);
            discarded
        };
        if let Some(image) = discarded {
            debug!(capture_id = %image.id, "discarding captured image");
            self.discard_file(&image.path);
        }
        Ok(())
    }

    // -- Upload ---------------------------------------------------------------

    /// Send the held image to `/ocr/scan`.
    pub async fn upload(&self) -> Result<ScanDocumentResponse> {
        self.run_upload(UploadKind::Scan).await
    }

    /// Send the held image with already-extracted values to `/ocr/save`.
    pub async fn save_ocr(&self, fields: OcrFields) -> Result<ScanDocumentResponse> {
        self.run_upload(UploadKind::SaveOcr(fields)).await
    }

    async fn run_upload(&self, kind: UploadKind) -> Result<ScanDocumentResponse> {
        let config = &self.inner.config;
        let image = {
            let mut session = self.session();
            let image = match &session.state {
                CaptureState::Captured(image) | CaptureState::Failed { image, .. } => image.clone(),
                CaptureState::Uploading(image) => {
                    warn!(capture_id = %image.id, "upload rejected: already in flight");
                    return Err(ClipscanError::UploadInFlight);
                }
                other => return Err(invalid("upload", other.phase())),
            };
            if config.user_id.trim().is_empty() {
                return Err(ClipscanError::Config("user_id is required".into()));
            }
            self.transition(&mut session, CaptureState::Uploading(image.clone()));
            image
        };
        let _abandoned = self.busy_guard(CaptureState::Captured(image.clone()));

        let result = match kind {
            UploadKind::Scan => {
                self.inner
                    .uploader
                    .scan(
                        &image.path,
                        &image.document_type,
                        &config.user_id,
                        config.country_code.as_deref(),
                    )
                    .await
            }
            UploadKind::SaveOcr(fields) => {
                let request = SaveOcrRequest {
                    user_id: config.user_id.clone(),
                    document_type_id: image.document_type.id.clone(),
                    country_code: config.country_code.clone(),
                    fields,
                };
                self.inner.uploader.save_ocr(&request, &image.path).await
            }
        };

        let image_path = image.path.clone();
        let mut session = self.session();
        match &result {
            Ok(response) => {
                self.transition(&mut session, CaptureState::Done(response.clone()));
                self.emit(CaptureEvent::ScanComplete(response.clone()));
            }
            Err(err) => {
                let human = humanize_error(err);
                warn!(capture_id = %image.id, error = %err, "upload failed; image kept");
                self.transition(
                    &mut session,
                    CaptureState::Failed {
                        image,
                        message: human.message.clone(),
                    },
                );
                self.emit(CaptureEvent::Error(human));
            }
        }
        drop(session);
        // Once the server has it, the local copy is released.
        if result.is_ok() {
            self.discard_file(&image_path);
        }
        result
    }

    /// Go from `Failed` back to `Captured`, keeping the image.
    pub fn retry_from_failed(&self) -> Result<()> {
        let mut session = self.session();
        let image = match &session.state {
            CaptureState::Failed { image, .. } => image.clone(),
            other => return Err(invalid("retry", other.phase())),
        };
        self.transition(&mut session, CaptureState::Captured(image));
        Ok(())
    }

    /// Start a new cycle from the live preview. Not allowed while the camera,
    /// cropper, or network is busy.
    pub fn reset(&self) -> Result<()> {
        let discarded = {
            let mut session = self.session();
            match session.state.phase() {
                CapturePhase::AwaitingPermission | CapturePhase::Ready => return Ok(()),
                CapturePhase::Captured | CapturePhase::Done | CapturePhase::Failed => {
                    let discarded = session.state.image().map(|image| image.path.clone());
                    self.transition(&mut session, CaptureState::Ready);
                    discarded
                }
                busy => return Err(invalid("reset", busy)),
            }
        };
        if let Some(path) = discarded {
            self.discard_file(&path);
        }
        Ok(())
    }

    /// The user asked to leave the scanner.
    pub fn back(&self) {
        info!("back requested");
        self.emit(CaptureEvent::Back);
    }

    // -- Internals ------------------------------------------------------------

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, session: &mut Session, next: CaptureState) {
        let from = session.state.phase();
        let to = next.phase();
        session.state = next;
        info!(from = %from, to = %to, "capture state changed");
        self.emit(CaptureEvent::StateChanged { from, to });
    }

    /// Best-effort removal of an image file the session no longer owns.
    fn discard_file(&self, path: &Path) {
        let local = ResourceLocator::new(self.inner.config.platform).to_local_path(path);
        match std::fs::remove_file(&local) {
            Ok(()) => debug!(path = %local.display(), "image file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %local.display(), error = %e, "could not remove image file"),
        }
    }

    fn busy_guard(&self, restore: CaptureState) -> BusyGuard<'_> {
        BusyGuard {
            coordinator: self,
            restore: Some(restore),
        }
    }

    fn back_to_ready(&self, err: ClipscanError) -> ClipscanError {
        warn!(error = %err, "capture step failed");
        let mut session = self.session();
        self.transition(&mut session, CaptureState::Ready);
        self.emit(CaptureEvent::Error(humanize_error(&err)));
        err
    }

    fn emit(&self, event: CaptureEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

/// Puts the session back into `restore` if the call that made it busy is
/// dropped before finishing (timeout, `select!`, host screen closed).
/// Completed calls always leave a non-busy state, so this is then a no-op.
struct BusyGuard<'a> {
    coordinator: &'a CaptureCoordinator,
    restore: Option<CaptureState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let Some(restore) = self.restore.take() else {
            return;
        };
        let mut session = self.coordinator.session();
        let phase = session.state.phase();
        if phase.locks_document_type() {
            warn!(phase = %phase, "call abandoned while busy; state restored");
            self.coordinator.transition(&mut session, restore);
        }
    }
}

fn invalid(operation: &'static str, phase: CapturePhase) -> ClipscanError {
    ClipscanError::InvalidState {
        operation,
        state: phase.name(),
    }
}

/// Run a blocking native call off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ClipscanError::CaptureFailed(format!("native call aborted: {e}")))?
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;

    // -- Fakes ------------------------------------------------------------------

    /// Blocks a native call until the test sends a release.
    struct BlockingGate(Mutex<mpsc::Receiver<()>>);

    impl BlockingGate {
        fn new() -> (mpsc::Sender<()>, Self) {
            let (tx, rx) = mpsc::channel();
            (tx, Self(Mutex::new(rx)))
        }

        fn wait(&self) {
            // A dropped sender also releases.
            let _ = self.0.lock().unwrap().recv();
        }
    }

    struct FakeCamera {
        permission: Mutex<PermissionStatus>,
        grant_on_request: bool,
        fail: AtomicBool,
        shots: AtomicUsize,
        gate: Option<BlockingGate>,
    }

    impl FakeCamera {
        fn granted() -> Arc<Self> {
            Arc::new(Self {
                permission: Mutex::new(PermissionStatus::Granted),
                grant_on_request: true,
                fail: AtomicBool::new(false),
                shots: AtomicUsize::new(0),
                gate: None,
            })
        }

        fn gated() -> (mpsc::Sender<()>, Arc<Self>) {
            let (release, gate) = BlockingGate::new();
            let camera = Arc::new(Self {
                permission: Mutex::new(PermissionStatus::Granted),
                grant_on_request: true,
                fail: AtomicBool::new(false),
                shots: AtomicUsize::new(0),
                gate: Some(gate),
            });
            (release, camera)
        }

        fn undetermined(grant_on_request: bool) -> Arc<Self> {
            Arc::new(Self {
                permission: Mutex::new(PermissionStatus::NotDetermined),
                grant_on_request,
                fail: AtomicBool::new(false),
                shots: AtomicUsize::new(0),
                gate: None,
            })
        }
    }

    impl NativeCamera for FakeCamera {
        fn permission_status(&self) -> PermissionStatus {
            *self.permission.lock().unwrap()
        }

        fn request_permission(&self) -> Result<PermissionStatus> {
            let status = if self.grant_on_request {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
            *self.permission.lock().unwrap() = status;
            Ok(status)
        }

        fn take_photo(&self) -> Result<PathBuf> {
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClipscanError::CaptureFailed("sensor busy".into()));
            }
            let n = self.shots.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(PathBuf::from(format!("/photos/shot_{n}.jpg")))
        }
    }

    enum CropBehaviour {
        Crop,
        Cancel,
        Fail,
    }

    struct FakeCropper {
        behaviour: CropBehaviour,
        requests: Mutex<Vec<CropRequest>>,
        gate: Option<BlockingGate>,
    }

    impl FakeCropper {
        fn new(behaviour: CropBehaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                requests: Mutex::new(Vec::new()),
                gate: None,
            })
        }

        fn gated() -> (mpsc::Sender<()>, Arc<Self>) {
            let (release, gate) = BlockingGate::new();
            let cropper = Arc::new(Self {
                behaviour: CropBehaviour::Crop,
                requests: Mutex::new(Vec::new()),
                gate: Some(gate),
            });
            (release, cropper)
        }
    }

    impl NativeCropper for FakeCropper {
        fn crop(&self, request: &CropRequest) -> Result<CropOutcome> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            match self.behaviour {
                CropBehaviour::Crop => {
                    let out = PathBuf::from(format!("{}.crop.jpg", request.source.display()));
                    if request.source.is_file() {
                        std::fs::write(&out, b"cropped").unwrap();
                    }
                    Ok(CropOutcome::Cropped(out))
                }
                CropBehaviour::Cancel => Ok(CropOutcome::Cancelled),
                CropBehaviour::Fail => Err(ClipscanError::CropFailed("decoder error".into())),
            }
        }
    }

    /// Writes a real file per shot so file cleanup can be observed.
    struct DiskCamera {
        dir: tempfile::TempDir,
        shots: AtomicUsize,
    }

    impl DiskCamera {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                dir: tempfile::tempdir().unwrap(),
                shots: AtomicUsize::new(0),
            })
        }
    }

    impl NativeCamera for DiskCamera {
        fn permission_status(&self) -> PermissionStatus {
            PermissionStatus::Granted
        }

        fn request_permission(&self) -> Result<PermissionStatus> {
            Ok(PermissionStatus::Granted)
        }

        fn take_photo(&self) -> Result<PathBuf> {
            let n = self.shots.fetch_add(1, Ordering::SeqCst) + 1;
            let path = self.dir.path().join(format!("shot_{n}.jpg"));
            std::fs::write(&path, b"photo")?;
            Ok(path)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct SentUpload {
        path: PathBuf,
        ocr_type: String,
        user_id: String,
        fields: Option<OcrFields>,
    }

    #[derive(Default)]
    struct FakeUploader {
        replies: Mutex<VecDeque<Result<ScanDocumentResponse>>>,
        sent: Mutex<Vec<SentUpload>>,
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl FakeUploader {
        fn replying(replies: Vec<Result<ScanDocumentResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            })
        }

        fn gated(gate: Arc<Notify>, reply: Result<ScanDocumentResponse>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::from([reply])),
                gate: Some(gate),
                ..Default::default()
            })
        }

        async fn respond(&self, sent: SentUpload) -> Result<ScanDocumentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(sent);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClipscanError::Network("no scripted reply".into())))
        }
    }

    #[async_trait]
    impl DocumentUploader for FakeUploader {
        async fn scan(
            &self,
            image_path: &Path,
            document_type: &DocumentType,
            user_id: &str,
            _country_code: Option<&str>,
        ) -> Result<ScanDocumentResponse> {
            self.respond(SentUpload {
                path: image_path.to_path_buf(),
                ocr_type: document_type.id.clone(),
                user_id: user_id.to_string(),
                fields: None,
            })
            .await
        }

        async fn save_ocr(
            &self,
            request: &SaveOcrRequest,
            image_path: &Path,
        ) -> Result<ScanDocumentResponse> {
            self.respond(SentUpload {
                path: image_path.to_path_buf(),
                ocr_type: request.document_type_id.clone(),
                user_id: request.user_id.clone(),
                fields: Some(request.fields.clone()),
            })
            .await
        }
    }

    fn accepted(name: &str) -> Result<ScanDocumentResponse> {
        Ok(ScanDocumentResponse {
            response_code: "0000".into(),
            response_message: "OK".into(),
            ocr_name: Some(name.into()),
            ..Default::default()
        })
    }

    fn rejected() -> Result<ScanDocumentResponse> {
        Err(ClipscanError::ServerRejected {
            code: "9999".into(),
            message: "invalid image".into(),
        })
    }

    fn viewport() -> Viewport {
        Viewport::new(390.0, 844.0)
    }

    fn build(
        camera: Arc<FakeCamera>,
        cropper: Option<Arc<FakeCropper>>,
        uploader: Arc<FakeUploader>,
    ) -> CaptureCoordinator {
        build_with(camera, cropper, uploader)
    }

    fn build_with(
        camera: Arc<dyn NativeCamera>,
        cropper: Option<Arc<FakeCropper>>,
        uploader: Arc<FakeUploader>,
    ) -> CaptureCoordinator {
        let config = ScannerConfig::new("http://localhost:8080", "member-1");
        let mut builder = CaptureCoordinator::builder(config, camera, uploader, viewport());
        if let Some(cropper) = cropper {
            builder = builder.cropper(cropper);
        }
        let coordinator = builder.build();
        coordinator.check_permission();
        coordinator
    }

    fn drain(rx: &mut broadcast::Receiver<CaptureEvent>) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn captured(outcome: CaptureOutcome) -> CapturedImage {
        match outcome {
            CaptureOutcome::Captured(image) => image,
            CaptureOutcome::Cancelled => panic!("capture was cancelled"),
        }
    }

    // -- Permission -------------------------------------------------------------

    #[tokio::test]
    async fn starts_awaiting_permission_until_granted() {
        let camera = FakeCamera::undetermined(true);
        let coord = CaptureCoordinator::builder(
            ScannerConfig::new("http://localhost:8080", "member-1"),
            camera,
            FakeUploader::replying(vec![]),
            viewport(),
        )
        .build();
        assert_eq!(coord.phase(), CapturePhase::AwaitingPermission);
        assert_eq!(coord.check_permission(), CapturePhase::AwaitingPermission);
        assert!(matches!(
            coord.capture().await,
            Err(ClipscanError::InvalidState { .. })
        ));

        coord.request_permission().await.unwrap();
        assert_eq!(coord.phase(), CapturePhase::Ready);
    }

    #[tokio::test]
    async fn denied_permission_stays_put() {
        let coord = CaptureCoordinator::new(
            ScannerConfig::new("http://localhost:8080", "member-1"),
            DocumentRegistry::default(),
            FakeCamera::undetermined(false),
            None,
            FakeUploader::replying(vec![]),
            viewport(),
        );
        let mut rx = coord.subscribe();

        assert!(matches!(
            coord.request_permission().await,
            Err(ClipscanError::PermissionDenied)
        ));
        assert_eq!(coord.phase(), CapturePhase::AwaitingPermission);
        assert!(drain(&mut rx).iter().any(|e| matches!(e, CaptureEvent::Error(_))));
    }

    // -- Capture ----------------------------------------------------------------

    #[tokio::test]
    async fn capture_without_cropper_holds_photo() {
        let coord = build(FakeCamera::granted(), None, FakeUploader::replying(vec![]));
        let mut rx = coord.subscribe();

        let image = captured(coord.capture().await.unwrap());
        assert_eq!(image.path, PathBuf::from("/photos/shot_1.jpg"));
        assert_eq!(image.document_type.id, "01");
        assert_eq!(coord.phase(), CapturePhase::Captured);

        let events = drain(&mut rx);
        assert!(events.iter().any(
            |e| matches!(e, CaptureEvent::ImageCaptured(img) if img.path == image.path)
        ));
    }

    #[tokio::test]
    async fn cropper_receives_frame_size() {
        let cropper = FakeCropper::new(CropBehaviour::Crop);
        let coord = build(FakeCamera::granted(), Some(cropper.clone()), FakeUploader::replying(vec![]));
        let frame = coord.select_document_type("02").unwrap();

        let image = captured(coord.capture().await.unwrap());
        assert_eq!(image.path, PathBuf::from("/photos/shot_1.jpg.crop.jpg"));
        assert_eq!(image.document_type.id, "02");

        let requests = cropper.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target, frame.crop_size());
        assert_eq!(requests[0].frame, frame);
    }

    #[tokio::test]
    async fn crop_disabled_in_config_skips_cropper() {
        let cropper = FakeCropper::new(CropBehaviour::Crop);
        let mut config = ScannerConfig::new("http://localhost:8080", "member-1");
        config.crop_enabled = false;
        let coord = CaptureCoordinator::builder(
            config,
            FakeCamera::granted(),
            FakeUploader::replying(vec![]),
            viewport(),
        )
        .cropper(cropper.clone())
        .build();
        coord.check_permission();

        let image = captured(coord.capture().await.unwrap());
        assert_eq!(image.path, PathBuf::from("/photos/shot_1.jpg"));
        assert!(cropper.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn crop_cancel_returns_to_ready_silently() {
        let coord = build(
            FakeCamera::granted(),
            Some(FakeCropper::new(CropBehaviour::Cancel)),
            FakeUploader::replying(vec![]),
        );
        let mut rx = coord.subscribe();

        assert_eq!(coord.capture().await.unwrap(), CaptureOutcome::Cancelled);
        assert_eq!(coord.phase(), CapturePhase::Ready);
        assert!(coord.captured_image().is_none());
        assert!(!drain(&mut rx).iter().any(|e| matches!(e, CaptureEvent::Error(_))));
    }

    #[tokio::test]
    async fn crop_failure_returns_to_ready_with_error() {
        let coord = build(
            FakeCamera::granted(),
            Some(FakeCropper::new(CropBehaviour::Fail)),
            FakeUploader::replying(vec![]),
        );
        assert!(matches!(coord.capture().await, Err(ClipscanError::CropFailed(_))));
        assert_eq!(coord.phase(), CapturePhase::Ready);
    }

    #[tokio::test]
    async fn camera_failure_returns_to_ready() {
        let camera = FakeCamera::granted();
        camera.fail.store(true, Ordering::SeqCst);
        let coord = build(camera.clone(), None, FakeUploader::replying(vec![]));
        let mut rx = coord.subscribe();

        assert!(matches!(coord.capture().await, Err(ClipscanError::CaptureFailed(_))));
        assert_eq!(coord.phase(), CapturePhase::Ready);
        assert!(drain(&mut rx).iter().any(|e| matches!(e, CaptureEvent::Error(_))));

        camera.fail.store(false, Ordering::SeqCst);
        assert!(coord.capture().await.is_ok());
    }

    #[tokio::test]
    async fn retake_discards_previous_image() {
        let coord = build(
            FakeCamera::granted(),
            Some(FakeCropper::new(CropBehaviour::Crop)),
            FakeUploader::replying(vec![]),
        );
        let first = captured(coord.capture().await.unwrap());
        coord.retake().unwrap();
        assert_eq!(coord.phase(), CapturePhase::Ready);
        assert!(coord.captured_image().is_none());

        let second = captured(coord.capture().await.unwrap());
        assert_ne!(first.path, second.path);
        assert_ne!(first.id, second.id);
        assert_eq!(coord.captured_image(), Some(second));
    }

    // -- Frame ------------------------------------------------------------------

    #[tokio::test]
    async fn selecting_type_recomputes_frame() {
        let coord = build(FakeCamera::granted(), None, FakeUploader::replying(vec![]));
        let passport = coord.frame();
        let card = coord.select_document_type("03").unwrap();
        assert!(card.height < passport.height);
        assert_eq!(card.width, passport.width);
        assert_eq!(coord.phase(), CapturePhase::Ready);

        assert!(matches!(
            coord.select_document_type("99"),
            Err(ClipscanError::UnknownDocumentType(_))
        ));
    }

    #[tokio::test]
    async fn viewport_change_recomputes_frame() {
        let coord = build(FakeCamera::granted(), None, FakeUploader::replying(vec![]));
        let frame = coord.set_viewport(Viewport::new(844.0, 390.0));
        assert!((frame.width - 844.0 * 0.85).abs() < 1e-3);
        assert_eq!(coord.frame(), frame);
    }

    // -- Upload -----------------------------------------------------------------

    #[tokio::test]
    async fn upload_success_releases_image() {
        let uploader = FakeUploader::replying(vec![accepted("HONG GILDONG")]);
        let coord = build(FakeCamera::granted(), None, uploader.clone());
        let mut rx = coord.subscribe();
        let image = captured(coord.capture().await.unwrap());

        let resp = coord.upload().await.unwrap();
        assert_eq!(resp.ocr_name.as_deref(), Some("HONG GILDONG"));
        assert_eq!(coord.phase(), CapturePhase::Done);
        assert!(coord.captured_image().is_none());

        let sent = uploader.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, image.path);
        assert_eq!(sent[0].ocr_type, "01");
        assert_eq!(sent[0].user_id, "member-1");
        assert!(drain(&mut rx).iter().any(|e| matches!(e, CaptureEvent::ScanComplete(_))));

        coord.reset().unwrap();
        assert_eq!(coord.phase(), CapturePhase::Ready);
    }

    #[tokio::test]
    async fn failed_upload_keeps_image_for_retry() {
        let uploader = FakeUploader::replying(vec![rejected(), accepted("HONG GILDONG")]);
        let coord = build(FakeCamera::granted(), None, uploader.clone());
        let image = captured(coord.capture().await.unwrap());

        assert!(matches!(
            coord.upload().await,
            Err(ClipscanError::ServerRejected { code, .. }) if code == "9999"
        ));
        assert_eq!(coord.phase(), CapturePhase::Failed);
        assert_eq!(coord.captured_image(), Some(image.clone()));
        match coord.state() {
            CaptureState::Failed { message, .. } => assert_eq!(message, "invalid image"),
            other => panic!("unexpected state {other:?}"),
        }

        coord.retry_from_failed().unwrap();
        assert_eq!(coord.phase(), CapturePhase::Captured);
        coord.upload().await.unwrap();

        let sent = uploader.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].path, sent[1].path);
    }

    #[tokio::test]
    async fn upload_can_retry_directly_from_failed() {
        let uploader = FakeUploader::replying(vec![
            Err(ClipscanError::Network("connection refused".into())),
            accepted("X"),
        ]);
        let coord = build(FakeCamera::granted(), None, uploader);
        coord.capture().await.unwrap();
        assert!(coord.upload().await.is_err());
        assert!(coord.upload().await.is_ok());
        assert_eq!(coord.phase(), CapturePhase::Done);
    }

    #[tokio::test]
    async fn second_upload_while_in_flight_is_rejected() {
        let gate = Arc::new(Notify::new());
        let uploader = FakeUploader::gated(gate.clone(), accepted("HONG GILDONG"));
        let coord = build(FakeCamera::granted(), None, uploader.clone());
        coord.capture().await.unwrap();

        let first = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.upload().await })
        };
        while coord.phase() != CapturePhase::Uploading {
            tokio::task::yield_now().await;
        }

        assert!(matches!(coord.upload().await, Err(ClipscanError::UploadInFlight)));
        assert!(matches!(
            coord.select_document_type("02"),
            Err(ClipscanError::DocumentTypeLocked(_))
        ));
        assert!(coord.retake().is_err());
        assert!(coord.reset().is_err());

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
    }

    async fn wait_for(coord: &CaptureCoordinator, phase: CapturePhase) {
        while coord.phase() != phase {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn type_locked_while_capturing_and_cropping() {
        let (release_camera, camera) = FakeCamera::gated();
        let (release_cropper, cropper) = FakeCropper::gated();
        let coord = build(camera, Some(cropper.clone()), FakeUploader::replying(vec![]));
        let frame = coord.select_document_type("03").unwrap();

        let capture = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.capture().await })
        };

        wait_for(&coord, CapturePhase::Capturing).await;
        assert!(matches!(
            coord.select_document_type("01"),
            Err(ClipscanError::DocumentTypeLocked("capturing"))
        ));
        release_camera.send(()).unwrap();

        wait_for(&coord, CapturePhase::Cropping).await;
        assert!(matches!(
            coord.select_document_type("01"),
            Err(ClipscanError::DocumentTypeLocked("cropping"))
        ));
        release_cropper.send(()).unwrap();

        let image = captured(capture.await.unwrap().unwrap());
        assert_eq!(image.document_type.id, "03");
        assert_eq!(cropper.requests.lock().unwrap()[0].frame, frame);
        assert_eq!(coord.selected_document_type().id, "03");
    }

    #[tokio::test]
    async fn abandoned_upload_keeps_image_and_allows_retry() {
        let gate = Arc::new(Notify::new());
        let uploader = FakeUploader::gated(gate.clone(), accepted("HONG GILDONG"));
        let coord = build(FakeCamera::granted(), None, uploader.clone());
        let image = captured(coord.capture().await.unwrap());

        let timed_out = tokio::time::timeout(Duration::from_millis(50), coord.upload()).await;
        assert!(timed_out.is_err());
        assert_eq!(coord.phase(), CapturePhase::Captured);
        assert_eq!(coord.captured_image(), Some(image));
        assert!(coord.select_document_type("02").is_ok());

        gate.notify_one();
        coord.upload().await.unwrap();
        assert_eq!(coord.phase(), CapturePhase::Done);
        assert_eq!(uploader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn abandoned_capture_returns_to_ready() {
        let (release, camera) = FakeCamera::gated();
        let coord = build(camera, None, FakeUploader::replying(vec![]));

        let timed_out = tokio::time::timeout(Duration::from_millis(50), coord.capture()).await;
        assert!(timed_out.is_err());
        assert_eq!(coord.phase(), CapturePhase::Ready);
        assert!(coord.reset().is_ok());

        // One release for the abandoned shot, one for the next.
        release.send(()).unwrap();
        release.send(()).unwrap();
        assert!(coord.capture().await.is_ok());
        assert_eq!(coord.phase(), CapturePhase::Captured);
    }

    #[tokio::test]
    async fn crop_removes_photo_and_retake_removes_crop() {
        let camera = DiskCamera::new();
        let coord = build_with(
            camera.clone(),
            Some(FakeCropper::new(CropBehaviour::Crop)),
            FakeUploader::replying(vec![]),
        );

        let image = captured(coord.capture().await.unwrap());
        assert!(!camera.dir.path().join("shot_1.jpg").exists());
        assert!(image.path.is_file());

        coord.retake().unwrap();
        assert!(!image.path.exists());
    }

    #[tokio::test]
    async fn cancelled_crop_removes_photo() {
        let camera = DiskCamera::new();
        let coord = build_with(
            camera.clone(),
            Some(FakeCropper::new(CropBehaviour::Cancel)),
            FakeUploader::replying(vec![]),
        );
        coord.capture().await.unwrap();
        assert!(!camera.dir.path().join("shot_1.jpg").exists());
    }

    #[tokio::test]
    async fn image_file_kept_until_upload_succeeds() {
        let camera = DiskCamera::new();
        let coord = build_with(
            camera,
            None,
            FakeUploader::replying(vec![rejected(), accepted("HONG GILDONG")]),
        );
        let image = captured(coord.capture().await.unwrap());

        assert!(coord.upload().await.is_err());
        assert!(image.path.is_file());

        coord.upload().await.unwrap();
        assert!(!image.path.exists());
    }

    #[tokio::test]
    async fn save_ocr_sends_fields_with_capture_type() {
        let uploader = FakeUploader::replying(vec![accepted("HONG GILDONG")]);
        let coord = build(FakeCamera::granted(), None, uploader.clone());
        coord.select_document_type("10").unwrap();
        coord.capture().await.unwrap();

        let fields = OcrFields {
            ocr_number: Some("M12345678".into()),
            ..Default::default()
        };
        coord.save_ocr(fields.clone()).await.unwrap();

        let sent = uploader.sent.lock().unwrap().clone();
        assert_eq!(sent[0].ocr_type, "10");
        assert_eq!(sent[0].fields, Some(fields));
    }

    #[tokio::test]
    async fn upload_requires_captured_image() {
        let coord = build(FakeCamera::granted(), None, FakeUploader::replying(vec![]));
        assert!(matches!(
            coord.upload().await,
            Err(ClipscanError::InvalidState { operation: "upload", .. })
        ));
    }

    #[tokio::test]
    async fn back_is_emitted() {
        let coord = build(FakeCamera::granted(), None, FakeUploader::replying(vec![]));
        let mut rx = coord.subscribe();
        coord.back();
        assert!(matches!(drain(&mut rx).as_slice(), [CaptureEvent::Back]));
    }
}
