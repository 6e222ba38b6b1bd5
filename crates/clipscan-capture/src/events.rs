// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Events delivered to the host UI, and an observer adapter for hosts that
// prefer callbacks to a channel.

use std::sync::Arc;

use clipscan_core::human_errors::HumanError;
use clipscan_core::types::{CapturedImage, ScanDocumentResponse};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::state::CapturePhase;

/// Something the host UI should react to.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    StateChanged { from: CapturePhase, to: CapturePhase },
    /// A photo (cropped, when a cropper is configured) is ready.
    ImageCaptured(CapturedImage),
    /// The server accepted the document.
    ScanComplete(ScanDocumentResponse),
    /// A recoverable error to show the user.
    Error(HumanError),
    /// The user asked to leave the scanner.
    Back,
}

/// Callback-style listener. Every method defaults to a no-op.
pub trait CaptureObserver: Send + Sync {
    fn on_state_changed(&self, _from: CapturePhase, _to: CapturePhase) {}
    fn on_image_captured(&self, _image: &CapturedImage) {}
    fn on_scan_complete(&self, _response: &ScanDocumentResponse) {}
    fn on_error(&self, _error: &HumanError) {}
    fn on_back(&self) {}
}

/// Forward events from `rx` to `observer` until the coordinator is dropped.
pub fn spawn_observer(
    mut rx: broadcast::Receiver<CaptureEvent>,
    observer: Arc<dyn CaptureObserver>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => dispatch(observer.as_ref(), &event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "capture observer lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn dispatch(observer: &dyn CaptureObserver, event: &CaptureEvent) {
    match event {
        CaptureEvent::StateChanged { from, to } => observer.on_state_changed(*from, *to),
        CaptureEvent::ImageCaptured(image) => observer.on_image_captured(image),
        CaptureEvent::ScanComplete(response) => observer.on_scan_complete(response),
        CaptureEvent::Error(error) => observer.on_error(error),
        CaptureEvent::Back => observer.on_back(),
    }
}
