// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload seam used by the capture coordinator.

use std::path::Path;

use async_trait::async_trait;
use clipscan_core::error::Result;
use clipscan_core::types::{DocumentType, SaveOcrRequest, ScanDocumentResponse};

/// Sends a captured document to the OCR server.
///
/// `Ok` is only returned for a semantic success (`resCd == "0000"`).
#[async_trait]
pub trait DocumentUploader: Send + Sync {
    async fn scan(
        &self,
        image_path: &Path,
        document_type: &DocumentType,
        user_id: &str,
        country_code: Option<&str>,
    ) -> Result<ScanDocumentResponse>;

    async fn save_ocr(
        &self,
        request: &SaveOcrRequest,
        image_path: &Path,
    ) -> Result<ScanDocumentResponse>;
}
