// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for document capture and upload.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response code the OCR server returns on success.
pub const SUCCESS_CODE: &str = "0000";

/// A kind of identity document the user can scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentType {
    /// Server-side `ocrType` code, e.g. `"01"`.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Passport-like booklets use a squarer guide frame than cards.
    pub is_passport_type: bool,
}

impl DocumentType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_passport_type: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_passport_type,
        }
    }

    /// Width-to-height ratio of the physical document.
    ///
    /// ICAO passport data page: 125mm x 88mm. ID-1 cards: 85.6mm x 54mm.
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_passport_type { 1.4 } else { 1.6 }
    }

    /// Filename the image part is uploaded under.
    pub fn upload_filename(&self) -> String {
        format!("document_{}.jpg", self.id)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Screen dimensions of the camera preview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Guide rectangle the user aligns the document within, in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FrameRect {
    /// Integer pixel size handed to the cropper as its target output size.
    pub fn crop_size(&self) -> CropSize {
        CropSize {
            width: self.width.round().max(1.0) as u32,
            height: self.height.round().max(1.0) as u32,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Target output dimensions for the crop step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSize {
    pub width: u32,
    pub height: u32,
}

/// Unique identifier for one capture. A retake always yields a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A photo ready for upload, together with the type it was framed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub id: CaptureId,
    /// Local file path or platform URI of the encoded image.
    pub path: PathBuf,
    pub document_type: DocumentType,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(path: impl Into<PathBuf>, document_type: DocumentType) -> Self {
        Self {
            id: CaptureId::new(),
            path: path.into(),
            document_type,
            captured_at: Utc::now(),
        }
    }
}

/// Scalar fields of a scan request. The image travels separately as a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDocumentRequest {
    pub user_id: String,
    pub document_type_id: String,
    pub country_code: Option<String>,
}

/// OCR values already extracted (and possibly corrected by the user).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrFields {
    pub ocr_number: Option<String>,
    /// `YYYYMMDD`.
    pub ocr_birth_day: Option<String>,
    pub ocr_name: Option<String>,
    pub ocr_expire_date: Option<String>,
    pub ocr_address: Option<String>,
    pub ocr_reserved: Option<String>,
}

impl OcrFields {
    /// Present, non-empty fields paired with their wire names.
    pub fn wire_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("ocrNumber", &self.ocr_number),
            ("ocrBirthDay", &self.ocr_birth_day),
            ("ocrName", &self.ocr_name),
            ("ocrExpireDate", &self.ocr_expire_date),
            ("ocrAddress", &self.ocr_address),
            ("ocrReserved", &self.ocr_reserved),
        ]
        .into_iter()
        .filter_map(|(name, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((name, v)),
            _ => None,
        })
        .collect()
    }
}

/// Request to persist OCR values alongside the source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOcrRequest {
    pub user_id: String,
    pub document_type_id: String,
    pub country_code: Option<String>,
    pub fields: OcrFields,
}

impl From<&ScanDocumentResponse> for OcrFields {
    fn from(resp: &ScanDocumentResponse) -> Self {
        Self {
            ocr_number: resp.ocr_number.clone(),
            ocr_birth_day: resp.ocr_birth_day.clone(),
            ocr_name: resp.ocr_name.clone(),
            ocr_expire_date: resp.ocr_expire_date.clone(),
            ocr_address: resp.ocr_address.clone(),
            ocr_reserved: resp.ocr_reserved_field.clone(),
        }
    }
}

/// Typed server response. Optional OCR fields are only meaningful when
/// `response_code` is [`SUCCESS_CODE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDocumentResponse {
    pub response_code: String,
    pub response_message: String,
    pub ocr_number: Option<String>,
    pub ocr_birth_day: Option<String>,
    pub ocr_name: Option<String>,
    pub ocr_expire_date: Option<String>,
    pub ocr_address: Option<String>,
    pub ocr_reserved_field: Option<String>,
    /// Server-masked copy of the document image (base64).
    pub ocr_masked_image: Option<String>,
}

impl ScanDocumentResponse {
    pub fn is_success(&self) -> bool {
        self.response_code == SUCCESS_CODE
    }
}
