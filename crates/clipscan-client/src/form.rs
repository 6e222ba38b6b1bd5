// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart bodies for the scan and save endpoints.

use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::types::{SaveOcrRequest, ScanDocumentRequest};
use reqwest::multipart::{Form, Part};

/// Form field carrying the image file.
pub const DOCUMENT_FIELD: &str = "document";

const IMAGE_MIME: &str = "image/jpeg";

fn document_part(image: Vec<u8>, document_type_id: &str) -> Result<Part> {
    Part::bytes(image)
        .file_name(format!("document_{document_type_id}.jpg"))
        .mime_str(IMAGE_MIME)
        .map_err(|e| ClipscanError::Config(format!("invalid MIME type '{IMAGE_MIME}': {e}")))
}

fn with_identity(form: Form, user_id: &str, document_type_id: &str, country_code: Option<&str>) -> Form {
    let form = form
        .text("mbUid", user_id.to_string())
        .text("ocrType", document_type_id.to_string());
    match country_code.filter(|c| !c.is_empty()) {
        Some(code) => form.text("countryCode", code.to_string()),
        None => form,
    }
}

/// `document`, `mbUid`, `ocrType`, and `countryCode` when given.
pub fn scan_form(request: &ScanDocumentRequest, image: Vec<u8>) -> Result<Form> {
    let form = Form::new().part(DOCUMENT_FIELD, document_part(image, &request.document_type_id)?);
    Ok(with_identity(
        form,
        &request.user_id,
        &request.document_type_id,
        request.country_code.as_deref(),
    ))
}

/// The scan fields plus every present OCR value.
pub fn save_form(request: &SaveOcrRequest, image: Vec<u8>) -> Result<Form> {
    let mut form = with_identity(
        Form::new(),
        &request.user_id,
        &request.document_type_id,
        request.country_code.as_deref(),
    );
    for (name, value) in request.fields.wire_pairs() {
        form = form.text(name, value.to_string());
    }
    Ok(form.part(DOCUMENT_FIELD, document_part(image, &request.document_type_id)?))
}
