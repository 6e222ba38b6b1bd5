// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// clipscan-client — Uploads document photos to the OCR server.
//
// `POST {server}/ocr/scan` sends a photo for recognition; `POST
// {server}/ocr/save` stores already-extracted values with the photo. Both are
// multipart/form-data and answer with the same JSON envelope, classified by
// its `resCd` field.

pub mod client;
pub mod form;
pub mod response;
pub mod uploader;

pub use client::DocumentScanClient;
pub use response::map_response;
pub use uploader::DocumentUploader;

/// Logging target for upload requests.
pub const CLIENT_TARGET: &str = "clipscan_client";

/// Path appended to the server URL for recognition requests.
pub const SCAN_PATH: &str = "/ocr/scan";

/// Path appended to the server URL for saving OCR values.
pub const SAVE_PATH: &str = "/ocr/save";
