// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP client for the OCR scan/save endpoints.
//
// One request per call: no retries, no caching, nothing persisted. Transport
// failures and unusable bodies become `Network`; a decoded envelope is
// classified by `resCd` alone, whatever the HTTP status.

use std::path::Path;

use async_trait::async_trait;
use clipscan_core::config::ScannerConfig;
use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::locator::ResourceLocator;
use clipscan_core::types::{DocumentType, SaveOcrRequest, ScanDocumentRequest, ScanDocumentResponse};
use reqwest::Client;
use reqwest::multipart::Form;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::form::{save_form, scan_form};
use crate::response::{classify, map_response};
use crate::uploader::DocumentUploader;
use crate::{CLIENT_TARGET, SAVE_PATH, SCAN_PATH};

/// Uploads document photos to a configured OCR server.
///
/// ```ignore
/// let client = DocumentScanClient::new(&ScannerConfig::new("https://ocr.example.com", "u1"))?;
/// let resp = client.scan(Path::new("/tmp/crop.jpg"), &passport, "u1", Some("KR")).await?;
/// println!("{:?}", resp.ocr_name);
/// ```
#[derive(Debug, Clone)]
pub struct DocumentScanClient {
    http: Client,
    base_url: Url,
    locator: ResourceLocator,
}

impl DocumentScanClient {
    /// Build a client from the scanner configuration.
    ///
    /// A timeout is applied only when `request_timeout_secs` is set.
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let base_url = config.server_base_url()?;
        let mut builder =
            Client::builder().user_agent(concat!("clipscan/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClipscanError::Config(format!("failed to build HTTP client: {e}")))?;

        debug!(
            target: CLIENT_TARGET,
            base_url = %base_url,
            timeout = ?config.request_timeout(),
            "document scan client initialised"
        );

        Ok(Self {
            http,
            base_url,
            locator: ResourceLocator::new(config.platform),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a photo for recognition via `POST {server}/ocr/scan`.
    pub async fn scan(
        &self,
        image_path: &Path,
        document_type: &DocumentType,
        user_id: &str,
        country_code: Option<&str>,
    ) -> Result<ScanDocumentResponse> {
        let request = ScanDocumentRequest {
            user_id: user_id.to_string(),
            document_type_id: document_type.id.clone(),
            country_code: country_code.map(str::to_string),
        };
        let image = self.read_image(image_path).await?;
        info!(
            target: CLIENT_TARGET,
            ocr_type = %request.document_type_id,
            bytes = image.len(),
            "sending document for scan"
        );
        let form = scan_form(&request, image)?;
        self.post_form(self.endpoint(SCAN_PATH)?, form).await
    }

    /// Store extracted OCR values with the photo via `POST {server}/ocr/save`.
    pub async fn save_ocr(
        &self,
        request: &SaveOcrRequest,
        image_path: &Path,
    ) -> Result<ScanDocumentResponse> {
        let image = self.read_image(image_path).await?;
        info!(
            target: CLIENT_TARGET,
            ocr_type = %request.document_type_id,
            fields = request.fields.wire_pairs().len(),
            "saving OCR values"
        );
        let form = save_form(request, image)?;
        self.post_form(self.endpoint(SAVE_PATH)?, form).await
    }

    /// `{server_url}{path}`, appended rather than URL-joined so a base with
    /// its own path prefix keeps it.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| ClipscanError::Config(format!("invalid endpoint URL: {e}")))
    }

    async fn read_image(&self, locator: &Path) -> Result<Vec<u8>> {
        let path = self.locator.to_local_path(locator);
        tokio::fs::read(&path).await.map_err(|e| {
            ClipscanError::Network(format!("could not read image {}: {e}", path.display()))
        })
    }

    async fn post_form(&self, url: Url, form: Form) -> Result<ScanDocumentResponse> {
        debug!(target: CLIENT_TARGET, url = %url, "POST multipart");

        let response = self
            .http
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        let json: Value = serde_json::from_slice(&body).map_err(|_| {
            warn!(target: CLIENT_TARGET, status = status.as_u16(), "non-JSON response body");
            ClipscanError::Network(format!("unexpected non-JSON response (HTTP {status})"))
        })?;

        let result = map_response(json).and_then(classify);
        match &result {
            Ok(resp) => info!(
                target: CLIENT_TARGET,
                res_cd = %resp.response_code,
                "server accepted document"
            ),
            Err(ClipscanError::ServerRejected { code, message }) => warn!(
                target: CLIENT_TARGET,
                res_cd = %code,
                res_msg = %message,
                "server rejected document"
            ),
            Err(e) => warn!(target: CLIENT_TARGET, error = %e, "unusable response"),
        }
        result
    }
}

fn transport_error(err: reqwest::Error) -> ClipscanError {
    if err.is_timeout() {
        ClipscanError::Network(format!("request timed out: {err}"))
    } else {
        ClipscanError::Network(err.to_string())
    }
}

#[async_trait]
impl DocumentUploader for DocumentScanClient {
    async fn scan(
        &self,
        image_path: &Path,
        document_type: &DocumentType,
        user_id: &str,
        country_code: Option<&str>,
    ) -> Result<ScanDocumentResponse> {
        DocumentScanClient::scan(self, image_path, document_type, user_id, country_code).await
    }

    async fn save_ocr(
        &self,
        request: &SaveOcrRequest,
        image_path: &Path,
    ) -> Result<ScanDocumentResponse> {
        DocumentScanClient::save_ocr(self, request, image_path).await
    }
}
