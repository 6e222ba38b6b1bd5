// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Maps the server's JSON envelope to `ScanDocumentResponse` and classifies
// it by `resCd`.

use clipscan_core::error::{ClipscanError, Result};
use clipscan_core::types::ScanDocumentResponse;
use serde::Deserialize;
use serde_json::Value;

/// Wire shape of the response. Every field is kept loose so a value of the
/// wrong JSON type never hides `resCd` from classification.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireResponse {
    res_cd: Option<Value>,
    res_msg: Option<Value>,
    ocr_number: Option<Value>,
    ocr_birth_day: Option<Value>,
    ocr_name: Option<Value>,
    ocr_expire_date: Option<Value>,
    ocr_address: Option<Value>,
    ocr_reserved: Option<Value>,
    ocr_image: Option<Value>,
}

/// Strings pass through and numbers are stringified; anything else is absent.
fn loose_field(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn loose_string(value: Option<Value>) -> String {
    loose_field(value).unwrap_or_default()
}

/// Decode a JSON body into a typed response by direct field copy.
///
/// Absent and `null` optional fields become `None`, numeric ones are
/// stringified, and other types are dropped. Only a body that is not a JSON
/// object is reported as a network error.
pub fn map_response(body: Value) -> Result<ScanDocumentResponse> {
    if !body.is_object() {
        return Err(ClipscanError::Network(
            "response body is not a JSON object".into(),
        ));
    }
    let wire: WireResponse = serde_json::from_value(body)
        .map_err(|e| ClipscanError::Network(format!("malformed response body: {e}")))?;

    Ok(ScanDocumentResponse {
        response_code: loose_string(wire.res_cd),
        response_message: loose_string(wire.res_msg),
        ocr_number: loose_field(wire.ocr_number),
        ocr_birth_day: loose_field(wire.ocr_birth_day),
        ocr_name: loose_field(wire.ocr_name),
        ocr_expire_date: loose_field(wire.ocr_expire_date),
        ocr_address: loose_field(wire.ocr_address),
        ocr_reserved_field: loose_field(wire.ocr_reserved),
        ocr_masked_image: loose_field(wire.ocr_image),
    })
}

/// Success iff `resCd == "0000"`; anything else is a server rejection.
pub fn classify(response: ScanDocumentResponse) -> Result<ScanDocumentResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClipscanError::ServerRejected {
            code: response.response_code,
            message: response.response_message,
        })
    }
}
