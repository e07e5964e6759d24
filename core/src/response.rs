//! Normalization of a raw transfer into the `{info, error, headers, response}`
//! envelope every operation returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::headers::parse_headers;
use crate::http::{TransferInfo, TransferResult};

/// The result of one Orders operation.
///
/// A non-empty `error` means the transfer itself failed (DNS, TLS, timeout,
/// reset) and `headers`/`response` should not be trusted. A completed
/// transfer with a non-2xx `info.http_code` is not an error at this layer;
/// inspect `info.http_code` and `response` (or `api_errors`) instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub info: TransferInfo,
    pub error: String,
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON body; `None` when the body was empty or not JSON.
    pub response: Option<Value>,
}

/// One entry of the SP-API `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl OperationResult {
    pub fn is_transport_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// True when the transfer completed with a 2xx status.
    pub fn is_success(&self) -> bool {
        !self.is_transport_error() && (200..300).contains(&self.info.http_code)
    }

    /// The `payload.NextToken` cursor of a `getOrders` page, if present.
    pub fn next_token(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .get("payload")?
            .get("NextToken")?
            .as_str()
    }

    /// Errors reported by the API in the body's `errors` array.
    pub fn api_errors(&self) -> Vec<ApiError> {
        self.response
            .as_ref()
            .and_then(|body| body.get("errors"))
            .and_then(|errors| serde_json::from_value(errors.clone()).ok())
            .unwrap_or_default()
    }
}

/// Split `transfer.raw` at `info.header_size`, parse the header block and
/// decode the body. Never fails: an out-of-range header size is clamped and
/// an undecodable body becomes `None`.
pub fn normalize(transfer: TransferResult) -> OperationResult {
    let TransferResult { info, raw, error } = transfer;
    let split = info.header_size.min(raw.len());
    let (head, body) = raw.split_at(split);

    let headers = parse_headers(&String::from_utf8_lossy(head));
    let response = decode_body(body);

    OperationResult {
        info,
        error,
        headers,
        response,
    }
}

fn decode_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(e) => {
            trace!(error = %e, len = body.len(), "response body is not JSON");
            None
        }
    }
}
