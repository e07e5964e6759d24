//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe a GET request and the raw transfer it produced as
//! plain data. `OrdersClient` builds `HttpRequest` values and normalizes
//! `TransferResult` values; a `Transport` sits in between and is the only
//! piece that touches the network.
//!
//! All fields use owned types (`String`, `Vec`) so values can be stored,
//! compared in tests, and handed to any transport without lifetime concerns.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timeout applied when neither the client nor the call sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Redirect limit applied when neither the client nor the call sets one.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Caller-tunable transport settings.
///
/// Options are layered: built-in defaults, then the client's options, then
/// the per-call options. Each layer only overrides what it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub max_redirects: Option<u32>,
    /// Extra request headers. A header here replaces any generated header
    /// with the same name (compared case-insensitively).
    pub headers: Vec<(String, String)>,
}

impl TransportOptions {
    /// The built-in defaults: 30 second timeout, up to 10 redirects.
    pub fn defaults() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            max_redirects: Some(DEFAULT_MAX_REDIRECTS),
            headers: Vec::new(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = Some(max_redirects);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Layer `overlay` on top of `self`; values set in `overlay` win.
    pub fn merge(&self, overlay: &TransportOptions) -> TransportOptions {
        let mut headers = self.headers.clone();
        for (name, value) in &overlay.headers {
            set_header(&mut headers, name, value);
        }
        TransportOptions {
            timeout: overlay.timeout.or(self.timeout),
            max_redirects: overlay.max_redirects.or(self.max_redirects),
            headers,
        }
    }
}

/// Replace the first header named `name` (case-insensitive) or append it.
pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        Some(existing) => *existing = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// A fully built GET request described as plain data.
///
/// Produced by `OrdersClient::build`. `headers` already contains every
/// header to send, in order; `options` carries the merged timeout and
/// redirect settings for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub options: TransportOptions,
}

impl HttpRequest {
    /// Look up a request header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Metadata reported by the transport about one transfer.
///
/// Passed through to `OperationResult::info` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferInfo {
    pub url: String,
    /// HTTP status of the final response; 0 when no response arrived.
    pub http_code: u16,
    pub content_type: Option<String>,
    /// Length in bytes of the header block at the front of `TransferResult::raw`.
    pub header_size: usize,
    /// 0 when the transport does not report redirects.
    pub redirect_count: u32,
    /// Wall-clock seconds from dispatch until the body was read.
    pub total_time: f64,
    pub size_download: usize,
    /// `None` when the transport does not expose the connected peer.
    pub primary_ip: Option<String>,
    pub primary_port: Option<u16>,
    /// Anything else the transport reports (`connect_time`, `local_ip`, ...),
    /// kept under its own name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The raw outcome of one transfer, as produced by a `Transport`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferResult {
    pub info: TransferInfo,
    /// Header block immediately followed by the response body.
    pub raw: Vec<u8>,
    /// Transport-level failure message; empty when the transfer completed.
    pub error: String,
}

impl TransferResult {
    /// A transfer that never produced a response.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            info: TransferInfo {
                url: url.into(),
                ..TransferInfo::default()
            },
            raw: Vec::new(),
            error: error.into(),
        }
    }
}
