//! The network seam between request building and response normalization.
//!
//! # Design
//! `Transport` is the only trait in the crate that performs I/O. It turns an
//! `HttpRequest` into a `TransferResult` and never fails: anything that goes
//! wrong on the wire is reported as the result's `error` string, leaving the
//! caller with a well-formed envelope either way.
//!
//! `UreqTransport` re-assembles the response status line and headers into a
//! raw header block in front of the body, so the normalizer handles every
//! transport the same way.

use std::time::Instant;

use tracing::{debug, warn};
use ureq::ResponseExt;
use url::Url;

use crate::http::{HttpRequest, TransferInfo, TransferResult, DEFAULT_MAX_REDIRECTS};

/// Executes a single GET and reports what happened.
pub trait Transport: Send + Sync {
    fn get(&self, request: &HttpRequest) -> TransferResult;
}

/// Blocking transport backed by `ureq`.
///
/// A fresh agent is built per call so each request gets exactly the timeout
/// and redirect limit carried in its `options`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> TransferResult {
        // Non-2xx statuses are data for the caller, not transport errors.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.options.timeout)
            .max_redirects(request.options.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS))
            .build()
            .new_agent();

        let mut builder = agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let started = Instant::now();
        let mut response = match builder.call() {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "transfer failed");
                let mut transfer = TransferResult::failed(&request.url, e.to_string());
                transfer.info.total_time = started.elapsed().as_secs_f64();
                return transfer;
            }
        };

        let status = response.status();
        let mut head = format!(
            "{:?} {} {}\r\n",
            response.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
        for (name, value) in response.headers() {
            head.push_str(name.as_str());
            head.push_str(": ");
            head.push_str(&String::from_utf8_lossy(value.as_bytes()));
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let final_url = response.get_uri().to_string();

        let (body, error) = match response.body_mut().read_to_vec() {
            Ok(body) => (body, String::new()),
            Err(e) => {
                warn!(url = %request.url, error = %e, "failed to read response body");
                (Vec::new(), e.to_string())
            }
        };
        let total_time = started.elapsed().as_secs_f64();
        debug!(url = %final_url, status = status.as_u16(), total_time, "transfer complete");

        let info = TransferInfo {
            primary_port: Url::parse(&final_url)
                .ok()
                .and_then(|u| u.port_or_known_default()),
            url: final_url,
            http_code: status.as_u16(),
            content_type,
            header_size: head.len(),
            redirect_count: 0,
            total_time,
            size_download: body.len(),
            primary_ip: None,
            extra: Default::default(),
        };

        let mut raw = head.into_bytes();
        raw.extend_from_slice(&body);
        TransferResult { info, raw, error }
    }
}
