//! Request header values and response header parsing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

pub const ACCEPT: &str = "accept";
pub const ACCESS_TOKEN: &str = "x-amz-access-token";
pub const AMZ_DATE: &str = "x-amz-date";
pub const USER_AGENT: &str = "user-agent";

/// Format a timestamp the way `x-amz-date` expects: `YYYYMMDDThhmmssZ`.
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// User agent sent when the caller does not configure one, e.g.
/// `spapi-orders/0.1.0 (Language=Rust/1.83.0; Platform=linux/6.8.0-49-generic)`.
pub fn default_user_agent() -> String {
    format!(
        "spapi-orders/{} (Language=Rust/{}; Platform={}/{})",
        env!("CARGO_PKG_VERSION"),
        env!("SPAPI_RUSTC_VERSION"),
        std::env::consts::OS,
        os_release(),
    )
}

/// Kernel release of the host, or `unknown` when it cannot be read.
fn os_release() -> String {
    sysinfo::System::kernel_version().unwrap_or_else(|| "unknown".to_string())
}

/// Parse a raw response header block into a name -> value map.
///
/// Names keep their original case. When a name repeats, the first value is
/// kept. Status lines are skipped, and if the block holds more than one
/// response (a redirect chain) only the last response's headers are used.
pub fn parse_headers(block: &str) -> BTreeMap<String, String> {
    // Sections are separated by a blank line, CRLF or bare LF.
    let mut last: Vec<&str> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            current.push(line);
        } else if !current.is_empty() {
            last = std::mem::take(&mut current);
        }
    }
    if !current.is_empty() {
        last = current;
    }

    let mut headers = BTreeMap::new();
    for line in last {
        if line.starts_with("HTTP/") {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        headers
            .entry(name.to_string())
            .or_insert_with(|| value.trim().to_string());
    }
    headers
}
