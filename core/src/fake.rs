//! Canned-response stand-in for `OrdersClient`.
//!
//! # Design
//! `OrdersFake` implements `OrdersApi` by returning the same preconfigured
//! `OperationResult` for every operation, whatever the parameters. It also
//! records each request so tests can assert on what their code asked for.
//! Nothing is registered globally; hand the fake to the code under test
//! wherever it expects an `OrdersApi`.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::api::OrdersApi;
use crate::http::{TransferInfo, TransportOptions};
use crate::operation::OperationRequest;
use crate::response::OperationResult;

#[derive(Debug, Default)]
pub struct OrdersFake {
    result: OperationResult,
    requests: Mutex<Vec<OperationRequest>>,
}

impl OrdersFake {
    pub fn new(result: OperationResult) -> Self {
        Self {
            result,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A fake answering with the default fixture and `response` as the body.
    pub fn with_response(response: Value) -> Self {
        Self::new(ResponseFactory::new().response(response).make())
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<OperationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl OrdersApi for OrdersFake {
    fn send(&self, request: &OperationRequest, _options: &TransportOptions) -> OperationResult {
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }
        self.result.clone()
    }
}

/// Builds realistic `OperationResult` fixtures.
///
/// The default is a successful `getOrder` exchange: status 200, the
/// response headers SP-API typically sends, and an empty JSON object body.
#[derive(Debug, Clone)]
pub struct ResponseFactory {
    result: OperationResult,
}

impl Default for ResponseFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFactory {
    pub fn new() -> Self {
        let headers: BTreeMap<String, String> = [
            ("Server", "Server"),
            ("Date", "Thu, 20 Feb 2025 21:47:01 GMT"),
            ("Content-Type", "application/json"),
            ("Content-Length", "1021"),
            ("Connection", "keep-alive"),
            ("X-Amz-Rid", "EQ2C31TCR4JC1QF5G3DM"),
            ("X-Amzn-Ratelimit-Limit", "0.5"),
            ("X-Amzn-Requestid", "3f8c91b2-0f36-4f5a-b1be-8326aaff71e1"),
            ("X-Amz-Apigw-Id", "OPF3f8c91b20f36"),
            ("X-Amzn-Trace-Id", "Root=1-67b7a2d5-3f8c91b20f364f5a"),
            ("Vary", "Content-Type,Accept-Encoding,User-Agent"),
            (
                "Strict-Transport-Security",
                "max-age=47474747; includeSubDomains; preload",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            result: OperationResult {
                info: TransferInfo {
                    url: "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/123-1234567-1234567"
                        .to_string(),
                    http_code: 200,
                    content_type: Some("application/json".to_string()),
                    header_size: 470,
                    redirect_count: 0,
                    total_time: 1.32608,
                    size_download: 1021,
                    primary_ip: Some("44.215.139.122".to_string()),
                    primary_port: Some(443),
                    extra: [
                        ("namelookup_time", json!(0.008719)),
                        ("connect_time", json!(1.087884)),
                        ("pretransfer_time", json!(1.182583)),
                        ("starttransfer_time", json!(1.326)),
                        ("local_ip", json!("172.22.0.2")),
                        ("local_port", json!(44176)),
                    ]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                },
                error: String::new(),
                headers,
                response: Some(Value::Object(Default::default())),
            },
        }
    }

    pub fn response(mut self, response: Value) -> Self {
        self.result.response = Some(response);
        self
    }

    pub fn http_code(mut self, http_code: u16) -> Self {
        self.result.info.http_code = http_code;
        self
    }

    /// Simulate a transport failure: sets `error` and clears the response.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.result.error = error.into();
        self.result.info.http_code = 0;
        self.result.headers.clear();
        self.result.response = None;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.result.headers.insert(name.into(), value.into());
        self
    }

    pub fn make(self) -> OperationResult {
        self.result
    }
}
