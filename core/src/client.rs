//! Request builder and dispatcher for the Orders v0 API.
//!
//! # Design
//! `OrdersClient` holds only immutable configuration (base URI, access
//! token, user agent, default transport options) plus a `Transport`. Every
//! operation goes through the same three steps:
//!
//! 1. `build` turns an `OperationRequest` into an `HttpRequest` (pure).
//! 2. The transport executes the GET and returns a `TransferResult`.
//! 3. `normalize` turns the transfer into an `OperationResult`.
//!
//! Only step 2 does I/O, so step 1 and step 3 are tested without a network.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::api::OrdersApi;
use crate::error::Error;
use crate::headers::{amz_date, default_user_agent, ACCEPT, ACCESS_TOKEN, AMZ_DATE, USER_AGENT};
use crate::http::{set_header, HttpRequest, TransportOptions};
use crate::operation::OperationRequest;
use crate::query::{encode_query, ListEncoding};
use crate::response::{normalize, OperationResult};
use crate::transport::{Transport, UreqTransport};

/// North America endpoint.
pub const DEFAULT_BASE_URI: &str = "https://sellingpartnerapi-na.amazon.com";

pub const ENV_ACCESS_TOKEN: &str = "SPAPI_ACCESS_TOKEN";
pub const ENV_BASE_URI: &str = "SPAPI_BASE_URI";
pub const ENV_USER_AGENT: &str = "SPAPI_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "SPAPI_TIMEOUT_SECS";

/// Settings captured once when an `OrdersClient` is created.
#[derive(Clone)]
pub struct ClientConfig {
    pub access_token: String,
    pub base_uri: String,
    /// Sent as `user-agent`; a generated value is used when `None`.
    pub user_agent: Option<String>,
    /// Applied to every call, beneath any per-call options.
    pub options: TransportOptions,
    pub list_encoding: ListEncoding,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"<redacted>")
            .field("base_uri", &self.base_uri)
            .field("user_agent", &self.user_agent)
            .field("options", &self.options)
            .field("list_encoding", &self.list_encoding)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_uri: DEFAULT_BASE_URI.to_string(),
            user_agent: None,
            options: TransportOptions::default(),
            list_encoding: ListEncoding::default(),
        }
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn list_encoding(mut self, list_encoding: ListEncoding) -> Self {
        self.list_encoding = list_encoding;
        self
    }

    /// Read configuration from `SPAPI_*` environment variables.
    ///
    /// `SPAPI_ACCESS_TOKEN` is required; `SPAPI_BASE_URI`,
    /// `SPAPI_USER_AGENT` and `SPAPI_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_ACCESS_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingEnv(ENV_ACCESS_TOKEN))?;
        let mut config = Self::new(token);

        if let Some(base_uri) = lookup(ENV_BASE_URI) {
            config = config.base_uri(base_uri);
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            config = config.user_agent(user_agent);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::InvalidEnv {
                    name: ENV_TIMEOUT_SECS,
                    reason: e.to_string(),
                })?;
            config.options = config.options.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Synchronous client for the Orders v0 API.
///
/// Cheap to share across threads when `T` is: it holds no mutable state.
#[derive(Clone)]
pub struct OrdersClient<T = UreqTransport> {
    base_uri: String,
    access_token: String,
    user_agent: String,
    options: TransportOptions,
    list_encoding: ListEncoding,
    transport: T,
}

impl<T> fmt::Debug for OrdersClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrdersClient")
            .field("base_uri", &self.base_uri)
            .field("user_agent", &self.user_agent)
            .field("options", &self.options)
            .field("list_encoding", &self.list_encoding)
            .finish_non_exhaustive()
    }
}

impl OrdersClient<UreqTransport> {
    /// Create a client that talks to the network through `ureq`.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        Self::with_transport(config, UreqTransport)
    }
}

impl<T: Transport> OrdersClient<T> {
    /// Create a client that dispatches through `transport`.
    ///
    /// Fails only when `config.base_uri` is not an absolute http(s) URL.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, Error> {
        let base_uri = validate_base_uri(&config.base_uri)?;
        Ok(Self {
            base_uri,
            access_token: config.access_token,
            user_agent: config.user_agent.unwrap_or_else(default_user_agent),
            options: TransportOptions::defaults().merge(&config.options),
            list_encoding: config.list_encoding,
            transport,
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the GET for `request`, stamped with the current time.
    pub fn build(&self, request: &OperationRequest, options: &TransportOptions) -> HttpRequest {
        self.build_at(request, options, Utc::now())
    }

    /// Build the GET for `request` with `now` as the `x-amz-date`.
    ///
    /// Header order is `accept`, `x-amz-access-token`, `x-amz-date`,
    /// `user-agent`, then any extra headers from the client and call
    /// options. An extra header with a generated header's name replaces it.
    pub fn build_at(
        &self,
        request: &OperationRequest,
        options: &TransportOptions,
        now: DateTime<Utc>,
    ) -> HttpRequest {
        let mut url = format!("{}{}", self.base_uri, request.path());
        let query = encode_query(&request.query_params, self.list_encoding);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let mut options = self.options.merge(options);
        let mut headers = vec![
            (ACCEPT.to_string(), "application/json".to_string()),
            (ACCESS_TOKEN.to_string(), self.access_token.clone()),
            (AMZ_DATE.to_string(), amz_date(now)),
            (USER_AGENT.to_string(), self.user_agent.clone()),
        ];
        for (name, value) in std::mem::take(&mut options.headers) {
            set_header(&mut headers, &name, &value);
        }

        HttpRequest {
            url,
            headers,
            options,
        }
    }

    /// Build, dispatch and normalize one operation.
    pub fn execute(&self, request: &OperationRequest, options: &TransportOptions) -> OperationResult {
        let http = self.build(request, options);
        debug!(operation = %request.operation, url = %http.url, "dispatching");
        let result = normalize(self.transport.get(&http));
        debug!(
            operation = %request.operation,
            http_code = result.info.http_code,
            transport_error = result.is_transport_error(),
            "operation finished"
        );
        result
    }
}

impl<T: Transport> OrdersApi for OrdersClient<T> {
    fn send(&self, request: &OperationRequest, options: &TransportOptions) -> OperationResult {
        self.execute(request, options)
    }
}

fn validate_base_uri(value: &str) -> Result<String, Error> {
    let invalid = |reason: String| Error::InvalidBaseUri {
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_string()));
    }
    Ok(value.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransferResult;
    use crate::query::ListOrdersQuery;
    use chrono::TimeZone;
    use std::sync::Mutex;

    const ORDER_ID: &str = "123-1234567-1234567";

    /// Transport that fails every transfer.
    struct Offline;

    impl Transport for Offline {
        fn get(&self, request: &HttpRequest) -> TransferResult {
            TransferResult::failed(&request.url, "offline")
        }
    }

    fn client() -> OrdersClient<Offline> {
        OrdersClient::with_transport(
            ClientConfig::new("Atza|token").user_agent("test-agent/1.0"),
            Offline,
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 20, 21, 47, 1).unwrap()
    }

    #[test]
    fn get_order_has_no_query_string() {
        let req = client().build_at(&OperationRequest::get_order(ORDER_ID), &TransportOptions::default(), now());
        assert_eq!(
            req.url,
            "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/123-1234567-1234567"
        );
    }

    #[test]
    fn get_order_items_buyer_info_path() {
        let req = client().build_at(
            &OperationRequest::get_order_items_buyer_info("X"),
            &TransportOptions::default(),
            now(),
        );
        assert_eq!(
            req.url,
            "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/X/orderItems/buyerInfo"
        );
    }

    #[test]
    fn order_id_is_percent_encoded() {
        let req = client().build_at(
            &OperationRequest::get_order_address("a b/../c"),
            &TransportOptions::default(),
            now(),
        );
        assert_eq!(
            req.url,
            "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/a%20b%2F..%2Fc/address"
        );
        let parsed = Url::parse(&req.url).unwrap();
        assert_eq!(parsed.path(), "/orders/v0/orders/a%20b%2F..%2Fc/address");
    }

    #[test]
    fn list_orders_appends_query() {
        let query = ListOrdersQuery::new(["ATVPDKIKX0DER", "A2EUQ1WTGCTBG2"])
            .created_after("2025-01-01T00:00:00Z");
        let req = client().build_at(&OperationRequest::list_orders(&query), &TransportOptions::default(), now());
        assert_eq!(
            req.url,
            "https://sellingpartnerapi-na.amazon.com/orders/v0/orders\
             ?MarketplaceIds=ATVPDKIKX0DER%26A2EUQ1WTGCTBG2&CreatedAfter=2025-01-01T00%3A00%3A00Z"
        );
    }

    #[test]
    fn comma_encoding_is_configurable() {
        let client = OrdersClient::with_transport(
            ClientConfig::new("t").list_encoding(ListEncoding::Comma),
            Offline,
        )
        .unwrap();
        let query = ListOrdersQuery::new(["A", "B"]);
        let req = client.build_at(&OperationRequest::list_orders(&query), &TransportOptions::default(), now());
        assert!(req.url.ends_with("?MarketplaceIds=A%2CB"));
    }

    #[test]
    fn generated_headers_in_order() {
        let req = client().build_at(&OperationRequest::get_order(ORDER_ID), &TransportOptions::default(), now());
        assert_eq!(
            req.headers,
            vec![
                ("accept".to_string(), "application/json".to_string()),
                ("x-amz-access-token".to_string(), "Atza|token".to_string()),
                ("x-amz-date".to_string(), "20250220T214701Z".to_string()),
                ("user-agent".to_string(), "test-agent/1.0".to_string()),
            ]
        );
    }

    #[test]
    fn default_user_agent_when_none_configured() {
        let client = OrdersClient::with_transport(ClientConfig::new("t"), Offline).unwrap();
        let req = client.build(&OperationRequest::get_order(ORDER_ID), &TransportOptions::default());
        assert_eq!(req.header("user-agent"), Some(default_user_agent().as_str()));
    }

    #[test]
    fn call_options_override_client_options_and_defaults() {
        let client = OrdersClient::with_transport(
            ClientConfig::new("t").options(
                TransportOptions::default()
                    .timeout(Duration::from_secs(10))
                    .header("x-client", "c"),
            ),
            Offline,
        )
        .unwrap();
        let call = TransportOptions::default()
            .timeout(Duration::from_secs(2))
            .header("User-Agent", "per-call");
        let req = client.build_at(&OperationRequest::get_order(ORDER_ID), &call, now());

        assert_eq!(req.options.timeout, Some(Duration::from_secs(2)));
        assert_eq!(req.options.max_redirects, Some(10));
        assert!(req.options.headers.is_empty());
        assert_eq!(req.header("user-agent"), Some("per-call"));
        assert_eq!(req.header("x-client"), Some("c"));
        assert_eq!(req.headers.len(), 5);
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        let req = client().build(&OperationRequest::get_order(ORDER_ID), &TransportOptions::default());
        assert_eq!(req.options.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn building_twice_differs_only_in_date() {
        let c = client();
        let request = OperationRequest::list_orders(
            &ListOrdersQuery::new(["A"]).last_updated_after("2025-01-01T00:00:00Z"),
        );
        let first = c.build_at(&request, &TransportOptions::default(), now());
        let later = Utc.with_ymd_and_hms(2025, 2, 20, 21, 47, 6).unwrap();
        let second = c.build_at(&request, &TransportOptions::default(), later);

        assert_eq!(first.url, second.url);
        let without_date = |r: &HttpRequest| -> Vec<(String, String)> {
            r.headers.iter().filter(|(n, _)| n != "x-amz-date").cloned().collect()
        };
        assert_eq!(without_date(&first), without_date(&second));
        assert_ne!(first.header("x-amz-date"), second.header("x-amz-date"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = OrdersClient::with_transport(
            ClientConfig::new("t").base_uri("http://localhost:3000/"),
            Offline,
        )
        .unwrap();
        assert_eq!(client.base_uri(), "http://localhost:3000");
        let req = client.build(&OperationRequest::get_order("1"), &TransportOptions::default());
        assert_eq!(req.url, "http://localhost:3000/orders/v0/orders/1");
    }

    #[test]
    fn rejects_unusable_base_uris() {
        for bad in ["not a url", "ftp://example.com", "https://example.com/?a=1"] {
            let err = OrdersClient::with_transport(ClientConfig::new("t").base_uri(bad), Offline).unwrap_err();
            assert!(matches!(err, Error::InvalidBaseUri { .. }), "{bad}");
        }
    }

    #[test]
    fn execute_reports_transport_failure_in_envelope() {
        let result = client().execute(&OperationRequest::get_order(ORDER_ID), &TransportOptions::default());
        assert_eq!(result.error, "offline");
        assert_eq!(
            result.info.url,
            "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/123-1234567-1234567"
        );
        assert_eq!(result.response, None);
    }

    #[test]
    fn execute_dispatches_once_per_call() {
        #[derive(Default)]
        struct Counting(Mutex<Vec<String>>);

        impl Transport for Counting {
            fn get(&self, request: &HttpRequest) -> TransferResult {
                self.0.lock().unwrap().push(request.url.clone());
                TransferResult::failed(&request.url, "counted")
            }
        }

        let client = OrdersClient::with_transport(ClientConfig::new("t"), Counting::default()).unwrap();
        client.get_order("1");
        client.get_order_items("2");
        let urls = client.transport().0.lock().unwrap().clone();
        assert_eq!(
            urls,
            [
                "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/1",
                "https://sellingpartnerapi-na.amazon.com/orders/v0/orders/2/orderItems",
            ]
        );
    }

    #[test]
    fn config_from_lookup() {
        let config = ClientConfig::from_lookup(|name| match name {
            ENV_ACCESS_TOKEN => Some("tok".to_string()),
            ENV_BASE_URI => Some("https://sellingpartnerapi-eu.amazon.com".to_string()),
            ENV_TIMEOUT_SECS => Some("5".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.base_uri, "https://sellingpartnerapi-eu.amazon.com");
        assert_eq!(config.user_agent, None);
        assert_eq!(config.options.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn config_requires_token() {
        let err = ClientConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, Error::MissingEnv(ENV_ACCESS_TOKEN)));
    }

    #[test]
    fn config_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(|name| match name {
            ENV_ACCESS_TOKEN => Some("tok".to_string()),
            ENV_TIMEOUT_SECS => Some("soon".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidEnv { name: ENV_TIMEOUT_SECS, .. }));
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?} {:?}", ClientConfig::new("secret-token"), client());
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("Atza|token"));
    }
}
