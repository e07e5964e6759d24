//! Every Orders operation against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the real client and
//! `UreqTransport` over HTTP. Checks both what the client put on the wire
//! (via the server's request log) and how the transfer was normalized.

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use mock_server::{AppState, RecordedRequest};
use spapi_orders_core::{
    ClientConfig, ListEncoding, ListOrdersQuery, OperationRequest, OrdersApi, OrdersClient,
    TransportOptions,
};

const US: &str = "ATVPDKIKX0DER";
const CA: &str = "A2EUQ1WTGCTBG2";
const ORDER_ID: &str = "123-1234567-1234567";

/// Start the mock server on a random port and return its base URL and state.
fn start_server() -> (String, AppState) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let state = AppState::seeded();
    let server_state = state.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_state(listener, server_state).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), state)
}

/// Answer every request with a `302` to the same path under `target`.
fn start_redirect(target: String) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            write!(
                stream,
                "HTTP/1.1 302 Found\r\nLocation: {target}{path}\r\n\
                 Content-Length: 0\r\nConnection: close\r\n\r\n"
            )
            .unwrap();
        }
    });
    format!("http://{addr}")
}

fn recorded(state: &AppState) -> Vec<RecordedRequest> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(state.requests())
}

fn client(base: &str) -> OrdersClient {
    OrdersClient::new(ClientConfig::new("Atza|integration").base_uri(base)).unwrap()
}

fn order_ids(result: &spapi_orders_core::OperationResult) -> Vec<String> {
    result.response.as_ref().unwrap()["payload"]["Orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["AmazonOrderId"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn all_operations_round_trip() {
    let (base, _state) = start_server();
    let client = client(&base);

    // Step 1: list across two marketplaces with ampersand-joined values.
    let query = ListOrdersQuery::new([US, CA])
        .created_after("2025-01-01T00:00:00Z")
        .order_statuses(["Shipped", "Pending"]);
    let result = client.list_orders(&query);
    assert_eq!(result.error, "");
    assert_eq!(result.info.http_code, 200);
    assert_eq!(order_ids(&result), [ORDER_ID, "171-5462317-2830748"]);
    assert_eq!(result.next_token(), None);

    // Step 2: single order.
    let result = client.get_order(ORDER_ID);
    assert!(result.is_success());
    let payload = &result.response.as_ref().unwrap()["payload"];
    assert_eq!(payload["AmazonOrderId"], ORDER_ID);
    assert_eq!(payload["OrderStatus"], "Shipped");
    assert_eq!(result.info.url, format!("{base}/orders/v0/orders/{ORDER_ID}"));
    assert_eq!(result.info.content_type.as_deref(), Some("application/json"));

    // Step 3: buyer info.
    let result = client.get_order_buyer_info(ORDER_ID);
    assert_eq!(
        result.response.unwrap()["payload"]["BuyerEmail"],
        "buyer1@marketplace.amazon.com"
    );

    // Step 4: shipping address.
    let result = client.get_order_address(ORDER_ID);
    assert_eq!(result.response.unwrap()["payload"]["ShippingAddress"]["City"], "Seattle");

    // Step 5: items.
    let result = client.get_order_items(ORDER_ID);
    let items = result.response.unwrap()["payload"]["OrderItems"].clone();
    assert_eq!(items.as_array().unwrap().len(), 2);

    // Step 6: items buyer info.
    let result = client.get_order_items_buyer_info(ORDER_ID);
    assert_eq!(
        result.response.unwrap()["payload"]["OrderItems"][0]["GiftMessageText"],
        "Happy birthday"
    );
}

#[test]
fn response_headers_are_parsed() {
    let (base, _state) = start_server();
    let result = client(&base).get_order(ORDER_ID);

    assert_eq!(
        result.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(result.headers.get("x-amzn-ratelimit-limit").map(String::as_str), Some("0.0167"));
    assert!(result.headers.contains_key("x-amzn-requestid"));
    assert!(result.info.header_size > 0);
}

#[test]
fn server_sees_generated_headers_and_query() {
    let (base, state) = start_server();
    let client = OrdersClient::new(
        ClientConfig::new("Atza|integration")
            .base_uri(&base)
            .user_agent("integration-test/1.0"),
    )
    .unwrap();

    client.list_orders(&ListOrdersQuery::new([US, CA]).created_after("2025-01-01T00:00:00Z"));

    let requests = recorded(&state);
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.path, "/orders/v0/orders");
    assert_eq!(
        req.query.as_deref(),
        Some("MarketplaceIds=ATVPDKIKX0DER%26A2EUQ1WTGCTBG2&CreatedAfter=2025-01-01T00%3A00%3A00Z")
    );
    assert_eq!(req.header("accept"), Some("application/json"));
    assert_eq!(req.header("x-amz-access-token"), Some("Atza|integration"));
    assert_eq!(req.header("user-agent"), Some("integration-test/1.0"));
    let date = req.header("x-amz-date").unwrap();
    assert_eq!(date.len(), 16);
    assert!(date.ends_with('Z'));
    assert_eq!(&date[8..9], "T");
}

#[test]
fn comma_encoding_reaches_server() {
    let (base, state) = start_server();
    let client = OrdersClient::new(
        ClientConfig::new("t")
            .base_uri(&base)
            .list_encoding(ListEncoding::Comma),
    )
    .unwrap();

    let result = client.list_orders(&ListOrdersQuery::new([US, CA]).last_updated_after("2025-01-12T00:00:00Z"));
    assert_eq!(order_ids(&result).len(), 2);
    let requests = recorded(&state);
    assert!(requests[0]
        .query
        .as_deref()
        .unwrap()
        .starts_with("MarketplaceIds=ATVPDKIKX0DER%2CA2EUQ1WTGCTBG2"));
}

#[test]
fn next_token_is_surfaced_not_followed() {
    let (base, state) = start_server();
    let client = client(&base);
    let query = ListOrdersQuery::new([US])
        .created_after("2025-01-01T00:00:00Z")
        .max_results_per_page(1);

    let first = client.list_orders(&query);
    assert_eq!(order_ids(&first), [ORDER_ID]);
    let token = first.next_token().unwrap().to_string();
    assert_eq!(recorded(&state).len(), 1);

    let second = client.list_orders(&query.clone().next_token(token));
    assert_eq!(order_ids(&second), ["902-3159896-1390916"]);
    assert_eq!(second.next_token(), None);
}

#[test]
fn api_errors_are_data_not_failures() {
    let (base, _state) = start_server();
    let client = client(&base);

    let result = client.get_order("000-0000000-0000000");
    assert_eq!(result.error, "");
    assert_eq!(result.info.http_code, 404);
    assert!(!result.is_success());
    assert_eq!(result.api_errors()[0].code, "NotFound");

    // Neither CreatedAfter nor LastUpdatedAfter: the client sends it anyway.
    let result = client.list_orders(&ListOrdersQuery::new([US]));
    assert_eq!(result.info.http_code, 400);
    assert_eq!(result.api_errors()[0].code, "InvalidInput");
}

#[test]
fn missing_token_is_rejected_by_server() {
    let (base, _state) = start_server();
    let client = client(&base);
    let options = TransportOptions::default().header("x-amz-access-token", "");
    let result = client.send(&OperationRequest::get_order(ORDER_ID), &options);
    assert_eq!(result.info.http_code, 403);
    assert_eq!(result.api_errors()[0].code, "Unauthorized");
}

#[test]
fn redirect_limit_reaches_transport() {
    let (base, state) = start_server();
    let edge = start_redirect(base.clone());
    let client = client(&edge);
    let target = format!("{base}/orders/v0/orders/{ORDER_ID}");

    let followed = client.get_order(ORDER_ID);
    assert_eq!(followed.error, "");
    assert_eq!(followed.info.http_code, 200);
    assert_eq!(followed.info.url, target);
    assert_eq!(followed.response.unwrap()["payload"]["AmazonOrderId"], ORDER_ID);
    assert_eq!(recorded(&state).len(), 1);

    let options = TransportOptions::default().max_redirects(0);
    let stopped = client.send(&OperationRequest::get_order(ORDER_ID), &options);
    assert_eq!(stopped.error, "");
    assert_eq!(stopped.info.http_code, 302);
    assert_eq!(stopped.headers.get("location"), Some(&target));
    assert_eq!(stopped.response, None);
    assert_eq!(recorded(&state).len(), 1);
}

#[test]
fn transport_failure_is_reported_in_envelope() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = OrdersClient::new(
        ClientConfig::new("t")
            .base_uri(format!("http://127.0.0.1:{port}"))
            .options(TransportOptions::default().timeout(Duration::from_secs(2))),
    )
    .unwrap();

    let result = client.get_order(ORDER_ID);
    assert!(result.is_transport_error());
    assert_eq!(result.info.http_code, 0);
    assert!(result.headers.is_empty());
    assert_eq!(result.response, None);
}

#[test]
fn works_through_dyn_api() {
    let (base, _state) = start_server();
    let api: Box<dyn OrdersApi> = Box::new(client(&base));
    let result = api.get_order_items(ORDER_ID);
    assert!(result.is_success());
}
