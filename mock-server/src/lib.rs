//! In-memory imitation of the SP-API Orders v0 endpoints.
//!
//! Serves the six GET routes over a small seeded order book, answers with
//! the `{"payload": ...}` / `{"errors": [...]}` envelopes the real API uses,
//! and records every request it sees so tests can inspect what a client
//! actually put on the wire.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    pub name: String,
    pub address_line1: String,
    pub city: String,
    pub state_or_region: String,
    pub postal_code: String,
    pub country_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItem {
    pub order_item_id: String,
    #[serde(rename = "ASIN")]
    pub asin: String,
    #[serde(rename = "SellerSKU")]
    pub seller_sku: String,
    pub title: String,
    pub quantity_ordered: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_message_text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    pub amazon_order_id: String,
    pub seller_order_id: String,
    pub purchase_date: String,
    pub last_update_date: String,
    pub order_status: String,
    pub fulfillment_channel: String,
    pub payment_method: String,
    pub marketplace_id: String,
    #[serde(rename = "IsISPU")]
    pub is_ispu: bool,
    #[serde(skip)]
    pub buyer_email: String,
    #[serde(skip)]
    pub buyer_name: String,
    #[serde(skip)]
    pub shipping_address: Option<Address>,
    #[serde(skip)]
    pub items: Vec<OrderItem>,
}

/// A request as the server received it.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    orders: Arc<RwLock<Vec<Order>>>,
    log: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl AppState {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(orders)),
            log: Arc::default(),
        }
    }

    /// State preloaded with `sample_orders`.
    pub fn seeded() -> Self {
        Self::new(sample_orders())
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.log.read().await.clone()
    }
}

/// Errors rendered in the SP-API `errors` envelope.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InvalidInput", message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "errors": [{ "code": self.code, "message": self.message }]
        });
        (self.status, envelope_headers(), Json(body)).into_response()
    }
}

fn envelope_headers() -> [(&'static str, String); 2] {
    [
        ("x-amzn-RequestId", Uuid::new_v4().to_string()),
        ("x-amzn-RateLimit-Limit", "0.0167".to_string()),
    ]
}

fn payload(body: Value) -> Response {
    (StatusCode::OK, envelope_headers(), Json(json!({ "payload": body }))).into_response()
}

pub fn app() -> Router {
    app_with_state(AppState::seeded())
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/orders/v0/orders", get(list_orders))
        .route("/orders/v0/orders/{order_id}", get(get_order))
        .route("/orders/v0/orders/{order_id}/buyerInfo", get(get_order_buyer_info))
        .route("/orders/v0/orders/{order_id}/address", get(get_order_address))
        .route("/orders/v0/orders/{order_id}/orderItems", get(get_order_items))
        .route(
            "/orders/v0/orders/{order_id}/orderItems/buyerInfo",
            get(get_order_items_buyer_info),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::seeded()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// Log the request, then require an access token.
async fn admit(state: &AppState, uri: &OriginalUri, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let recorded = RecordedRequest {
        path: uri.0.path().to_string(),
        query: uri.0.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(n, v)| (n.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect(),
    };
    debug!(path = %recorded.path, query = ?recorded.query, "request");
    state.log.write().await.push(recorded);

    match headers.get(ACCESS_TOKEN_HEADER) {
        Some(token) if !token.is_empty() => Ok(()),
        _ => Err(ApiFailure::new(
            StatusCode::FORBIDDEN,
            "Unauthorized",
            "Access to requested resource is denied.",
        )),
    }
}

async fn find_order(state: &AppState, order_id: &str) -> Result<Order, ApiFailure> {
    state
        .orders
        .read()
        .await
        .iter()
        .find(|o| o.amazon_order_id == order_id)
        .cloned()
        .ok_or_else(|| ApiFailure::new(StatusCode::NOT_FOUND, "NotFound", format!("Order {order_id} not found")))
}

/// Multi-value filters arrive either comma-separated or joined with `&`
/// inside a single value; accept both.
fn split_values(raw: &str) -> Vec<String> {
    raw.split(['&', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn list_orders(
    State(state): State<AppState>,
    uri: OriginalUri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiFailure> {
    admit(&state, &uri, &headers).await?;

    let marketplaces = params
        .get("MarketplaceIds")
        .map(|v| split_values(v))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiFailure::invalid_input("MarketplaceIds is required"))?;

    let created_after = params.get("CreatedAfter");
    let updated_after = params.get("LastUpdatedAfter");
    match (created_after, updated_after) {
        (None, None) => {
            return Err(ApiFailure::invalid_input(
                "Either CreatedAfter or LastUpdatedAfter must be specified",
            ))
        }
        (Some(_), Some(_)) => {
            return Err(ApiFailure::invalid_input(
                "CreatedAfter and LastUpdatedAfter cannot both be specified",
            ))
        }
        _ => {}
    }

    let statuses = params.get("OrderStatuses").map(|v| split_values(v));
    let channels = params.get("FulfillmentChannels").map(|v| split_values(v));
    let order_ids = params.get("AmazonOrderIds").map(|v| split_values(v));
    let page_size = match params.get("MaxResultsPerPage") {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=100).contains(n))
            .ok_or_else(|| ApiFailure::invalid_input("MaxResultsPerPage must be between 1 and 100"))?,
        None => 100,
    };
    let offset = match params.get("NextToken") {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| ApiFailure::invalid_input("Invalid NextToken"))?,
        None => 0,
    };

    let orders = state.orders.read().await;
    let matching: Vec<&Order> = orders
        .iter()
        .filter(|o| marketplaces.contains(&o.marketplace_id))
        .filter(|o| created_after.is_none_or(|after| o.purchase_date.as_str() >= after.as_str()))
        .filter(|o| {
            params
                .get("CreatedBefore")
                .is_none_or(|before| o.purchase_date.as_str() < before.as_str())
        })
        .filter(|o| updated_after.is_none_or(|after| o.last_update_date.as_str() >= after.as_str()))
        .filter(|o| statuses.as_ref().is_none_or(|s| s.contains(&o.order_status)))
        .filter(|o| channels.as_ref().is_none_or(|c| c.contains(&o.fulfillment_channel)))
        .filter(|o| order_ids.as_ref().is_none_or(|ids| ids.contains(&o.amazon_order_id)))
        .filter(|o| {
            params
                .get("SellerOrderId")
                .is_none_or(|id| &o.seller_order_id == id)
        })
        .filter(|o| {
            params
                .get("BuyerEmail")
                .is_none_or(|email| &o.buyer_email == email)
        })
        .collect();

    let page: Vec<&Order> = matching.iter().skip(offset).take(page_size).copied().collect();
    let mut body = json!({ "Orders": page });
    let next = offset.saturating_add(page_size);
    if next < matching.len() {
        body["NextToken"] = json!(next.to_string());
    }
    Ok(payload(body))
}

async fn get_order(
    State(state): State<AppState>,
    uri: OriginalUri,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiFailure> {
    admit(&state, &uri, &headers).await?;
    let order = find_order(&state, &order_id).await?;
    Ok(payload(json!(order)))
}

async fn get_order_buyer_info(
    State(state): State<AppState>,
    uri: OriginalUri,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiFailure> {
    admit(&state, &uri, &headers).await?;
    let order = find_order(&state, &order_id).await?;
    Ok(payload(json!({
        "AmazonOrderId": order.amazon_order_id,
        "BuyerEmail": order.buyer_email,
        "BuyerName": order.buyer_name,
    })))
}

async fn get_order_address(
    State(state): State<AppState>,
    uri: OriginalUri,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiFailure> {
    admit(&state, &uri, &headers).await?;
    let order = find_order(&state, &order_id).await?;
    Ok(payload(json!({
        "AmazonOrderId": order.amazon_order_id,
        "ShippingAddress": order.shipping_address,
    })))
}

async fn get_order_items(
    State(state): State<AppState>,
    uri: OriginalUri,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiFailure> {
    admit(&state, &uri, &headers).await?;
    let order = find_order(&state, &order_id).await?;
    Ok(payload(json!({
        "AmazonOrderId": order.amazon_order_id,
        "OrderItems": order.items,
    })))
}

async fn get_order_items_buyer_info(
    State(state): State<AppState>,
    uri: OriginalUri,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiFailure> {
    admit(&state, &uri, &headers).await?;
    let order = find_order(&state, &order_id).await?;
    let items: Vec<Value> = order
        .items
        .iter()
        .map(|item| {
            json!({
                "OrderItemId": item.order_item_id,
                "GiftMessageText": item.gift_message_text,
            })
        })
        .collect();
    Ok(payload(json!({
        "AmazonOrderId": order.amazon_order_id,
        "OrderItems": items,
    })))
}

/// Three orders across two marketplaces and three statuses.
pub fn sample_orders() -> Vec<Order> {
    let address = |name: &str, city: &str, region: &str, postal: &str, country: &str| Address {
        name: name.to_string(),
        address_line1: "410 Terry Ave N".to_string(),
        city: city.to_string(),
        state_or_region: region.to_string(),
        postal_code: postal.to_string(),
        country_code: country.to_string(),
    };
    let item = |id: &str, asin: &str, sku: &str, title: &str, qty: u32, gift: Option<&str>| OrderItem {
        order_item_id: id.to_string(),
        asin: asin.to_string(),
        seller_sku: sku.to_string(),
        title: title.to_string(),
        quantity_ordered: qty,
        gift_message_text: gift.map(str::to_string),
    };

    vec![
        Order {
            amazon_order_id: "123-1234567-1234567".to_string(),
            seller_order_id: "S-1001".to_string(),
            purchase_date: "2025-01-10T12:00:00Z".to_string(),
            last_update_date: "2025-01-11T08:30:00Z".to_string(),
            order_status: "Shipped".to_string(),
            fulfillment_channel: "MFN".to_string(),
            payment_method: "Other".to_string(),
            marketplace_id: "ATVPDKIKX0DER".to_string(),
            is_ispu: false,
            buyer_email: "buyer1@marketplace.amazon.com".to_string(),
            buyer_name: "Jane Doe".to_string(),
            shipping_address: Some(address("Jane Doe", "Seattle", "WA", "98109", "US")),
            items: vec![
                item("68828574383266", "B00551Q3CS", "SKU-MUG", "Ceramic Mug", 2, Some("Happy birthday")),
                item("68828574383267", "B07ZPKBL9V", "SKU-TEA", "Loose Leaf Tea", 1, None),
            ],
        },
        Order {
            amazon_order_id: "902-3159896-1390916".to_string(),
            seller_order_id: "S-1002".to_string(),
            purchase_date: "2025-01-15T09:15:00Z".to_string(),
            last_update_date: "2025-01-15T09:20:00Z".to_string(),
            order_status: "Unshipped".to_string(),
            fulfillment_channel: "AFN".to_string(),
            payment_method: "Other".to_string(),
            marketplace_id: "ATVPDKIKX0DER".to_string(),
            is_ispu: false,
            buyer_email: "buyer2@marketplace.amazon.com".to_string(),
            buyer_name: "John Roe".to_string(),
            shipping_address: Some(address("John Roe", "Austin", "TX", "78701", "US")),
            items: vec![item("47250916034530", "B08N5WRWNW", "SKU-SPK", "Smart Speaker", 1, None)],
        },
        Order {
            amazon_order_id: "171-5462317-2830748".to_string(),
            seller_order_id: "S-1003".to_string(),
            purchase_date: "2025-02-01T17:45:00Z".to_string(),
            last_update_date: "2025-02-01T17:45:00Z".to_string(),
            order_status: "Pending".to_string(),
            fulfillment_channel: "MFN".to_string(),
            payment_method: "COD".to_string(),
            marketplace_id: "A2EUQ1WTGCTBG2".to_string(),
            is_ispu: true,
            buyer_email: "buyer3@marketplace.amazon.com".to_string(),
            buyer_name: "Ana Poe".to_string(),
            shipping_address: None,
            items: vec![item("12044826461914", "B01N5IB20Q", "SKU-KBD", "Keyboard", 1, None)],
        },
    ]
}
