//! `getOrders` filters and their query-string encoding.
//!
//! # Design
//! `ListOrdersQuery` holds every filter the endpoint accepts as a typed
//! field. `to_params` flattens it into `(name, QueryValue)` pairs in a fixed
//! wire order, dropping unset filters entirely so they never show up as
//! empty keys. `encode_query` then renders the pairs as
//! `application/x-www-form-urlencoded`.
//!
//! Sequence filters are joined into a single value *before* encoding. With
//! `ListEncoding::Ampersand` the joined value is `a&b&c`, which goes out on
//! the wire as `a%26b%26c`. Existing callers depend on those exact bytes.
//! `ListEncoding::Comma` produces `a%2Cb%2Cc`, the array convention Amazon
//! documents for this endpoint.
//!
//! Mutually exclusive filters (`CreatedAfter` vs `LastUpdatedAfter`,
//! `SellerOrderId` vs everything else, ...) are not checked here. The API
//! rejects bad combinations with a 400 and an `errors` body.

use serde::Deserialize;
use url::form_urlencoded;

use crate::operation::QueryValue;

/// How sequence-valued filters are joined before percent-encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListEncoding {
    /// `a&b&c`, byte-compatible with the legacy client.
    #[default]
    Ampersand,
    /// `a,b,c`, as documented for the Orders v0 API.
    Comma,
}

impl ListEncoding {
    pub fn separator(self) -> &'static str {
        match self {
            ListEncoding::Ampersand => "&",
            ListEncoding::Comma => ",",
        }
    }
}

/// Filters for `getOrders`.
///
/// Dates are ISO 8601 strings and are sent as given. Either `created_after`
/// or `last_updated_after` must be set for the API to accept the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListOrdersQuery {
    pub marketplace_ids: Vec<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub last_updated_after: Option<String>,
    pub last_updated_before: Option<String>,
    pub order_statuses: Option<Vec<String>>,
    pub fulfillment_channels: Option<Vec<String>>,
    pub payment_methods: Option<Vec<String>>,
    pub buyer_email: Option<String>,
    pub seller_order_id: Option<String>,
    pub max_results_per_page: Option<i64>,
    pub easy_ship_shipment_statuses: Option<Vec<String>>,
    pub electronic_invoice_statuses: Option<Vec<String>>,
    pub next_token: Option<String>,
    pub amazon_order_ids: Option<Vec<String>>,
    pub actual_fulfillment_supply_source_id: Option<String>,
    #[serde(rename = "IsISPU")]
    pub is_ispu: Option<bool>,
    pub store_chain_store_id: Option<String>,
    pub earliest_delivery_date_before: Option<String>,
    pub earliest_delivery_date_after: Option<String>,
    pub latest_delivery_date_before: Option<String>,
    pub latest_delivery_date_after: Option<String>,
}

fn strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

macro_rules! text_setters {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.$name = Some(value.into());
                self
            }
        )*
    };
}

macro_rules! list_setters {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name<I, S>(mut self, values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.$name = Some(strings(values));
                self
            }
        )*
    };
}

impl ListOrdersQuery {
    pub fn new<I, S>(marketplace_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            marketplace_ids: strings(marketplace_ids),
            ..Self::default()
        }
    }

    text_setters! {
        /// Orders created at or after this time.
        created_after,
        created_before,
        /// Orders updated at or after this time. Not allowed with `created_after`.
        last_updated_after,
        last_updated_before,
        buyer_email,
        /// Cannot be combined with any filter other than the marketplace.
        seller_order_id,
        /// Cursor from a previous page's `payload.NextToken`.
        next_token,
        actual_fulfillment_supply_source_id,
        store_chain_store_id,
        earliest_delivery_date_before,
        earliest_delivery_date_after,
        latest_delivery_date_before,
        latest_delivery_date_after,
    }

    list_setters! {
        order_statuses,
        fulfillment_channels,
        payment_methods,
        easy_ship_shipment_statuses,
        electronic_invoice_statuses,
        amazon_order_ids,
    }

    /// Page size, 1 to 100 per the API.
    pub fn max_results_per_page(mut self, value: i64) -> Self {
        self.max_results_per_page = Some(value);
        self
    }

    pub fn is_ispu(mut self, value: bool) -> Self {
        self.is_ispu = Some(value);
        self
    }

    /// Set filters as `(name, value)` pairs in wire order.
    ///
    /// Unset filters and empty sequences are left out.
    pub fn to_params(&self) -> Vec<(String, QueryValue)> {
        fn text(name: &str, value: &Option<String>, params: &mut Vec<(String, QueryValue)>) {
            if let Some(v) = value {
                params.push((name.to_string(), QueryValue::Text(v.clone())));
            }
        }
        fn list(name: &str, values: Option<&Vec<String>>, params: &mut Vec<(String, QueryValue)>) {
            if let Some(v) = values.filter(|v| !v.is_empty()) {
                params.push((name.to_string(), QueryValue::List(v.clone())));
            }
        }

        let mut params = Vec::new();
        list("MarketplaceIds", Some(&self.marketplace_ids), &mut params);
        text("CreatedAfter", &self.created_after, &mut params);
        text("CreatedBefore", &self.created_before, &mut params);
        text("LastUpdatedAfter", &self.last_updated_after, &mut params);
        text("LastUpdatedBefore", &self.last_updated_before, &mut params);
        list("OrderStatuses", self.order_statuses.as_ref(), &mut params);
        list("FulfillmentChannels", self.fulfillment_channels.as_ref(), &mut params);
        list("PaymentMethods", self.payment_methods.as_ref(), &mut params);
        text("BuyerEmail", &self.buyer_email, &mut params);
        text("SellerOrderId", &self.seller_order_id, &mut params);
        if let Some(n) = self.max_results_per_page {
            params.push(("MaxResultsPerPage".to_string(), QueryValue::Integer(n)));
        }
        list(
            "EasyShipShipmentStatuses",
            self.easy_ship_shipment_statuses.as_ref(),
            &mut params,
        );
        list(
            "ElectronicInvoiceStatuses",
            self.electronic_invoice_statuses.as_ref(),
            &mut params,
        );
        text("NextToken", &self.next_token, &mut params);
        list("AmazonOrderIds", self.amazon_order_ids.as_ref(), &mut params);
        text(
            "ActualFulfillmentSupplySourceId",
            &self.actual_fulfillment_supply_source_id,
            &mut params,
        );
        if let Some(b) = self.is_ispu {
            params.push(("IsISPU".to_string(), QueryValue::Boolean(b)));
        }
        text("StoreChainStoreId", &self.store_chain_store_id, &mut params);
        text(
            "EarliestDeliveryDateBefore",
            &self.earliest_delivery_date_before,
            &mut params,
        );
        text(
            "EarliestDeliveryDateAfter",
            &self.earliest_delivery_date_after,
            &mut params,
        );
        text(
            "LatestDeliveryDateBefore",
            &self.latest_delivery_date_before,
            &mut params,
        );
        text(
            "LatestDeliveryDateAfter",
            &self.latest_delivery_date_after,
            &mut params,
        );
        params
    }
}

/// Render one value as the string that gets percent-encoded.
pub fn render_value(value: &QueryValue, encoding: ListEncoding) -> String {
    match value {
        QueryValue::Text(s) => s.clone(),
        QueryValue::Integer(n) => n.to_string(),
        QueryValue::Boolean(b) => b.to_string(),
        QueryValue::List(items) => items.join(encoding.separator()),
    }
}

/// Encode `params` as a form-urlencoded query string (no leading `?`).
pub fn encode_query(params: &[(String, QueryValue)], encoding: ListEncoding) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        serializer.append_pair(name, &render_value(value, encoding));
    }
    serializer.finish()
}
