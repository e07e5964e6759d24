//! The Orders operations as an injectable capability.
//!
//! Code that needs order data should take `&impl OrdersApi` (or
//! `&dyn OrdersApi`) rather than a concrete client, then receive either an
//! `OrdersClient` or an `OrdersFake`.

use crate::http::TransportOptions;
use crate::operation::OperationRequest;
use crate::query::ListOrdersQuery;
use crate::response::OperationResult;

pub trait OrdersApi {
    /// Perform one operation with per-call transport options layered over
    /// the implementation's defaults.
    fn send(&self, request: &OperationRequest, options: &TransportOptions) -> OperationResult;

    /// Orders created or updated in a time window, filtered by `query`.
    fn list_orders(&self, query: &ListOrdersQuery) -> OperationResult {
        self.send(&OperationRequest::list_orders(query), &TransportOptions::default())
    }

    fn get_order(&self, order_id: &str) -> OperationResult {
        self.send(&OperationRequest::get_order(order_id), &TransportOptions::default())
    }

    fn get_order_buyer_info(&self, order_id: &str) -> OperationResult {
        self.send(
            &OperationRequest::get_order_buyer_info(order_id),
            &TransportOptions::default(),
        )
    }

    /// Shipping address for an order.
    fn get_order_address(&self, order_id: &str) -> OperationResult {
        self.send(
            &OperationRequest::get_order_address(order_id),
            &TransportOptions::default(),
        )
    }

    fn get_order_items(&self, order_id: &str) -> OperationResult {
        self.send(
            &OperationRequest::get_order_items(order_id),
            &TransportOptions::default(),
        )
    }

    fn get_order_items_buyer_info(&self, order_id: &str) -> OperationResult {
        self.send(
            &OperationRequest::get_order_items_buyer_info(order_id),
            &TransportOptions::default(),
        )
    }
}
