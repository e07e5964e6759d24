//! The six Orders v0 operations and the per-call request value.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::query::ListOrdersQuery;

/// Root of every Orders v0 resource path.
pub const ORDERS_ROOT: &str = "/orders/v0/orders";

/// Characters escaped inside a single path segment (the WHATWG
/// path-segment set).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// One of the read-only Orders v0 operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListOrders,
    GetOrder,
    GetOrderBuyerInfo,
    GetOrderAddress,
    GetOrderItems,
    GetOrderItemsBuyerInfo,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::ListOrders,
        Operation::GetOrder,
        Operation::GetOrderBuyerInfo,
        Operation::GetOrderAddress,
        Operation::GetOrderItems,
        Operation::GetOrderItemsBuyerInfo,
    ];

    /// Operation name as it appears in the Orders v0 reference.
    pub fn name(self) -> &'static str {
        match self {
            Operation::ListOrders => "getOrders",
            Operation::GetOrder => "getOrder",
            Operation::GetOrderBuyerInfo => "getOrderBuyerInfo",
            Operation::GetOrderAddress => "getOrderAddress",
            Operation::GetOrderItems => "getOrderItems",
            Operation::GetOrderItemsBuyerInfo => "getOrderItemsBuyerInfo",
        }
    }

    /// Suffix appended after `/orders/v0/orders/{orderId}`.
    fn suffix(self) -> &'static str {
        match self {
            Operation::ListOrders | Operation::GetOrder => "",
            Operation::GetOrderBuyerInfo => "/buyerInfo",
            Operation::GetOrderAddress => "/address",
            Operation::GetOrderItems => "/orderItems",
            Operation::GetOrderItemsBuyerInfo => "/orderItems/buyerInfo",
        }
    }

    /// Resource path for this operation. Each of `path_params` is
    /// percent-encoded as one segment between the root and the suffix.
    pub fn path(self, path_params: &[String]) -> String {
        let mut path = String::from(ORDERS_ROOT);
        for segment in path_params {
            path.push('/');
            path.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        path.push_str(self.suffix());
        path
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single query parameter value before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    /// Rendered as one joined value; see `ListEncoding`.
    List(Vec<String>),
}

/// Everything needed to build one call: which operation, its path segments,
/// and its query parameters in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub operation: Operation,
    pub path_params: Vec<String>,
    pub query_params: Vec<(String, QueryValue)>,
}

impl OperationRequest {
    pub fn list_orders(query: &ListOrdersQuery) -> Self {
        Self {
            operation: Operation::ListOrders,
            path_params: Vec::new(),
            query_params: query.to_params(),
        }
    }

    pub fn get_order(order_id: &str) -> Self {
        Self::for_order(Operation::GetOrder, order_id)
    }

    pub fn get_order_buyer_info(order_id: &str) -> Self {
        Self::for_order(Operation::GetOrderBuyerInfo, order_id)
    }

    pub fn get_order_address(order_id: &str) -> Self {
        Self::for_order(Operation::GetOrderAddress, order_id)
    }

    pub fn get_order_items(order_id: &str) -> Self {
        Self::for_order(Operation::GetOrderItems, order_id)
    }

    pub fn get_order_items_buyer_info(order_id: &str) -> Self {
        Self::for_order(Operation::GetOrderItemsBuyerInfo, order_id)
    }

    fn for_order(operation: Operation, order_id: &str) -> Self {
        Self {
            operation,
            path_params: vec![order_id.to_string()],
            query_params: Vec::new(),
        }
    }

    /// The order id this request targets, if any.
    pub fn order_id(&self) -> Option<&str> {
        self.path_params.first().map(String::as_str)
    }

    pub fn path(&self) -> String {
        self.operation.path(&self.path_params)
    }
}
