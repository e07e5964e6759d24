//! Synchronous client for the Amazon Selling Partner API Orders v0 resource.
//!
//! # Overview
//! Six read-only operations (`getOrders`, `getOrder`, `getOrderBuyerInfo`,
//! `getOrderAddress`, `getOrderItems`, `getOrderItemsBuyerInfo`), each
//! returning the same `{info, error, headers, response}` envelope.
//!
//! # Design
//! - `OrdersClient` stores only immutable configuration; each call builds an
//!   `HttpRequest`, hands it to a `Transport`, and normalizes the
//!   `TransferResult` into an `OperationResult`.
//! - Building and normalizing are pure, so both are tested without I/O.
//! - Nothing in a call returns `Err`. Transport failures land in
//!   `OperationResult::error`; API failures are a non-2xx `info.http_code`.
//! - `OrdersApi` is the seam for dependency injection: pass an
//!   `OrdersClient` in production and an `OrdersFake` in tests.
//! - Pagination is not automated; `OperationResult::next_token` surfaces the
//!   cursor for the caller to resubmit.

pub mod api;
pub mod client;
pub mod error;
pub mod fake;
pub mod headers;
pub mod http;
pub mod operation;
pub mod query;
pub mod response;
pub mod transport;

pub use api::OrdersApi;
pub use client::{ClientConfig, OrdersClient, DEFAULT_BASE_URI};
pub use error::Error;
pub use fake::{OrdersFake, ResponseFactory};
pub use http::{HttpRequest, TransferInfo, TransferResult, TransportOptions};
pub use operation::{Operation, OperationRequest, QueryValue};
pub use query::{ListEncoding, ListOrdersQuery};
pub use response::{normalize, ApiError, OperationResult};
pub use transport::{Transport, UreqTransport};
