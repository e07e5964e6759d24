//! Error types for the Orders client.
//!
//! # Design
//! Only setting a client up can fail. Building a request, dispatching it and
//! normalizing the transfer are infallible: transport failures travel in
//! `OperationResult::error`, and API failures show up as a non-2xx
//! `info.http_code` with the API's own `errors` body in `response`.

use thiserror::Error;

/// Errors returned while constructing or configuring an `OrdersClient`.
#[derive(Debug, Error)]
pub enum Error {
    /// The base URI is not an absolute http(s) URL.
    #[error("invalid base URI '{value}': {reason}")]
    InvalidBaseUri { value: String, reason: String },

    /// A required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// An environment variable is set but cannot be used.
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}
