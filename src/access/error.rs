//! Error types for the order access layer.

use crate::model::OrderId;
use thiserror::Error;

/// A read of orders (or of the store lookups) could not complete.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// The backend could not be reached.
    #[error("Order store unreachable: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Order store answered {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered with something that is not an order list.
    #[error("Order store response could not be decoded: {0}")]
    Decode(String),

    /// A test double received a read it was not told to expect.
    #[error("Unexpected fetch: {0}")]
    Unexpected(String),
}

/// A status write failed. The caller must roll back any optimistic change.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UpdateError {
    /// The backend could not be reached.
    #[error("Order store unreachable: {0}")]
    Transport(String),

    /// The backend refused the write.
    #[error("Status write for order {order_id} rejected: {reason}")]
    Rejected { order_id: OrderId, reason: String },

    /// The backend answered the write with a body that could not be read.
    #[error("Status write for order {order_id} returned an unreadable response: {reason}")]
    Decode { order_id: OrderId, reason: String },

    /// No row matched the order id.
    #[error("Order {0} not found")]
    NotFound(OrderId),

    /// A test double received a write it was not told to expect.
    #[error("Unexpected update: {0}")]
    Unexpected(String),
}

/// The change feed could not be opened.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("Subscription to {topic} failed: {reason}")]
    SubscribeFailed { topic: String, reason: String },
}
