//! Error types for the Board actor.

use crate::access::{FetchError, UpdateError};
use crate::framework::FrameworkError;
use crate::model::{OrderId, OrderStatus, UserId};
use thiserror::Error;

/// Why no store could be attached to the board.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreResolutionError {
    #[error("No operator is signed in")]
    NoSession,

    /// Owner lookup, visible-store lookup and order inference all came back empty.
    #[error("No store found for operator {0}")]
    NotFound(UserId),
}

/// Errors answered by the board to its clients.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BoardError {
    /// The store is still being resolved or the first list is still loading.
    #[error("Board is still loading")]
    Loading,

    #[error("Store resolution failed: {0}")]
    StoreResolution(#[from] StoreResolutionError),

    #[error("Order {0} is not on the board")]
    OrderNotFound(OrderId),

    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// `advance` on a status with no forward step.
    #[error("Order {order_id} has no action in status {status}")]
    NoAction {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A status write for this order has not resolved yet.
    #[error("Order {0} already has a status change in flight")]
    UpdateInFlight(OrderId),

    #[error("Failed to load orders: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to update status: {0}")]
    Update(#[from] UpdateError),

    /// The board was reloaded before this request completed.
    #[error("Board was reloaded before the request completed")]
    Superseded,

    #[error("Actor communication error: {0}")]
    Actor(#[from] FrameworkError),
}
