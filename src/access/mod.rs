//! # Order Access Layer
//!
//! Every read, write and subscription the board issues goes through the three
//! traits in this module. They are the seam between the board and the backing
//! store; only the concrete backends know what the store looks like on the wire.
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`OrderStore`] | `get_store_orders`, `update_order_status` |
//! | [`StoreDirectory`] | the three lookups behind store resolution |
//! | [`OrderFeed`] | `subscribe` to row changes of one store |
//!
//! ## Backends
//!
//! - [`rest::RestBackend`] talks PostgREST over HTTP.
//! - [`memory::InMemoryBackend`] keeps everything in process and pushes events
//!   on every write. The demo binary and the integration tests run on it.
//! - [`polling::PollingOrderFeed`] turns any [`OrderStore`] into a change feed
//!   by polling and diffing, for deployments without server push.
//! - [`mock`] holds expectation-driven doubles for failure injection.
//!
//! ## Limitations
//!
//! `get_store_orders` has no pagination: the board assumes the whole order set
//! of a store fits in memory.

pub mod error;
pub mod memory;
pub mod mock;
pub mod polling;
pub mod rest;
pub mod subscription;

pub use error::*;
pub use subscription::*;

use crate::model::{ChangeEvent, Order, OrderId, OrderStatus, StoreId, UserId};
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked for every change event of a subscription.
pub type EventSink = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Reads and writes orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders of `store_id` with items and customer profile, newest first.
    async fn get_store_orders(&self, store_id: &StoreId) -> Result<Vec<Order>, FetchError>;

    /// Writes `status` on exactly one order. Does not check that the transition is legal.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), UpdateError>;
}

/// Lookups used to find the store an operator manages.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn store_owned_by(&self, owner: &UserId) -> Result<Option<StoreId>, FetchError>;

    /// Any single store visible to this client.
    async fn any_visible_store(&self) -> Result<Option<StoreId>, FetchError>;

    /// The store of any existing order.
    async fn any_order_store(&self) -> Result<Option<StoreId>, FetchError>;
}

/// Opens change feeds filtered by store.
pub trait OrderFeed: Send + Sync {
    /// Starts delivering insert/update/delete events for rows of `store_id` to `on_event`.
    /// No ordering guarantee across events.
    fn subscribe(&self, store_id: &StoreId, on_event: EventSink) -> Result<Subscription, FeedError>;
}
