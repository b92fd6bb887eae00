//! # In-Memory Backend
//!
//! A process-local store that implements all three access traits. Every write
//! pushes a change event to the subscribers of the affected store, the same way
//! the hosted backend does, so the board behaves identically on top of it.
//!
//! Event records carry only the bare order row (id, store, status), never the
//! joined items or customer. Consumers must refetch.

use crate::access::{
    orders_topic, EventSink, FeedError, FetchError, GatedSink, OrderFeed, OrderStore,
    StoreDirectory, Subscription, UpdateError,
};
use crate::model::{
    ChangeEvent, EventType, Order, OrderId, OrderStatus, StoreId, StoreRecord, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Default)]
struct Inner {
    stores: Vec<StoreRecord>,
    orders: BTreeMap<OrderId, Order>,
    subscribers: HashMap<u64, (StoreId, GatedSink)>,
    next_subscriber: u64,
}

/// Shared in-process store. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Subscribers never run under this lock.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_store(&self, store: StoreRecord) {
        info!(store_id = %store.id, name = %store.name, "Store added");
        self.lock().stores.push(store);
    }

    /// Inserts (or replaces) an order and emits `INSERT`.
    pub fn insert_order(&self, order: Order) {
        let event = ChangeEvent::new(EventType::Insert, bare_row(&order));
        let store_id = order.store_id.clone();
        debug!(order_id = %order.id, %store_id, "Order inserted");
        self.lock().orders.insert(order.id, order);
        self.emit(&store_id, event);
    }

    /// Removes an order and emits `DELETE`. Returns whether it existed.
    pub fn remove_order(&self, order_id: OrderId) -> bool {
        let removed = self.lock().orders.remove(&order_id);
        match removed {
            Some(order) => {
                let event = ChangeEvent::new(EventType::Delete, json!({ "id": order.id.0 }));
                self.emit(&order.store_id, event);
                true
            }
            None => false,
        }
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.lock().orders.get(&order_id).cloned()
    }

    /// Number of subscriptions that have not been closed.
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .values()
            .filter(|(_, sink)| sink.is_open())
            .count()
    }

    /// Delivers a raw event to every open subscriber of `store_id`.
    ///
    /// Callbacks run after the lock is released.
    pub fn emit(&self, store_id: &StoreId, event: ChangeEvent) -> usize {
        let sinks: Vec<GatedSink> = self
            .lock()
            .subscribers
            .values()
            .filter(|(store, _)| store == store_id)
            .map(|(_, sink)| sink.clone())
            .collect();

        sinks
            .into_iter()
            .filter(|sink| sink.deliver(event.clone()))
            .count()
    }
}

fn bare_row(order: &Order) -> serde_json::Value {
    json!({
        "id": order.id.0,
        "store_id": order.store_id.as_str(),
        "status": order.status.as_str(),
    })
}

#[async_trait]
impl OrderStore for InMemoryBackend {
    async fn get_store_orders(&self, store_id: &StoreId) -> Result<Vec<Order>, FetchError> {
        let mut orders: Vec<Order> = self
            .lock()
            .orders
            .values()
            .filter(|order| &order.store_id == store_id)
            .cloned()
            .collect();
        // created_at DESC with missing timestamps first, as Postgres sorts them.
        orders.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x).then(b.id.cmp(&a.id)),
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, None) => b.id.cmp(&a.id),
        });
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), UpdateError> {
        let (store_id, event) = {
            let mut inner = self.lock();
            let order = inner
                .orders
                .get_mut(&order_id)
                .ok_or(UpdateError::NotFound(order_id))?;
            order.status = status.clone();
            order.updated_at = Some(Utc::now());
            (
                order.store_id.clone(),
                ChangeEvent::new(EventType::Update, bare_row(order)),
            )
        };
        debug!(%order_id, %status, "Status written");
        self.emit(&store_id, event);
        Ok(())
    }
}

#[async_trait]
impl StoreDirectory for InMemoryBackend {
    async fn store_owned_by(&self, owner: &UserId) -> Result<Option<StoreId>, FetchError> {
        Ok(self
            .lock()
            .stores
            .iter()
            .find(|store| store.owner_id.as_ref() == Some(owner))
            .map(|store| store.id.clone()))
    }

    async fn any_visible_store(&self) -> Result<Option<StoreId>, FetchError> {
        Ok(self.lock().stores.first().map(|store| store.id.clone()))
    }

    async fn any_order_store(&self) -> Result<Option<StoreId>, FetchError> {
        Ok(self
            .lock()
            .orders
            .values()
            .next()
            .map(|order| order.store_id.clone()))
    }
}

impl OrderFeed for InMemoryBackend {
    fn subscribe(&self, store_id: &StoreId, on_event: EventSink) -> Result<Subscription, FeedError> {
        let sink = GatedSink::new(on_event);
        let key = {
            let mut inner = self.lock();
            let key = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.insert(key, (store_id.clone(), sink.clone()));
            key
        };
        let topic = orders_topic(store_id);
        info!(%topic, "Subscribed");

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(topic, move || {
            sink.close();
            if let Some(inner) = inner.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                inner.subscribers.remove(&key);
            }
        }))
    }
}
