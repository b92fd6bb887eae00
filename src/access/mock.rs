//! # Access Mocks
//!
//! Test doubles for the three access traits.
//!
//! - [`MockOrderStore`]: scripted answers for reads and writes, with optional
//!   gates so a test decides exactly when a call completes.
//! - [`MockStoreDirectory`]: fixed lookup answers plus a record of which
//!   lookups ran, in order.
//! - [`MockOrderFeed`]: captures the subscriber callback so a test can fire
//!   events by hand.
//!
//! Calls run on tasks spawned by the board, where a panic would go unnoticed.
//! So a call with no matching expectation answers with an `Unexpected` error
//! and is recorded; [`MockOrderStore::verify`] panics on it afterwards.

use crate::access::{
    orders_topic, EventSink, FeedError, FetchError, GatedSink, OrderFeed, OrderStore,
    StoreDirectory, Subscription, UpdateError,
};
use crate::model::{ChangeEvent, Order, OrderId, OrderStatus, StoreId, UserId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

// =============================================================================
// ORDER STORE
// =============================================================================

struct FetchExpectation {
    store_id: StoreId,
    response: Result<Vec<Order>, FetchError>,
    gate: Option<oneshot::Receiver<()>>,
}

struct UpdateExpectation {
    order_id: OrderId,
    status: Option<OrderStatus>,
    response: Result<(), UpdateError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// A call received by [`MockOrderStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch(StoreId),
    Update(OrderId, OrderStatus),
}

/// An [`OrderStore`] answering from queued expectations.
///
/// Reads and writes have separate queues, since the board issues them from
/// independent tasks.
///
/// # Example
/// ```ignore
/// let store = MockOrderStore::new();
/// store.expect_fetch("s1").return_ok(vec![order]);
/// store.expect_update(OrderId(1)).with_status(OrderStatus::Preparing).return_err(error);
///
/// let ctx = BoardContext::new(Arc::new(store.clone()), ...);
/// // Drive the board...
/// store.verify(); // Ensures all expectations were met
/// ```
#[derive(Clone, Default)]
pub struct MockOrderStore {
    fetches: Arc<Mutex<VecDeque<FetchExpectation>>>,
    updates: Arc<Mutex<VecDeque<UpdateExpectation>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    mismatches: Arc<Mutex<Vec<String>>>,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a `get_store_orders` for `store_id`.
    pub fn expect_fetch(&self, store_id: impl Into<StoreId>) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            store_id: store_id.into(),
            gate: None,
            queue: self.fetches.clone(),
        }
    }

    /// Expects an `update_order_status` on `order_id`.
    pub fn expect_update(&self, order_id: OrderId) -> UpdateExpectationBuilder {
        UpdateExpectationBuilder {
            order_id,
            status: None,
            gate: None,
            queue: self.updates.clone(),
        }
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Fetch(_)))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Update(..)))
            .count()
    }

    /// Verifies that all expectations were met and no call was unexpected.
    pub fn verify(&self) {
        let mismatches = self.mismatches.lock().unwrap();
        if !mismatches.is_empty() {
            panic!("Unexpected calls: {:?}", *mismatches);
        }
        let fetches = self.fetches.lock().unwrap().len();
        let updates = self.updates.lock().unwrap().len();
        if fetches + updates > 0 {
            panic!(
                "Not all expectations were met. {fetches} fetch(es) and {updates} update(s) remaining"
            );
        }
    }

    fn mismatch(&self, description: String) -> String {
        self.mismatches.lock().unwrap().push(description.clone());
        description
    }
}

async fn pass(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn get_store_orders(&self, store_id: &StoreId) -> Result<Vec<Order>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Fetch(store_id.clone()));
        let expectation = self.fetches.lock().unwrap().pop_front();
        match expectation {
            Some(expected) if &expected.store_id == store_id => {
                pass(expected.gate).await;
                expected.response
            }
            Some(expected) => Err(FetchError::Unexpected(self.mismatch(format!(
                "fetch for {store_id}, expected {}",
                expected.store_id
            )))),
            None => Err(FetchError::Unexpected(
                self.mismatch(format!("fetch for {store_id}")),
            )),
        }
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), UpdateError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Update(order_id, status.clone()));
        let expectation = self.updates.lock().unwrap().pop_front();
        match expectation {
            Some(expected)
                if expected.order_id == order_id
                    && expected.status.as_ref().map_or(true, |s| s == status) =>
            {
                pass(expected.gate).await;
                expected.response
            }
            Some(expected) => Err(UpdateError::Unexpected(self.mismatch(format!(
                "update {order_id} to {status}, expected {} to {:?}",
                expected.order_id, expected.status
            )))),
            None => Err(UpdateError::Unexpected(
                self.mismatch(format!("update {order_id} to {status}")),
            )),
        }
    }
}

/// Builder for fetch expectations.
pub struct FetchExpectationBuilder {
    store_id: StoreId,
    gate: Option<oneshot::Receiver<()>>,
    queue: Arc<Mutex<VecDeque<FetchExpectation>>>,
}

impl FetchExpectationBuilder {
    /// Holds the answer back until `gate` fires (or its sender is dropped).
    pub fn gated(mut self, gate: oneshot::Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn return_ok(self, orders: Vec<Order>) {
        self.push(Ok(orders));
    }

    pub fn return_err(self, error: FetchError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Vec<Order>, FetchError>) {
        self.queue.lock().unwrap().push_back(FetchExpectation {
            store_id: self.store_id,
            response,
            gate: self.gate,
        });
    }
}

/// Builder for update expectations.
pub struct UpdateExpectationBuilder {
    order_id: OrderId,
    status: Option<OrderStatus>,
    gate: Option<oneshot::Receiver<()>>,
    queue: Arc<Mutex<VecDeque<UpdateExpectation>>>,
}

impl UpdateExpectationBuilder {
    /// Also requires the written status to match.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Holds the answer back until `gate` fires (or its sender is dropped).
    pub fn gated(mut self, gate: oneshot::Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn return_ok(self) {
        self.push(Ok(()));
    }

    pub fn return_err(self, error: UpdateError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<(), UpdateError>) {
        self.queue.lock().unwrap().push_back(UpdateExpectation {
            order_id: self.order_id,
            status: self.status,
            response,
            gate: self.gate,
        });
    }
}

// =============================================================================
// STORE DIRECTORY
// =============================================================================

/// A lookup performed against [`MockStoreDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStep {
    ByOwner(UserId),
    AnyVisible,
    FromOrders,
}

/// A [`StoreDirectory`] with fixed answers. Every answer defaults to "no row".
#[derive(Clone)]
pub struct MockStoreDirectory {
    owned: Result<Option<StoreId>, FetchError>,
    visible: Result<Option<StoreId>, FetchError>,
    from_orders: Result<Option<StoreId>, FetchError>,
    steps: Arc<Mutex<Vec<LookupStep>>>,
}

impl Default for MockStoreDirectory {
    fn default() -> Self {
        Self {
            owned: Ok(None),
            visible: Ok(None),
            from_orders: Ok(None),
            steps: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockStoreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owned_store(mut self, store_id: impl Into<StoreId>) -> Self {
        self.owned = Ok(Some(store_id.into()));
        self
    }

    pub fn with_visible_store(mut self, store_id: impl Into<StoreId>) -> Self {
        self.visible = Ok(Some(store_id.into()));
        self
    }

    pub fn with_order_store(mut self, store_id: impl Into<StoreId>) -> Self {
        self.from_orders = Ok(Some(store_id.into()));
        self
    }

    /// Makes the owner lookup fail instead of answering.
    pub fn failing_owner_lookup(mut self, error: FetchError) -> Self {
        self.owned = Err(error);
        self
    }

    /// Lookups performed so far, in order.
    pub fn steps(&self) -> Vec<LookupStep> {
        self.steps.lock().unwrap().clone()
    }

    fn record(&self, step: LookupStep) {
        self.steps.lock().unwrap().push(step);
    }
}

#[async_trait]
impl StoreDirectory for MockStoreDirectory {
    async fn store_owned_by(&self, owner: &UserId) -> Result<Option<StoreId>, FetchError> {
        self.record(LookupStep::ByOwner(owner.clone()));
        self.owned.clone()
    }

    async fn any_visible_store(&self) -> Result<Option<StoreId>, FetchError> {
        self.record(LookupStep::AnyVisible);
        self.visible.clone()
    }

    async fn any_order_store(&self) -> Result<Option<StoreId>, FetchError> {
        self.record(LookupStep::FromOrders);
        self.from_orders.clone()
    }
}

// =============================================================================
// ORDER FEED
// =============================================================================

#[derive(Default)]
struct FeedInner {
    sinks: Vec<(StoreId, GatedSink)>,
    subscribe_count: usize,
    failure: Option<FeedError>,
}

/// An [`OrderFeed`] whose events are fired by the test.
#[derive(Clone, Default)]
pub struct MockOrderFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl MockOrderFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// A feed whose `subscribe` always fails with `error`.
    pub fn failing(error: FeedError) -> Self {
        let feed = Self::default();
        feed.inner.lock().unwrap().failure = Some(error);
        feed
    }

    /// Delivers `event` to every open subscription. Returns how many received it.
    pub fn push(&self, event: ChangeEvent) -> usize {
        let sinks: Vec<GatedSink> = self
            .inner
            .lock()
            .unwrap()
            .sinks
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect();
        sinks
            .into_iter()
            .filter(|sink| sink.deliver(event.clone()))
            .count()
    }

    pub fn subscribe_count(&self) -> usize {
        self.inner.lock().unwrap().subscribe_count
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .sinks
            .iter()
            .filter(|(_, sink)| sink.is_open())
            .count()
    }

    /// Stores of the open subscriptions.
    pub fn subscribed_stores(&self) -> Vec<StoreId> {
        self.inner
            .lock()
            .unwrap()
            .sinks
            .iter()
            .filter(|(_, sink)| sink.is_open())
            .map(|(store, _)| store.clone())
            .collect()
    }
}

impl OrderFeed for MockOrderFeed {
    fn subscribe(&self, store_id: &StoreId, on_event: EventSink) -> Result<Subscription, FeedError> {
        let mut inner = self.inner.lock().unwrap();
        inner.subscribe_count += 1;
        if let Some(error) = inner.failure.clone() {
            return Err(error);
        }
        let sink = GatedSink::new(on_event);
        inner.sinks.push((store_id.clone(), sink.clone()));
        Ok(Subscription::new(orders_topic(store_id), move || sink.close()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventType;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_store_answers_in_queue_order() {
        let store = MockOrderStore::new();
        let order = Order::new(1, StoreId::new("s1"), dec!(10));
        store.expect_fetch("s1").return_ok(vec![order.clone()]);
        store
            .expect_fetch("s1")
            .return_err(FetchError::Transport("down".into()));

        let s1 = StoreId::new("s1");
        assert_eq!(store.get_store_orders(&s1).await, Ok(vec![order]));
        assert!(store.get_store_orders(&s1).await.is_err());
        store.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected calls")]
    async fn test_unexpected_update_fails_verify() {
        let store = MockOrderStore::new();
        let result = store
            .update_order_status(OrderId(1), &OrderStatus::Preparing)
            .await;
        assert!(matches!(result, Err(UpdateError::Unexpected(_))));
        store.verify();
    }

    #[tokio::test]
    async fn test_gated_update_waits_for_release() {
        let store = MockOrderStore::new();
        let (release, gate) = oneshot::channel();
        store.expect_update(OrderId(1)).gated(gate).return_ok();

        let pending = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .update_order_status(OrderId(1), &OrderStatus::Preparing)
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        release.send(()).unwrap();
        assert_eq!(pending.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_directory_records_steps() {
        let directory = MockStoreDirectory::new().with_visible_store("s2");
        assert_eq!(directory.store_owned_by(&UserId::new("u1")).await, Ok(None));
        assert_eq!(
            directory.any_visible_store().await,
            Ok(Some(StoreId::new("s2")))
        );
        assert_eq!(
            directory.steps(),
            vec![LookupStep::ByOwner(UserId::new("u1")), LookupStep::AnyVisible]
        );
    }

    #[test]
    fn test_feed_push_reaches_open_subscriptions_only() {
        let feed = MockOrderFeed::new();
        let mut first = feed
            .subscribe(&StoreId::new("s1"), Arc::new(|_| {}))
            .unwrap();
        let _second = feed
            .subscribe(&StoreId::new("s1"), Arc::new(|_| {}))
            .unwrap();
        first.unsubscribe();

        let event = ChangeEvent::new(EventType::Insert, serde_json::json!({ "id": 1 }));
        assert_eq!(feed.push(event), 1);
        assert_eq!(feed.subscribe_count(), 2);
        assert_eq!(feed.active_subscriptions(), 1);
    }
}
