//! # Polling change feed
//!
//! [`PollingOrderFeed`] gives any [`OrderStore`] a change feed by refetching the
//! store's orders on a [`Scheduler`] and diffing consecutive results per order
//! id on `(status, updated_at, total_amount)`.
//!
//! The first poll only records a baseline and emits nothing. A failed poll is
//! logged and skipped; the baseline is kept for the next one.

use crate::access::{
    orders_topic, EventSink, FeedError, GatedSink, OrderFeed, OrderStore, Subscription,
};
use crate::model::{ChangeEvent, EventType, Order, OrderId, OrderStatus, StoreId};
use crate::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

type Fingerprint = (OrderStatus, Option<DateTime<Utc>>, Decimal);

pub struct PollingOrderFeed {
    store: Arc<dyn OrderStore>,
    interval: Duration,
}

impl PollingOrderFeed {
    pub fn new(store: Arc<dyn OrderStore>, interval: Duration) -> Self {
        Self { store, interval }
    }
}

impl OrderFeed for PollingOrderFeed {
    fn subscribe(&self, store_id: &StoreId, on_event: EventSink) -> Result<Subscription, FeedError> {
        let topic = orders_topic(store_id);
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(FeedError::SubscribeFailed {
                topic,
                reason: "no Tokio runtime to poll on".to_string(),
            });
        }

        let sink = GatedSink::new(on_event);
        let baseline: Arc<Mutex<Option<HashMap<OrderId, Fingerprint>>>> = Arc::new(Mutex::new(None));
        let store = self.store.clone();
        let polled_store = store_id.clone();
        let poll_sink = sink.clone();

        let mut task = Scheduler::every("order-poll", self.interval, move || {
            let store = store.clone();
            let store_id = polled_store.clone();
            let sink = poll_sink.clone();
            let baseline = baseline.clone();
            async move {
                let orders = match store.get_store_orders(&store_id).await {
                    Ok(orders) => orders,
                    Err(e) => {
                        warn!(%store_id, error = %e, "Poll failed");
                        return;
                    }
                };
                let current = fingerprints(&orders);
                let events = {
                    let mut baseline = baseline.lock().unwrap_or_else(|p| p.into_inner());
                    let events = baseline
                        .as_ref()
                        .map(|previous| diff(previous, &current, &orders, &store_id))
                        .unwrap_or_default();
                    *baseline = Some(current);
                    events
                };
                for event in events {
                    if !sink.deliver(event) {
                        break;
                    }
                }
            }
        });

        info!(%topic, interval_ms = self.interval.as_millis() as u64, "Polling subscription opened");
        Ok(Subscription::new(topic, move || {
            sink.close();
            task.cancel();
        }))
    }
}

fn fingerprints(orders: &[Order]) -> HashMap<OrderId, Fingerprint> {
    orders
        .iter()
        .map(|order| {
            (
                order.id,
                (order.status.clone(), order.updated_at, order.total_amount),
            )
        })
        .collect()
}

/// Events turning `previous` into `current`. Inserts and updates follow the
/// order of `orders`; deletes come last, by ascending id.
fn diff(
    previous: &HashMap<OrderId, Fingerprint>,
    current: &HashMap<OrderId, Fingerprint>,
    orders: &[Order],
    store_id: &StoreId,
) -> Vec<ChangeEvent> {
    let mut events: Vec<ChangeEvent> = orders
        .iter()
        .filter_map(|order| {
            let event_type = match previous.get(&order.id) {
                None => EventType::Insert,
                Some(seen) if Some(seen) != current.get(&order.id) => EventType::Update,
                Some(_) => return None,
            };
            Some(ChangeEvent::new(
                event_type,
                json!({
                    "id": order.id.0,
                    "store_id": store_id.as_str(),
                    "status": order.status.as_str(),
                }),
            ))
        })
        .collect();

    let mut gone: Vec<OrderId> = previous
        .keys()
        .filter(|id| !current.contains_key(id))
        .copied()
        .collect();
    gone.sort();
    events.extend(
        gone.into_iter()
            .map(|id| ChangeEvent::new(EventType::Delete, json!({ "id": id.0 }))),
    );
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::memory::InMemoryBackend;
    use rust_decimal_macros::dec;

    #[test]
    fn test_diff_reports_insert_update_delete() {
        let s1 = StoreId::new("s1");
        let before = vec![
            Order::new(1, s1.clone(), dec!(10)),
            Order::new(2, s1.clone(), dec!(20)),
        ];
        let after = vec![
            Order::new(3, s1.clone(), dec!(5)),
            Order::new(1, s1.clone(), dec!(10)).with_status(OrderStatus::Preparing),
        ];

        let events = diff(&fingerprints(&before), &fingerprints(&after), &after, &s1);
        let summary: Vec<(EventType, i64)> = events
            .iter()
            .map(|e| (e.event_type, e.order_id().unwrap().0))
            .collect();
        assert_eq!(
            summary,
            vec![
                (EventType::Insert, 3),
                (EventType::Update, 1),
                (EventType::Delete, 2)
            ]
        );
    }

    #[test]
    fn test_subscribe_outside_runtime_fails() {
        let feed = PollingOrderFeed::new(Arc::new(InMemoryBackend::new()), Duration::from_secs(1));
        let result = feed.subscribe(&StoreId::new("s1"), Arc::new(|_| {}));
        assert!(matches!(result, Err(FeedError::SubscribeFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_is_silent_then_changes_are_emitted() {
        let backend = InMemoryBackend::new();
        let s1 = StoreId::new("s1");
        backend.insert_order(Order::new(1, s1.clone(), dec!(10)));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let feed = PollingOrderFeed::new(Arc::new(backend.clone()), Duration::from_secs(5));
        let mut subscription = feed
            .subscribe(&s1, Arc::new(move |e: ChangeEvent| sink_seen.lock().unwrap().push(e)))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().unwrap().is_empty());

        backend.insert_order(Order::new(2, s1.clone(), dec!(15)));
        tokio::time::sleep(Duration::from_secs(5)).await;
        let kinds: Vec<EventType> = seen.lock().unwrap().iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, vec![EventType::Insert]);

        subscription.unsubscribe();
        backend.remove_order(OrderId(1));
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
