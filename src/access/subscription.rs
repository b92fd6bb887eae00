//! # Change-feed subscriptions
//!
//! A [`Subscription`] is the handle returned by [`OrderFeed::subscribe`](super::OrderFeed::subscribe).
//! Whoever holds it owns the feed connection: dropping it, or calling
//! [`Subscription::unsubscribe`] any number of times, tears the connection down
//! exactly once.
//!
//! Feeds deliver through a [`GatedSink`]. Closing the gate is the first thing an
//! unsubscribe does, so an event racing with teardown is discarded instead of
//! reaching a callback whose owner has moved on.

use crate::access::EventSink;
use crate::model::ChangeEvent;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Handle to an open change feed.
pub struct Subscription {
    topic: String,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps the feed-specific teardown in a handle. `cancel` runs at most once.
    pub fn new(topic: impl Into<String>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            topic: topic.into(),
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Closes the feed. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            info!(topic = %self.topic, "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Topic name for the orders feed of one store.
pub fn orders_topic(store_id: &crate::model::StoreId) -> String {
    format!("orders:store_id=eq.{store_id}")
}

/// An event callback behind an on/off switch.
#[derive(Clone)]
pub struct GatedSink {
    open: Arc<AtomicBool>,
    sink: EventSink,
}

impl GatedSink {
    pub fn new(sink: EventSink) -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
            sink,
        }
    }

    /// Invokes the callback unless the gate is closed. Returns whether it ran.
    pub fn deliver(&self, event: ChangeEvent) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        (self.sink)(event);
        true
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
