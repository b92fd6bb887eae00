use crate::model::OrderId;
use serde::{Deserialize, Serialize};

/// Kind of row change delivered by the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Insert,
    Update,
    Delete,
}

/// A raw change notification for one order row.
///
/// The record is a hint that something changed, not a source of truth: the board
/// always refetches instead of merging fields from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn new(event_type: EventType, record: serde_json::Value) -> Self {
        Self { event_type, record }
    }

    /// The order id carried by the record, when present.
    pub fn order_id(&self) -> Option<OrderId> {
        self.record.get("id")?.as_i64().map(OrderId)
    }
}
