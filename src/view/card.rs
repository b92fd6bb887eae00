use crate::model::{Order, OrderId, OrderStatus};
use crate::view::format::{format_brl, relative_time, truncate};
use chrono::{DateTime, Utc};

/// Longest street line shown on a card.
pub const CARD_STREET_MAX: usize = 32;

/// What a board card shows for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCard {
    pub order_id: OrderId,
    /// `#42`
    pub short_id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub status_label: String,
    pub elapsed: String,
    /// Street, cut to [`CARD_STREET_MAX`], or `Retirada` for pickup.
    pub address_line: String,
    pub total: String,
}

impl OrderCard {
    pub fn new(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id,
            short_id: format!("#{}", order.id),
            customer_name: order.customer_name().unwrap_or("Cliente").to_string(),
            status: order.status.clone(),
            status_label: order.status.label().to_string(),
            elapsed: relative_time(order.created_at, now),
            address_line: order
                .delivery_street()
                .map(|street| truncate(street, CARD_STREET_MAX))
                .unwrap_or_else(|| "Retirada".to_string()),
            total: format_brl(order.total_amount),
        }
    }
}
