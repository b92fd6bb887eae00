//! Order status and the transition table the board enforces.
//!
//! ```text
//! pending ──▶ preparing ──▶ out_for_delivery ──▶ delivered
//!    │            │                │
//!    └────────────┴────────────────┴──────▶ cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal. The string form is canonical; the
//! numeric id some read paths carry is a display-only legacy mapping.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
    /// A status string this board does not know. It renders with its raw text,
    /// sits in no column and offers no action.
    Unrecognized(String),
}

impl OrderStatus {
    /// The five board columns, left to right.
    pub const BOARD_ORDER: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Parses a wire status. `shipped` and `completed` are legacy spellings.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "pending" => Self::Pending,
            "preparing" => Self::Preparing,
            "out_for_delivery" | "shipped" => Self::OutForDelivery,
            "delivered" | "completed" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Badge label shown on a card.
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pendente",
            Self::Preparing => "Em Preparo",
            Self::OutForDelivery => "A Caminho",
            Self::Delivered => "Concluído",
            Self::Cancelled => "Cancelado",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// The single forward step offered to the operator, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        StatusAction::for_status(self).map(|action| action.next_status)
    }

    /// Whether the board accepts a change from `self` to `to`: the forward step,
    /// or cancellation of a known non-terminal order.
    pub fn can_transition_to(&self, to: &OrderStatus) -> bool {
        if self.next().as_ref() == Some(to) {
            return true;
        }
        *to == OrderStatus::Cancelled && self.is_recognized() && !self.is_terminal()
    }

    /// Legacy numeric status id, display only. Never written back.
    pub fn legacy_id(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(1),
            Self::Preparing => Some(2),
            Self::OutForDelivery => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => Some(5),
            Self::Unrecognized(_) => None,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for OrderStatus {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

/// The operator action available for a status: button label plus target status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusAction {
    pub label: &'static str,
    pub next_status: OrderStatus,
}

impl StatusAction {
    /// Pure status → action mapping. Terminal and unknown statuses have none.
    pub fn for_status(status: &OrderStatus) -> Option<Self> {
        let (label, next_status) = match status {
            OrderStatus::Pending => ("Aceitar Pedido", OrderStatus::Preparing),
            OrderStatus::Preparing => ("Despachar", OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => ("Finalizar", OrderStatus::Delivered),
            _ => return None,
        };
        Some(Self { label, next_status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_legacy_spellings() {
        assert_eq!(OrderStatus::parse("shipped"), OrderStatus::OutForDelivery);
        assert_eq!(OrderStatus::parse("completed"), OrderStatus::Delivered);
        assert_eq!(
            OrderStatus::parse("on_hold"),
            OrderStatus::Unrecognized("on_hold".into())
        );
    }

    #[test]
    fn test_forward_chain_ends_at_delivered() {
        let mut status = OrderStatus::Pending;
        let mut visited = vec![status.clone()];
        while let Some(next) = status.next() {
            visited.push(next.clone());
            status = next;
        }
        assert_eq!(
            visited,
            vec![
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ]
        );
    }

    #[test]
    fn test_terminal_states_offer_no_action() {
        assert_eq!(StatusAction::for_status(&OrderStatus::Delivered), None);
        assert_eq!(StatusAction::for_status(&OrderStatus::Cancelled), None);
        assert_eq!(
            StatusAction::for_status(&OrderStatus::Unrecognized("x".into())),
            None
        );
    }

    #[test]
    fn test_transition_rules() {
        assert!(OrderStatus::Pending.can_transition_to(&OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(&OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(&OrderStatus::Delivered));
        assert!(!OrderStatus::Preparing.can_transition_to(&OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.can_transition_to(&OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(&OrderStatus::Pending));
        assert!(!OrderStatus::Unrecognized("x".into()).can_transition_to(&OrderStatus::Cancelled));
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
        let parsed: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(parsed, OrderStatus::OutForDelivery);
    }
}
