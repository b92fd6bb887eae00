//! What the board publishes: snapshots of its state, and one-off notices.

use crate::board_actor::{ResolutionPath, StoreResolutionError};
use crate::model::{Order, OrderId, OrderStatus, StoreId};
use crate::view::BoardColumns;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum BoardPhase {
    /// Resolving the store or loading the first list.
    Loading,
    Ready {
        store_id: StoreId,
        path: ResolutionPath,
    },
    /// Terminal until the next reload.
    StoreNotFound(StoreResolutionError),
}

/// An immutable copy of the board state.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub phase: BoardPhase,
    /// Newest first, as fetched.
    pub orders: Vec<Order>,
    /// Orders with a status write in flight.
    pub pending: BTreeSet<OrderId>,
    /// Increases with every publish.
    pub version: u64,
}

impl BoardSnapshot {
    pub fn loading() -> Self {
        Self {
            phase: BoardPhase::Loading,
            orders: Vec::new(),
            pending: BTreeSet::new(),
            version: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == BoardPhase::Loading
    }

    pub fn store_id(&self) -> Option<&StoreId> {
        match &self.phase {
            BoardPhase::Ready { store_id, .. } => Some(store_id),
            _ => None,
        }
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == order_id)
    }

    pub fn status_of(&self, order_id: OrderId) -> Option<&OrderStatus> {
        self.order(order_id).map(|order| &order.status)
    }

    pub fn is_pending(&self, order_id: OrderId) -> bool {
        self.pending.contains(&order_id)
    }

    pub fn columns(&self) -> BoardColumns<'_> {
        BoardColumns::partition(&self.orders)
    }
}

/// A transient message for the operator (a toast), optionally with a chime.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardNotice {
    /// An INSERT arrived on the feed. The id is absent when the payload lacks one.
    NewOrder { order_id: Option<OrderId> },
    StatusUpdated {
        order_id: OrderId,
        status: OrderStatus,
    },
    /// The write failed and the order went back to `restored`.
    StatusUpdateFailed {
        order_id: OrderId,
        restored: OrderStatus,
    },
    LoadFailed,
}

impl BoardNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "Novo pedido recebido! 🔔",
            Self::StatusUpdated { .. } => "Status atualizado!",
            Self::StatusUpdateFailed { .. } => "Erro ao atualizar status.",
            Self::LoadFailed => "Erro ao carregar pedidos.",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::StatusUpdateFailed { .. } | Self::LoadFailed)
    }

    /// Whether the dashboard plays the notification sound.
    pub fn plays_chime(&self) -> bool {
        matches!(self, Self::NewOrder { .. })
    }
}
