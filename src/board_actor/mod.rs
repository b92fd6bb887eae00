//! Order Board actor: the single owner of a store's order list.

pub mod error;
pub mod messages;
pub mod snapshot;
pub mod state;
pub mod store_resolution;

pub use error::*;
pub use messages::*;
pub use snapshot::*;
pub use state::*;
pub use store_resolution::*;

use crate::clients::BoardClient;
use crate::framework::StateActor;
use tokio::sync::{broadcast, watch};

/// Notices buffered per receiver before the slowest one starts lagging.
const NOTICE_CAPACITY: usize = 64;

/// Creates a new Board actor and its client.
pub fn new(capacity: usize) -> (StateActor<OrderBoard>, BoardClient) {
    let (snapshots, snapshot_rx) = watch::channel(BoardSnapshot::loading());
    let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
    let board = OrderBoard::new(snapshots, notices.clone());
    let (actor, mailbox) = StateActor::new(board, capacity);
    (actor, BoardClient::new(mailbox, snapshot_rx, notices))
}
