use crate::access::{FetchError, UpdateError};
use crate::board_actor::{BoardError, BoardSnapshot, ResolvedStore, StoreResolutionError};
use crate::framework::Response;
use crate::model::{ChangeEvent, Order, OrderId, OrderStatus, StoreId, UserId};

/// Messages handled by the board.
///
/// The first five come from [`BoardClient`](crate::clients::BoardClient). The
/// rest are posted back by the board's own spawned work, the session watcher
/// and the change feed; most carry the generation it was started under so results from
/// before a reload can be told apart.
#[derive(Debug)]
pub enum BoardRequest {
    Snapshot {
        respond_to: Response<BoardSnapshot>,
    },
    ChangeStatus {
        order_id: OrderId,
        status: OrderStatus,
        respond_to: Response<Result<OrderStatus, BoardError>>,
    },
    Advance {
        order_id: OrderId,
        respond_to: Response<Result<OrderStatus, BoardError>>,
    },
    Refresh {
        respond_to: Option<Response<Result<usize, BoardError>>>,
    },
    Reload {
        respond_to: Option<Response<Result<StoreId, BoardError>>>,
    },

    SessionChanged {
        user_id: Option<UserId>,
    },
    StoreResolved {
        generation: u64,
        user_id: Option<UserId>,
        outcome: Result<ResolvedStore, StoreResolutionError>,
        respond_to: Option<Response<Result<StoreId, BoardError>>>,
    },
    Realtime {
        generation: u64,
        event: ChangeEvent,
    },
    OrdersFetched {
        generation: u64,
        result: Result<Vec<Order>, FetchError>,
        waiter: FetchWaiter,
    },
    StatusWritten {
        generation: u64,
        order_id: OrderId,
        previous: OrderStatus,
        attempted: OrderStatus,
        result: Result<(), UpdateError>,
        respond_to: Response<Result<OrderStatus, BoardError>>,
    },
}

/// Who is waiting on the outcome of a fetch.
#[derive(Debug)]
pub enum FetchWaiter {
    /// Event-driven refetch.
    Nobody,
    /// The first fetch after a (re)load.
    Load(Response<Result<StoreId, BoardError>>),
    /// A manual refresh; answered with the number of orders.
    Refresh(Response<Result<usize, BoardError>>),
}

impl FetchWaiter {
    pub(crate) fn succeed(self, store_id: &StoreId, count: usize) {
        match self {
            Self::Nobody => {}
            Self::Load(respond_to) => {
                let _ = respond_to.send(Ok(store_id.clone()));
            }
            Self::Refresh(respond_to) => {
                let _ = respond_to.send(Ok(count));
            }
        }
    }

    pub(crate) fn fail(self, error: BoardError) {
        match self {
            Self::Nobody => {}
            Self::Load(respond_to) => {
                let _ = respond_to.send(Err(error));
            }
            Self::Refresh(respond_to) => {
                let _ = respond_to.send(Err(error));
            }
        }
    }
}
