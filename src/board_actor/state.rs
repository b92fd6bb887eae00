//! # Order Board
//!
//! The board owns the operator's view of one store's orders. It is the only
//! writer of that list; everything else reads published snapshots.
//!
//! ## Reconciliation
//!
//! | Input | Effect |
//! |-------|--------|
//! | start / reload | resolve store, fetch, publish, subscribe |
//! | operator signs in, out, or as someone else | same as reload |
//! | `INSERT` event | `NewOrder` notice, then full refetch |
//! | `UPDATE` / `DELETE` event | full refetch |
//! | operator action | optimistic change, publish, write; roll back on failure |
//!
//! Event payloads are never merged into the list: every event just triggers a
//! refetch, and whichever fetch lands last wins.
//!
//! ## Generations
//!
//! Each load bumps a generation counter. Fetch results, feed events and store
//! resolutions carry the generation they were started under and are dropped
//! when it is no longer current.

use crate::access::{
    EventSink, FetchError, OrderFeed, OrderStore, StoreDirectory, Subscription, UpdateError,
};
use crate::board_actor::{
    resolve_store, BoardError, BoardNotice, BoardPhase, BoardRequest, BoardSnapshot, FetchWaiter,
    ResolvedStore, StoreResolutionError,
};
use crate::clients::SessionClient;
use crate::framework::{ActorState, Response, WeakMailbox};
use crate::model::{ChangeEvent, EventType, Order, OrderId, OrderStatus, StoreId, UserId};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Dependencies injected when the board starts.
#[derive(Clone)]
pub struct BoardContext {
    pub orders: Arc<dyn OrderStore>,
    pub directory: Arc<dyn StoreDirectory>,
    pub feed: Arc<dyn OrderFeed>,
    pub session: SessionClient,
}

pub struct OrderBoard {
    phase: BoardPhase,
    store: Option<ResolvedStore>,
    orders: Vec<Order>,
    pending: BTreeSet<OrderId>,
    subscription: Option<Subscription>,
    subscribe_attempted: bool,
    /// User the current store was resolved for.
    operator: Option<UserId>,
    resolving: bool,
    generation: u64,
    version: u64,
    snapshots: watch::Sender<BoardSnapshot>,
    notices: broadcast::Sender<BoardNotice>,
}

impl OrderBoard {
    pub fn new(
        snapshots: watch::Sender<BoardSnapshot>,
        notices: broadcast::Sender<BoardNotice>,
    ) -> Self {
        Self {
            phase: BoardPhase::Loading,
            store: None,
            orders: Vec::new(),
            pending: BTreeSet::new(),
            subscription: None,
            subscribe_attempted: false,
            operator: None,
            resolving: false,
            generation: 0,
            version: 0,
            snapshots,
            notices,
        }
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            phase: self.phase.clone(),
            orders: self.orders.clone(),
            pending: self.pending.clone(),
            version: self.version,
        }
    }

    fn publish(&mut self) {
        self.version += 1;
        self.snapshots.send_replace(self.snapshot());
    }

    fn notify(&self, notice: BoardNotice) {
        debug!(?notice, "Notice");
        // No receivers is fine: nobody is looking at the board.
        let _ = self.notices.send(notice);
    }

    fn ensure_ready(&self) -> Result<(), BoardError> {
        match &self.phase {
            BoardPhase::Loading => Err(BoardError::Loading),
            BoardPhase::StoreNotFound(e) => Err(e.clone().into()),
            BoardPhase::Ready { .. } => Ok(()),
        }
    }

    fn teardown_subscription(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    fn begin_load(
        &mut self,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
        respond_to: Option<Response<Result<StoreId, BoardError>>>,
    ) {
        self.generation += 1;
        self.teardown_subscription();
        self.subscribe_attempted = false;
        self.resolving = true;
        self.phase = BoardPhase::Loading;
        self.store = None;
        self.orders.clear();
        self.pending.clear();
        self.publish();

        let generation = self.generation;
        info!(generation, "Loading board");
        let session = ctx.session.clone();
        let directory = ctx.directory.clone();
        let mailbox = mailbox.clone();
        tokio::spawn(async move {
            let user_id = match session.current_user_id().await {
                Ok(user_id) => user_id,
                Err(e) => {
                    warn!(error = %e, "Session unavailable, using last published user");
                    session.published_user_id()
                }
            };
            let outcome = resolve_store(directory.as_ref(), user_id.as_ref()).await;
            mailbox
                .send(BoardRequest::StoreResolved {
                    generation,
                    user_id,
                    outcome,
                    respond_to,
                })
                .await;
        });
    }

    fn on_store_resolved(
        &mut self,
        generation: u64,
        user_id: Option<UserId>,
        outcome: Result<ResolvedStore, StoreResolutionError>,
        respond_to: Option<Response<Result<StoreId, BoardError>>>,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
    ) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding stale store resolution");
            if let Some(respond_to) = respond_to {
                let _ = respond_to.send(Err(BoardError::Superseded));
            }
            return;
        }
        self.resolving = false;

        // The operator changed while the store was being resolved.
        let latest = ctx.session.published_user_id();
        if latest != user_id {
            debug!(resolved_for = ?user_id, ?latest, "Session changed during load");
            self.begin_load(ctx, mailbox, respond_to);
            return;
        }
        self.operator = user_id;

        match outcome {
            Ok(resolved) => {
                self.store = Some(resolved);
                let waiter = respond_to.map_or(FetchWaiter::Nobody, FetchWaiter::Load);
                self.spawn_fetch(ctx, mailbox, waiter);
            }
            Err(e) => {
                warn!(error = %e, "Board has no store");
                self.phase = BoardPhase::StoreNotFound(e.clone());
                self.publish();
                if let Some(respond_to) = respond_to {
                    let _ = respond_to.send(Err(e.into()));
                }
            }
        }
    }

    fn on_session_changed(
        &mut self,
        user_id: Option<UserId>,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
    ) {
        // A resolution in flight re-checks the session when it lands.
        if self.resolving || user_id == self.operator {
            return;
        }
        info!(from = ?self.operator, to = ?user_id, "Operator changed, reloading");
        self.begin_load(ctx, mailbox, None);
    }

    /// Forwards session changes until the board or the session actor stops.
    fn follow_session(&self, ctx: &BoardContext, mailbox: &WeakMailbox<BoardRequest>) {
        let mut user_changes = ctx.session.user_changes();
        let mailbox = mailbox.clone();
        tokio::spawn(async move {
            while user_changes.changed().await.is_ok() {
                let user_id = user_changes.borrow_and_update().clone();
                if !mailbox.send(BoardRequest::SessionChanged { user_id }).await {
                    break;
                }
            }
        });
    }

    fn spawn_fetch(
        &self,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
        waiter: FetchWaiter,
    ) {
        let Some(store) = &self.store else {
            waiter.fail(BoardError::Loading);
            return;
        };
        let generation = self.generation;
        let store_id = store.store_id.clone();
        let orders = ctx.orders.clone();
        let mailbox = mailbox.clone();
        tokio::spawn(async move {
            let result = orders.get_store_orders(&store_id).await;
            mailbox
                .send(BoardRequest::OrdersFetched {
                    generation,
                    result,
                    waiter,
                })
                .await;
        });
    }

    fn on_orders_fetched(
        &mut self,
        generation: u64,
        result: Result<Vec<Order>, FetchError>,
        waiter: FetchWaiter,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
    ) {
        let resolved = match &self.store {
            Some(resolved) if generation == self.generation => resolved.clone(),
            _ => {
                debug!(generation, current = self.generation, "Discarding stale fetch");
                waiter.fail(BoardError::Superseded);
                return;
            }
        };

        let ready = BoardPhase::Ready {
            store_id: resolved.store_id.clone(),
            path: resolved.path,
        };
        match result {
            Ok(orders) => {
                let count = orders.len();
                info!(store_id = %resolved.store_id, count, "Orders loaded");
                self.orders = orders;
                self.phase = ready;
                self.publish();
                waiter.succeed(&resolved.store_id, count);
            }
            Err(e) => {
                // Keep the last known list.
                warn!(store_id = %resolved.store_id, error = %e, "Order fetch failed");
                self.notify(BoardNotice::LoadFailed);
                if self.phase == BoardPhase::Loading {
                    self.phase = ready;
                    self.publish();
                }
                waiter.fail(e.into());
            }
        }

        if !self.subscribe_attempted {
            self.open_subscription(ctx, mailbox);
        }
    }

    fn open_subscription(&mut self, ctx: &BoardContext, mailbox: &WeakMailbox<BoardRequest>) {
        let Some(store_id) = self.store.as_ref().map(|store| store.store_id.clone()) else {
            return;
        };
        self.subscribe_attempted = true;

        let generation = self.generation;
        let mailbox = mailbox.clone();
        let on_event: EventSink = Arc::new(move |event: ChangeEvent| {
            mailbox.post(BoardRequest::Realtime { generation, event });
        });

        match ctx.feed.subscribe(&store_id, on_event) {
            Ok(subscription) => {
                info!(topic = subscription.topic(), "Realtime subscription open");
                self.subscription = Some(subscription);
            }
            Err(e) => warn!(%store_id, error = %e, "Realtime subscription failed"),
        }
    }

    fn on_realtime(
        &mut self,
        generation: u64,
        event: ChangeEvent,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
    ) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Discarding event from old subscription");
            return;
        }
        let order_id = event.order_id();
        match event.event_type {
            EventType::Insert => {
                info!(?order_id, "New order");
                self.notify(BoardNotice::NewOrder { order_id });
            }
            EventType::Update => debug!(?order_id, "Order changed"),
            EventType::Delete => debug!(?order_id, "Order removed"),
        }
        self.spawn_fetch(ctx, mailbox, FetchWaiter::Nobody);
    }

    // -------------------------------------------------------------------------
    // Status changes
    // -------------------------------------------------------------------------

    /// Applies the change locally and returns `(previous, attempted)`.
    fn apply_optimistic(
        &mut self,
        order_id: OrderId,
        target: Option<OrderStatus>,
    ) -> Result<(OrderStatus, OrderStatus), BoardError> {
        self.ensure_ready()?;
        if self.pending.contains(&order_id) {
            return Err(BoardError::UpdateInFlight(order_id));
        }
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(BoardError::OrderNotFound(order_id))?;

        let previous = order.status.clone();
        let attempted = match target {
            Some(status) => status,
            None => previous.next().ok_or_else(|| BoardError::NoAction {
                order_id,
                status: previous.clone(),
            })?,
        };
        if !previous.can_transition_to(&attempted) {
            return Err(BoardError::IllegalTransition {
                order_id,
                from: previous,
                to: attempted,
            });
        }

        order.status = attempted.clone();
        self.pending.insert(order_id);
        Ok((previous, attempted))
    }

    fn begin_status_change(
        &mut self,
        order_id: OrderId,
        target: Option<OrderStatus>,
        respond_to: Response<Result<OrderStatus, BoardError>>,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
    ) {
        let (previous, attempted) = match self.apply_optimistic(order_id, target) {
            Ok(change) => change,
            Err(e) => {
                debug!(%order_id, error = %e, "Status change refused");
                let _ = respond_to.send(Err(e));
                return;
            }
        };
        debug!(%order_id, from = %previous, to = %attempted, "Optimistic status change");
        self.publish();

        let generation = self.generation;
        let orders = ctx.orders.clone();
        let mailbox = mailbox.clone();
        tokio::spawn(async move {
            let result = orders.update_order_status(order_id, &attempted).await;
            mailbox
                .send(BoardRequest::StatusWritten {
                    generation,
                    order_id,
                    previous,
                    attempted,
                    result,
                    respond_to,
                })
                .await;
        });
    }

    fn on_status_written(
        &mut self,
        generation: u64,
        order_id: OrderId,
        previous: OrderStatus,
        attempted: OrderStatus,
        result: Result<(), UpdateError>,
        respond_to: Response<Result<OrderStatus, BoardError>>,
    ) {
        if generation != self.generation {
            // The list was replaced by a reload, nothing to roll back.
            let _ = respond_to.send(result.map(|()| attempted).map_err(BoardError::from));
            return;
        }
        self.pending.remove(&order_id);

        match result {
            Ok(()) => {
                info!(%order_id, status = %attempted, "Status updated");
                self.notify(BoardNotice::StatusUpdated {
                    order_id,
                    status: attempted.clone(),
                });
                self.publish();
                let _ = respond_to.send(Ok(attempted));
            }
            Err(e) => {
                warn!(%order_id, error = %e, restored = %previous, "Status update failed, rolling back");
                if let Some(order) = self.orders.iter_mut().find(|order| order.id == order_id) {
                    order.status = previous.clone();
                }
                self.notify(BoardNotice::StatusUpdateFailed {
                    order_id,
                    restored: previous,
                });
                self.publish();
                let _ = respond_to.send(Err(e.into()));
            }
        }
    }
}

#[async_trait]
impl ActorState for OrderBoard {
    type Message = BoardRequest;
    type Context = BoardContext;

    async fn on_start(&mut self, ctx: &BoardContext, mailbox: &WeakMailbox<BoardRequest>) {
        self.begin_load(ctx, mailbox, None);
        self.follow_session(ctx, mailbox);
    }

    async fn handle(
        &mut self,
        message: BoardRequest,
        ctx: &BoardContext,
        mailbox: &WeakMailbox<BoardRequest>,
    ) {
        match message {
            BoardRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            BoardRequest::ChangeStatus {
                order_id,
                status,
                respond_to,
            } => self.begin_status_change(order_id, Some(status), respond_to, ctx, mailbox),
            BoardRequest::Advance {
                order_id,
                respond_to,
            } => self.begin_status_change(order_id, None, respond_to, ctx, mailbox),
            BoardRequest::Refresh { respond_to } => match self.ensure_ready() {
                Ok(()) => {
                    let waiter = respond_to.map_or(FetchWaiter::Nobody, FetchWaiter::Refresh);
                    self.spawn_fetch(ctx, mailbox, waiter);
                }
                Err(e) => {
                    if let Some(respond_to) = respond_to {
                        let _ = respond_to.send(Err(e));
                    }
                }
            },
            BoardRequest::Reload { respond_to } => self.begin_load(ctx, mailbox, respond_to),
            BoardRequest::SessionChanged { user_id } => {
                self.on_session_changed(user_id, ctx, mailbox)
            }
            BoardRequest::StoreResolved {
                generation,
                user_id,
                outcome,
                respond_to,
            } => self.on_store_resolved(generation, user_id, outcome, respond_to, ctx, mailbox),
            BoardRequest::Realtime { generation, event } => {
                self.on_realtime(generation, event, ctx, mailbox)
            }
            BoardRequest::OrdersFetched {
                generation,
                result,
                waiter,
            } => self.on_orders_fetched(generation, result, waiter, ctx, mailbox),
            BoardRequest::StatusWritten {
                generation,
                order_id,
                previous,
                attempted,
                result,
                respond_to,
            } => self.on_status_written(generation, order_id, previous, attempted, result, respond_to),
        }
    }

    async fn on_stop(&mut self, _ctx: &BoardContext) {
        self.teardown_subscription();
        info!(orders = self.orders.len(), "Board stopped");
    }
}
