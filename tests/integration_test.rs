use order_board::access::memory::InMemoryBackend;
use order_board::access::OrderStore;
use order_board::board_actor::{
    BoardError, BoardNotice, BoardPhase, BoardSnapshot, ResolutionPath, StoreResolutionError,
};
use order_board::clients::BoardClient;
use order_board::config::DashboardConfig;
use order_board::lifecycle::{Backends, DashboardSystem};
use order_board::model::{
    AuthSession, Customer, Order, OrderId, OrderStatus, SessionUser, StoreId, StoreRecord,
};
use order_board::session_actor::{FileSessionStore, MemorySessionStore};
use order_board::view::OrderCard;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn operator() -> AuthSession {
    AuthSession::signed_in(SessionUser::new("u1", "Operadora"))
}

fn seeded_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.add_store(StoreRecord::new("other", "Outra Loja"));
    backend.add_store(StoreRecord::new("s1", "Cantina").owned_by("u1"));
    backend.insert_order(Order::new(1, StoreId::new("s1"), dec!(42)));
    backend.insert_order(
        Order::new(2, StoreId::new("s1"), dec!(18.5)).with_status(OrderStatus::Preparing),
    );
    backend.insert_order(Order::new(3, StoreId::new("other"), dec!(99)));
    backend
}

async fn wait_for(
    board: &BoardClient,
    what: impl FnMut(&BoardSnapshot) -> bool,
) -> BoardSnapshot {
    let mut snapshots = board.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), snapshots.wait_for(what))
        .await
        .expect("timed out waiting for the board")
        .expect("board stopped")
        .clone();
    snapshot
}

/// Full end-to-end run on the in-memory backend with real actors.
#[tokio::test]
async fn test_full_dashboard_integration() {
    let backend = seeded_backend();
    let system = DashboardSystem::start(
        Backends::in_memory(backend.clone()),
        Arc::new(MemorySessionStore::with_session(operator())),
        16,
    );
    let board = system.board_client.clone();
    let mut notices = board.notices();

    // Only the operator's store is shown.
    let snapshot = board.ready().await.expect("board stopped");
    assert_eq!(snapshot.store_id(), Some(&StoreId::new("s1")));
    assert_eq!(snapshot.columns().counts(), vec![1, 1, 0, 0, 0]);
    assert!(snapshot.order(OrderId(3)).is_none());

    // Accept the pending order; the backend now has it.
    assert_eq!(board.advance(OrderId(1)).await, Ok(OrderStatus::Preparing));
    assert_eq!(
        backend.order(OrderId(1)).map(|order| order.status),
        Some(OrderStatus::Preparing)
    );
    assert_eq!(
        notices.recv().await.unwrap(),
        BoardNotice::StatusUpdated {
            order_id: OrderId(1),
            status: OrderStatus::Preparing,
        }
    );

    assert_eq!(board.cancel(OrderId(2)).await, Ok(OrderStatus::Cancelled));

    // A customer places an order.
    backend.insert_order(
        Order::new(4, StoreId::new("s1"), dec!(27.5)).with_customer(Customer::new("Rafael")),
    );
    let snapshot = wait_for(&board, |s| s.order(OrderId(4)).is_some()).await;
    let card = OrderCard::new(snapshot.order(OrderId(4)).unwrap(), chrono::Utc::now());
    assert_eq!(card.customer_name, "Rafael");
    assert_eq!(card.total, "R$ 27,50");

    // Another dashboard moves it; the board follows the backend.
    backend
        .update_order_status(OrderId(4), &OrderStatus::Preparing)
        .await
        .unwrap();
    wait_for(&board, |s| {
        s.status_of(OrderId(4)) == Some(&OrderStatus::Preparing)
    })
    .await;

    backend.remove_order(OrderId(4));
    let snapshot = wait_for(&board, |s| s.order(OrderId(4)).is_none()).await;
    assert_eq!(snapshot.columns().counts(), vec![0, 1, 0, 0, 1]);

    // Orders of other stores never reach the board.
    backend.insert_order(Order::new(5, StoreId::new("other"), dec!(10)));
    let snapshot = board.snapshot().await.unwrap();
    assert!(snapshot.order(OrderId(5)).is_none());

    drop(notices);
    drop(board);
    system.shutdown().await.expect("Shutdown failed");
    assert_eq!(backend.subscriber_count(), 0);
}

#[tokio::test]
async fn test_unrecognized_status_is_kept_but_not_actionable() {
    let backend = InMemoryBackend::new();
    backend.add_store(StoreRecord::new("s1", "Cantina").owned_by("u1"));
    backend.insert_order(
        Order::new(1, StoreId::new("s1"), dec!(10))
            .with_status(OrderStatus::parse("refunded")),
    );
    let system = DashboardSystem::start(
        Backends::in_memory(backend.clone()),
        Arc::new(MemorySessionStore::with_session(operator())),
        16,
    );

    let snapshot = system.board_client.ready().await.unwrap();
    assert_eq!(snapshot.orders.len(), 1);
    let columns = snapshot.columns();
    assert_eq!(columns.counts(), vec![0, 0, 0, 0, 0]);
    assert_eq!(columns.unplaced().len(), 1);

    assert!(matches!(
        system.board_client.advance(OrderId(1)).await,
        Err(BoardError::NoAction { .. })
    ));
    assert!(matches!(
        system.board_client.cancel(OrderId(1)).await,
        Err(BoardError::IllegalTransition { .. })
    ));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_store_inferred_from_orders_when_operator_owns_none() {
    let backend = InMemoryBackend::new();
    backend.insert_order(Order::new(7, StoreId::new("s7"), dec!(10)));
    let system = DashboardSystem::start(
        Backends::in_memory(backend.clone()),
        Arc::new(MemorySessionStore::with_session(operator())),
        16,
    );

    let snapshot = system.board_client.ready().await.unwrap();
    assert_eq!(
        snapshot.phase,
        BoardPhase::Ready {
            store_id: StoreId::new("s7"),
            path: ResolutionPath::InferredFromOrder,
        }
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sign_out_tears_down_store_context() {
    let backend = seeded_backend();
    let system = DashboardSystem::start(
        Backends::in_memory(backend.clone()),
        Arc::new(MemorySessionStore::with_session(operator())),
        16,
    );
    let board = system.board_client.clone();

    let snapshot = board.ready().await.expect("board stopped");
    assert_eq!(snapshot.store_id(), Some(&StoreId::new("s1")));
    assert_eq!(backend.subscriber_count(), 1);

    system.session_client.sign_out().await.unwrap();
    let snapshot = wait_for(&board, |s| {
        s.phase == BoardPhase::StoreNotFound(StoreResolutionError::NoSession)
    })
    .await;
    assert!(snapshot.orders.is_empty());
    assert_eq!(backend.subscriber_count(), 0);
    assert_eq!(
        board.advance(OrderId(1)).await,
        Err(BoardError::StoreResolution(StoreResolutionError::NoSession))
    );
    assert_eq!(backend.order(OrderId(1)).unwrap().status, OrderStatus::Pending);

    drop(board);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_signing_in_as_another_operator_switches_store() {
    let backend = seeded_backend();
    backend.add_store(StoreRecord::new("s2", "Segunda Loja").owned_by("u2"));
    backend.insert_order(Order::new(4, StoreId::new("s2"), dec!(12)));
    let system = DashboardSystem::start(
        Backends::in_memory(backend.clone()),
        Arc::new(MemorySessionStore::with_session(operator())),
        16,
    );
    let board = system.board_client.clone();
    assert_eq!(board.ready().await.unwrap().store_id(), Some(&StoreId::new("s1")));

    system
        .session_client
        .sign_in(AuthSession::signed_in(SessionUser::new("u2", "Outro")))
        .await
        .unwrap();
    let snapshot = wait_for(&board, |s| s.store_id() == Some(&StoreId::new("s2"))).await;
    let ids: Vec<OrderId> = snapshot.orders.iter().map(|order| order.id).collect();
    assert_eq!(ids, vec![OrderId(4)]);
    assert_eq!(backend.subscriber_count(), 1);

    drop(board);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_session_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join(".session").join("session.json");
    let backend = seeded_backend();

    let system = DashboardSystem::start(
        Backends::in_memory(backend.clone()),
        Arc::new(FileSessionStore::new(&session_path)),
        16,
    );
    assert!(system.board_client.ready().await.unwrap().store_id().is_none());
    system.session_client.sign_in(operator()).await.unwrap();
    assert_eq!(
        system.board_client.reload().await,
        Ok(StoreId::new("s1"))
    );
    system.shutdown().await.unwrap();
    assert!(session_path.exists());

    // A second run starts signed in.
    let vars = HashMap::from([(
        "DASHBOARD_SESSION_PATH".to_string(),
        session_path.display().to_string(),
    )]);
    let config = DashboardConfig::from_vars(vars).unwrap();
    let system = DashboardSystem::from_config(&config, backend);
    let snapshot = system.board_client.ready().await.unwrap();
    assert_eq!(snapshot.store_id(), Some(&StoreId::new("s1")));

    system.session_client.sign_out().await.unwrap();
    system.shutdown().await.unwrap();
}
