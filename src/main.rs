//! # Order Board demo
//!
//! Starts the dashboard, prints the board, accepts the oldest pending order and
//! waits for a new one to arrive.
//!
//! Without `DASHBOARD_BACKEND_URL` the board runs on an in-memory store seeded
//! with a few orders, and the demo plays the customer by placing an order.

use chrono::{Duration as ChronoDuration, Utc};
use order_board::access::memory::InMemoryBackend;
use order_board::board_actor::{BoardNotice, BoardPhase, BoardSnapshot};
use order_board::config::DashboardConfig;
use order_board::lifecycle::{setup_tracing, DashboardSystem};
use order_board::model::{
    AuthSession, Customer, DeliveryAddress, Order, OrderItem, OrderStatus, SessionUser, StoreId,
    StoreRecord,
};
use order_board::view::{OrderCard, OrderDetail};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn, Instrument};

const DEMO_OPERATOR: &str = "demo-operator";
const DEMO_STORE: &str = "demo-store";

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = DashboardConfig::from_env().map_err(|e| e.to_string())?;
    setup_tracing(config.log_json);

    info!("Starting order board");

    let demo = demo_backend();
    let system = DashboardSystem::from_config(&config, demo.clone());
    let board = system.board_client.clone();

    let signed_in = system
        .session_client
        .current_user_id()
        .await
        .map_err(|e| e.to_string())?
        .is_some();
    if !signed_in {
        if config.backend.is_some() {
            warn!(path = %config.session_path.display(), "No saved session, the board cannot resolve a store");
        } else {
            let operator = SessionUser::new(DEMO_OPERATOR, "Operador Demo");
            system
                .session_client
                .sign_in(AuthSession::signed_in(operator))
                .await
                .map_err(|e| e.to_string())?;
            board.reload().await.map_err(|e| e.to_string())?;
        }
    }

    let snapshot = board.ready().await.map_err(|e| e.to_string())?;
    print_board(&snapshot);

    let mut notices = board.notices();

    let oldest_pending = snapshot
        .orders
        .iter()
        .rev()
        .find(|order| order.status == OrderStatus::Pending)
        .map(|order| order.id);
    if let Some(order_id) = oldest_pending {
        let span = tracing::info_span!("accept_order", %order_id);
        let result = async {
            info!("Accepting order");
            board.advance(order_id).await
        }
        .instrument(span)
        .await;
        match result {
            Ok(status) => info!(%order_id, %status, "Order accepted"),
            Err(e) => warn!(%order_id, error = %e, "Order could not be accepted"),
        }
    }

    if config.backend.is_none() {
        demo.insert_order(
            Order::new(105, StoreId::new(DEMO_STORE), Decimal::new(3890, 2))
                .with_customer(Customer::new("Rafael Lima").with_phone("(11) 97777-0000"))
                .with_item(OrderItem::new(9, "Pizza Margherita", 1, Decimal::new(3890, 2)))
                .with_payment_method("cartao")
                .created_at(Utc::now()),
        );
    }

    let deadline = tokio::time::sleep(Duration::from_secs(3));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    info!(message = notice.message(), error = notice.is_error(), "Notice");
                    if matches!(notice, BoardNotice::NewOrder { .. }) {
                        break;
                    }
                }
                Err(_) => break,
            },
        }
    }

    // Give the refetch triggered by the new order a moment to land.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let snapshot = board.snapshot().await.map_err(|e| e.to_string())?;
    print_board(&snapshot);
    if let Some(newest) = snapshot.orders.first() {
        print_detail(&OrderDetail::new(newest, Utc::now()));
    }

    drop(board);
    system.shutdown().await?;

    info!("Order board stopped");
    Ok(())
}

fn demo_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    let store = StoreId::new(DEMO_STORE);
    let now = Utc::now();
    backend.add_store(StoreRecord::new(DEMO_STORE, "Cantina Demo").owned_by(DEMO_OPERATOR));

    backend.insert_order(
        Order::new(101, store.clone(), Decimal::new(5400, 2))
            .with_customer(Customer::new("Maria Souza").with_phone("(11) 98888-1234"))
            .with_address(DeliveryAddress::new("Rua das Flores, 123 - Jardim Paulista"))
            .with_item(OrderItem::new(1, "Lasanha", 2, Decimal::new(2200, 2)))
            .with_payment_method("pix")
            .created_at(now - ChronoDuration::minutes(25)),
    );
    backend.insert_order(
        Order::new(102, store.clone(), Decimal::new(2750, 2))
            .with_customer(Customer::new("João Pereira"))
            .with_item(OrderItem::new(2, "Hambúrguer", 1, Decimal::new(2750, 2)))
            .created_at(now - ChronoDuration::minutes(12)),
    );
    backend.insert_order(
        Order::new(103, store.clone(), Decimal::new(1800, 2))
            .with_status(OrderStatus::Preparing)
            .with_item(OrderItem::new(3, "Açaí 500ml", 1, Decimal::new(1800, 2)))
            .created_at(now - ChronoDuration::minutes(40)),
    );
    backend.insert_order(
        Order::new(104, store, Decimal::new(6120, 2))
            .with_status(OrderStatus::Delivered)
            .with_customer(Customer::new("Ana Costa"))
            .created_at(now - ChronoDuration::hours(3)),
    );
    backend
}

fn print_board(snapshot: &BoardSnapshot) {
    match &snapshot.phase {
        BoardPhase::Loading => println!("Carregando..."),
        BoardPhase::StoreNotFound(e) => println!("Loja não encontrada: {e}"),
        BoardPhase::Ready { store_id, .. } => {
            println!("\n== Pedidos da loja {store_id} ==");
            let now = Utc::now();
            for column in snapshot.columns().columns() {
                println!("\n{} ({})", column.label, column.orders.len());
                for order in &column.orders {
                    let card = OrderCard::new(order, now);
                    let pending = if snapshot.is_pending(card.order_id) { " …" } else { "" };
                    println!(
                        "  {} {} | {} | {} | {}{}",
                        card.short_id,
                        card.customer_name,
                        card.address_line,
                        card.elapsed,
                        card.total,
                        pending
                    );
                }
            }
        }
    }
}

fn print_detail(detail: &OrderDetail) {
    println!("\n== {} ({}) ==", detail.title, detail.status_label);
    println!("Cliente: {} {}", detail.customer_name, detail.customer_phone.as_deref().unwrap_or(""));
    println!("Endereço: {}", detail.full_address);
    for item in &detail.items {
        println!("  {}x {} {}", item.quantity, item.name, item.line_total);
    }
    println!("Pagamento: {}", detail.payment_method);
    println!("Total: {}", detail.total);
    if let Some(action) = &detail.next_action {
        println!("Próxima ação: {} → {}", action.label, action.next_status);
    }
}
