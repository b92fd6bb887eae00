//! # Order Board
//!
//! > **The live order board of a restaurant dashboard.**
//!
//! Operators see their store's orders in one column per status and move them
//! through `pending → preparing → out for delivery → delivered` (or cancel them).
//! Changes made elsewhere arrive through a change feed and are reconciled by
//! refetching the whole list.
//!
//! ## Design
//!
//! ### One owner per piece of state
//! The order list belongs to the board actor and the signed-in session to the
//! session actor. Both are [`StateActor`](framework::StateActor)s: they handle
//! one message at a time, so neither needs a lock. Network calls are spawned
//! and report back as messages, so the board keeps answering while a write is
//! in flight.
//!
//! ### Optimistic writes
//! A status change is applied to the board and published immediately. If the
//! backend rejects it, the order goes back to the exact status it had before.
//! Only one write per order can be in flight.
//!
//! ### Snapshots, not queries
//! Readers watch a [`tokio::sync::watch`] channel of
//! [`BoardSnapshot`](board_actor::BoardSnapshot)s and a broadcast channel of
//! toast [`BoardNotice`](board_actor::BoardNotice)s. The [`view`] module turns a
//! snapshot into columns, cards and order detail.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic actor loop, mailboxes and the mock mailbox used in tests.
//!
//! ### 2. The Data ([`model`], [`access`])
//! Orders, statuses and the backend traits: [`OrderStore`](access::OrderStore),
//! [`StoreDirectory`](access::StoreDirectory) and
//! [`OrderFeed`](access::OrderFeed), with REST, polling, in-memory and mock
//! implementations.
//!
//! ### 3. The Actors ([`board_actor`], [`session_actor`])
//! Store resolution, reconciliation and rollback live in the board.
//!
//! ### 4. The Interface ([`clients`], [`view`])
//! Typed clients over the mailboxes, and the presentation contracts.
//!
//! ### 5. The Orchestrator ([`lifecycle`], [`config`])
//! Wiring, shutdown, logging and `DASHBOARD_*` settings.
//!
//! ## Running
//!
//! ```bash
//! # In-memory demo store
//! RUST_LOG=info cargo run
//!
//! # Against a hosted backend
//! DASHBOARD_BACKEND_URL=https://<project>.supabase.co \
//! DASHBOARD_BACKEND_ANON_KEY=<key> RUST_LOG=info cargo run
//! ```

pub mod access;
pub mod board_actor;
pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod scheduler;
pub mod session_actor;
pub mod view;
