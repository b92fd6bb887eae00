//! # System Lifecycle
//!
//! Starts the dashboard's actors, wires them together and shuts them down.
//!
//! The session actor has no dependencies. The board actor gets the access
//! layer and a [`SessionClient`](crate::clients::SessionClient) injected at
//! `run()` time, so both actors are created first and only then started:
//!
//! ```rust,ignore
//! let (session_actor, session_client) = session_actor::new(capacity);
//! let (board_actor, board_client) = board_actor::new(capacity);
//!
//! tokio::spawn(session_actor.run(persistence));
//! tokio::spawn(board_actor.run(BoardContext { session: session_client.clone(), .. }));
//! ```
//!
//! Shutdown drops the clients and waits for both tasks. The board stops first;
//! the session actor follows once the board's context (holding the last other
//! session client) is gone.

pub mod dashboard;
pub mod tracing;

pub use dashboard::*;
pub use tracing::*;
