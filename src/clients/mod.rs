//! Type-safe wrappers around [`Mailbox`](crate::framework::Mailbox).

pub mod actor_client;
pub mod board_client;
pub mod session_client;

pub use actor_client::*;
pub use board_client::*;
pub use session_client::*;
