//! Session provider actor: who is signed in.

pub mod error;
pub mod persistence;
pub mod state;

pub use error::*;
pub use persistence::*;
pub use state::*;

use crate::clients::SessionClient;
use crate::framework::StateActor;
use tokio::sync::watch;

/// Creates a new Session actor and its client.
pub fn new(capacity: usize) -> (StateActor<SessionState>, SessionClient) {
    let (users, user_changes) = watch::channel(None);
    let (actor, mailbox) = StateActor::new(SessionState::new(users), capacity);
    (actor, SessionClient::new(mailbox, user_changes))
}
