use crate::framework::{FrameworkError, Mailbox, Response};
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for actor-specific clients to share the request/reply plumbing.
///
/// Implementors only say which mailbox they wrap and how framework errors map
/// onto their own error type; `ask` does the rest.
#[async_trait]
pub trait ActorClient: Send + Sync {
    /// The message type of the wrapped actor.
    type Message: Send + Debug + 'static;

    /// The actor-specific error type.
    type Error: Send + Sync;

    /// Access the inner mailbox.
    fn mailbox(&self) -> &Mailbox<Self::Message>;

    /// Map framework errors to the specific actor error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Sends a request and waits for the reply.
    async fn ask<T, F>(&self, make: F) -> Result<T, Self::Error>
    where
        T: Send + 'static,
        F: FnOnce(Response<T>) -> Self::Message + Send + 'static,
    {
        tracing::debug!("Sending request");
        self.mailbox().request(make).await.map_err(Self::map_error)
    }

    /// Whether the actor behind this client has stopped.
    fn is_closed(&self) -> bool {
        self.mailbox().is_closed()
    }
}
