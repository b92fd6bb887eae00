//! # Core Actor Framework
//!
//! This module defines the generic building blocks for the actor system.
//!
//! ## Key Types
//!
//! - [`ActorState`]: The trait that every actor-owned state must implement.
//! - [`StateActor`]: The generic actor that owns a state and runs its message loop.
//! - [`Mailbox`]: The generic client half used to talk to an actor.
//! - [`WeakMailbox`]: A non-owning mailbox handed to spawned work and feed callbacks,
//!   so that in-flight work never keeps an actor alive.
//! - [`FrameworkError`]: Common errors (ActorClosed, ActorDropped).

use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any state must implement to be owned by a [`StateActor`].
///
/// # Architecture Note
/// The actor owns the state exclusively. Every input (client requests, feed
/// events, completions of spawned network calls) arrives as a `Message` and is
/// handled to completion before the next one is taken. This is the only place
/// the state is ever mutated, so no `Mutex` is needed around it.
///
/// Long-running work must not be awaited inside [`ActorState::handle`]: spawn it,
/// and post its outcome back through the [`WeakMailbox`] as another message.
///
/// # Async & Context
/// The `Context` associated type carries dependencies injected at `run()` time
/// ("late binding"), exactly like the entity hooks of a resource actor.
#[async_trait]
pub trait ActorState: Send + 'static {
    /// The message type this actor processes.
    type Message: Send + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync + 'static;

    /// Called once before the first message is taken.
    async fn on_start(&mut self, _ctx: &Self::Context, _mailbox: &WeakMailbox<Self::Message>) {}

    /// Handle a single message.
    async fn handle(
        &mut self,
        message: Self::Message,
        ctx: &Self::Context,
        mailbox: &WeakMailbox<Self::Message>,
    );

    /// Called once after the last client is gone and the queue is drained.
    async fn on_stop(&mut self, _ctx: &Self::Context) {}
}

// =============================================================================
// 2. ERRORS & RESPONSES
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}

/// Type alias for the one-shot response channel carried by request messages.
pub type Response<T> = oneshot::Sender<T>;

// =============================================================================
// 3. THE GENERIC ACTOR
// =============================================================================

/// The generic actor that owns one [`ActorState`].
///
/// **Concurrency Model**:
/// Each actor processes its own messages *sequentially* in a loop, so the state
/// needs no locking. Several actors run in parallel, each in its own Tokio task.
///
/// The actor keeps only a [`WeakMailbox`] to itself. The loop ends when every
/// strong [`Mailbox`] (the clients) has been dropped.
pub struct StateActor<S: ActorState> {
    receiver: mpsc::Receiver<S::Message>,
    weak: WeakMailbox<S::Message>,
    state: S,
}

impl<S: ActorState> StateActor<S> {
    /// Creates a new actor around `state` and returns it together with its mailbox.
    ///
    /// `buffer_size` is the capacity of the MPSC channel. If the channel is full,
    /// senders wait until there is space.
    pub fn new(state: S, buffer_size: usize) -> (Self, Mailbox<S::Message>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let mailbox = Mailbox::new(sender);
        let actor = Self {
            receiver,
            weak: mailbox.downgrade(),
            state,
        };
        (actor, mailbox)
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    pub async fn run(mut self, context: S::Context) {
        // Extract just the type name (e.g., "OrderBoard" instead of "order_board::board_actor::OrderBoard")
        let actor_type = std::any::type_name::<S>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(actor_type, "Actor started");

        self.state.on_start(&context, &self.weak).await;

        let mut handled: u64 = 0;
        while let Some(message) = self.receiver.recv().await {
            trace!(actor_type, ?message, "Message");
            self.state.handle(message, &context, &self.weak).await;
            handled += 1;
        }

        self.state.on_stop(&context).await;
        info!(actor_type, handled, "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A cloneable sender half for a [`StateActor`].
pub struct Mailbox<M> {
    sender: mpsc::Sender<M>,
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<M: Send + 'static> Mailbox<M> {
    pub fn new(sender: mpsc::Sender<M>) -> Self {
        Self { sender }
    }

    /// Sends a fire-and-forget message.
    pub async fn send(&self, message: M) -> Result<(), FrameworkError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }

    /// Sends a request built around a fresh response channel and waits for the answer.
    pub async fn request<T>(
        &self,
        make: impl FnOnce(Response<T>) -> M,
    ) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// Returns a handle that does not keep the actor alive.
    pub fn downgrade(&self) -> WeakMailbox<M> {
        WeakMailbox {
            sender: self.sender.downgrade(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A non-owning mailbox.
///
/// Spawned network calls and change-feed callbacks post their results through
/// this handle. Once the actor has stopped, posts are silently dropped.
pub struct WeakMailbox<M> {
    sender: mpsc::WeakSender<M>,
}

impl<M> Clone for WeakMailbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<M: Send + 'static> WeakMailbox<M> {
    pub fn upgrade(&self) -> Option<Mailbox<M>> {
        self.sender.upgrade().map(Mailbox::new)
    }

    /// Posts a message and waits for queue capacity. Returns `false` if the actor is gone.
    pub async fn send(&self, message: M) -> bool {
        match self.sender.upgrade() {
            Some(sender) => sender.send(message).await.is_ok(),
            None => false,
        }
    }

    /// Posts a message without awaiting, for use from synchronous callbacks.
    ///
    /// When the queue is full the send is finished on a spawned task, so the
    /// message is never dropped while the actor is alive and a runtime is present.
    pub fn post(&self, message: M) -> bool {
        let Some(sender) = self.sender.upgrade() else {
            debug!("Post skipped, actor stopped");
            return false;
        };
        match sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let _ = sender.send(message).await;
                        });
                        true
                    }
                    Err(_) => {
                        debug!("Post dropped, mailbox full outside a runtime");
                        false
                    }
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u64,
        started: bool,
    }

    #[derive(Debug)]
    enum CounterMessage {
        Add(u64),
        AddLater(u64),
        Get { respond_to: Response<(u64, bool)> },
    }

    #[async_trait]
    impl ActorState for Counter {
        type Message = CounterMessage;
        type Context = u64;

        async fn on_start(&mut self, _ctx: &u64, _mailbox: &WeakMailbox<CounterMessage>) {
            self.started = true;
        }

        async fn handle(
            &mut self,
            message: CounterMessage,
            ctx: &u64,
            mailbox: &WeakMailbox<CounterMessage>,
        ) {
            match message {
                CounterMessage::Add(n) => self.value += n * ctx,
                CounterMessage::AddLater(n) => {
                    let mailbox = mailbox.clone();
                    tokio::spawn(async move {
                        mailbox.send(CounterMessage::Add(n)).await;
                    });
                }
                CounterMessage::Get { respond_to } => {
                    let _ = respond_to.send((self.value, self.started));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_state_actor_processes_messages_in_order() {
        let (actor, mailbox) = StateActor::new(Counter::default(), 8);
        let handle = tokio::spawn(actor.run(2));

        mailbox.send(CounterMessage::Add(1)).await.unwrap();
        mailbox.send(CounterMessage::Add(4)).await.unwrap();
        let (value, started) = mailbox
            .request(|respond_to| CounterMessage::Get { respond_to })
            .await
            .unwrap();
        assert_eq!(value, 10);
        assert!(started);

        drop(mailbox);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_spawned_work_posts_back_through_weak_mailbox() {
        let (actor, mailbox) = StateActor::new(Counter::default(), 8);
        let handle = tokio::spawn(actor.run(1));

        mailbox.send(CounterMessage::AddLater(3)).await.unwrap();
        let mut value = 0;
        for _ in 0..50 {
            value = mailbox
                .request(|respond_to| CounterMessage::Get { respond_to })
                .await
                .unwrap()
                .0;
            if value == 3 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(value, 3);

        drop(mailbox);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_weak_mailbox_does_not_keep_actor_alive() {
        let (actor, mailbox) = StateActor::new(Counter::default(), 8);
        let weak = mailbox.downgrade();
        let handle = tokio::spawn(actor.run(1));

        drop(mailbox);
        handle.await.unwrap();

        assert!(weak.upgrade().is_none());
        assert!(!weak.post(CounterMessage::Add(1)));
    }

    #[tokio::test]
    async fn test_request_on_closed_actor_reports_actor_closed() {
        let (actor, mailbox) = StateActor::new(Counter::default(), 8);
        drop(actor);

        let result = mailbox
            .request(|respond_to| CounterMessage::Get { respond_to })
            .await;
        assert_eq!(result, Err(FrameworkError::ActorClosed));
    }
}
