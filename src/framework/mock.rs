//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`MockMailbox`] to script how each incoming message is answered, or
//! [`create_mock_mailbox`] to get a mailbox plus the raw receiver and assert on
//! messages yourself with [`expect_message`].

use crate::framework::Mailbox;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Handler<M> = Box<dyn FnOnce(M) + Send>;

/// A mailbox whose messages are answered by scripted handlers, in order.
///
/// # Example
/// ```ignore
/// let mut mock = MockMailbox::<SessionRequest>::new();
/// mock.expect(|message| match message {
///     SessionRequest::Get { respond_to } => { let _ = respond_to.send(None); }
///     other => panic!("unexpected {other:?}"),
/// });
///
/// let (_users, user_changes) = tokio::sync::watch::channel(None);
/// let client = SessionClient::new(mock.mailbox(), user_changes);
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockMailbox<M> {
    mailbox: Mailbox<M>,
    handlers: Arc<Mutex<VecDeque<Handler<M>>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<M: Send + std::fmt::Debug + 'static> MockMailbox<M> {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<M>(100);
        let handlers: Arc<Mutex<VecDeque<Handler<M>>>> = Arc::new(Mutex::new(VecDeque::new()));
        let handlers_clone = handlers.clone();

        // Spawn background task to handle messages
        let handle = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let next = handlers_clone
                    .lock()
                    .expect("mock handler lock poisoned")
                    .pop_front();
                match next {
                    Some(handler) => handler(message),
                    None => panic!("Unexpected message: {message:?}"),
                }
            }
        });

        Self {
            mailbox: Mailbox::new(sender),
            handlers,
            _handle: handle,
        }
    }

    /// Returns the mailbox for use in tests.
    pub fn mailbox(&self) -> Mailbox<M> {
        self.mailbox.clone()
    }

    /// Queues a handler for the next message.
    pub fn expect(&mut self, handler: impl FnOnce(M) + Send + 'static) {
        self.handlers
            .lock()
            .expect("mock handler lock poisoned")
            .push_back(Box::new(handler));
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self
            .handlers
            .lock()
            .expect("mock handler lock poisoned")
            .len();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

impl<M: Send + std::fmt::Debug + 'static> Default for MockMailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a mailbox and the receiver for asserting messages.
///
/// # Testing Strategy
/// In unit tests we don't want to spin up a full actor when only the *client*
/// logic is under test. Messages land on a channel we control, so a test can
/// inspect them and answer (or drop) the embedded response channels.
pub fn create_mock_mailbox<M: Send + 'static>(buffer_size: usize) -> (Mailbox<M>, mpsc::Receiver<M>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Mailbox::new(sender), receiver)
}

/// Waits for the next message on a mock receiver.
pub async fn expect_message<M>(receiver: &mut mpsc::Receiver<M>) -> Option<M> {
    receiver.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{FrameworkError, Response};

    #[derive(Debug)]
    enum Ping {
        Ask { respond_to: Response<u32> },
    }

    #[tokio::test]
    async fn test_mock_mailbox_answers_in_order() {
        let mut mock = MockMailbox::<Ping>::new();
        mock.expect(|Ping::Ask { respond_to }| {
            let _ = respond_to.send(1);
        });
        mock.expect(|Ping::Ask { respond_to }| {
            let _ = respond_to.send(2);
        });

        let mailbox = mock.mailbox();
        let first = mailbox.request(|respond_to| Ping::Ask { respond_to }).await;
        let second = mailbox.request(|respond_to| Ping::Ask { respond_to }).await;
        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(2));
        mock.verify();
    }

    #[tokio::test]
    async fn test_dropped_responder_reports_actor_dropped() {
        let (mailbox, mut receiver) = create_mock_mailbox::<Ping>(4);

        let task = tokio::spawn(async move { mailbox.request(|respond_to| Ping::Ask { respond_to }).await });

        let message = expect_message(&mut receiver).await.expect("Expected Ask");
        drop(message);

        assert_eq!(task.await.unwrap(), Err(FrameworkError::ActorDropped));
    }
}
