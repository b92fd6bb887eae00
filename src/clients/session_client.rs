use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, Mailbox};
use crate::model::{AuthSession, UserId};
use crate::session_actor::{SessionError, SessionRequest};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::instrument;

/// Client for interacting with the Session actor.
#[derive(Clone)]
pub struct SessionClient {
    mailbox: Mailbox<SessionRequest>,
    user_changes: watch::Receiver<Option<UserId>>,
}

impl SessionClient {
    pub fn new(
        mailbox: Mailbox<SessionRequest>,
        user_changes: watch::Receiver<Option<UserId>>,
    ) -> Self {
        Self {
            mailbox,
            user_changes,
        }
    }

    /// Follows the signed-in user id. A new value is seen only after the
    /// change has been persisted.
    pub fn user_changes(&self) -> watch::Receiver<Option<UserId>> {
        self.user_changes.clone()
    }

    /// Last published user id, without a round trip to the actor.
    pub fn published_user_id(&self) -> Option<UserId> {
        self.user_changes.borrow().clone()
    }
}

#[async_trait]
impl ActorClient for SessionClient {
    type Message = SessionRequest;
    type Error = SessionError;

    fn mailbox(&self) -> &Mailbox<SessionRequest> {
        &self.mailbox
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        SessionError::Actor(e)
    }
}

impl SessionClient {
    #[instrument(skip(self))]
    pub async fn current(&self) -> Result<Option<AuthSession>, SessionError> {
        self.ask(|respond_to| SessionRequest::Get { respond_to })
            .await
    }

    /// Id of the signed-in operator, if any.
    pub async fn current_user_id(&self) -> Result<Option<UserId>, SessionError> {
        Ok(self
            .current()
            .await?
            .and_then(|session| session.user_id().cloned()))
    }

    #[instrument(skip(self, session))]
    pub async fn sign_in(&self, session: AuthSession) -> Result<(), SessionError> {
        self.ask(move |respond_to| SessionRequest::Set {
            session,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.ask(|respond_to| SessionRequest::Clear { respond_to })
            .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockMailbox;
    use crate::model::SessionUser;
    use crate::session_actor::{self, MemorySessionStore, SessionPersistence};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_session_survives_restart_through_persistence() {
        let store: Arc<dyn SessionPersistence> = Arc::new(MemorySessionStore::new());

        let (actor, client) = session_actor::new(8);
        let handle = tokio::spawn(actor.run(store.clone()));
        assert_eq!(client.current_user_id().await.unwrap(), None);
        client
            .sign_in(AuthSession::signed_in(SessionUser::new("u1", "Maria")))
            .await
            .unwrap();
        drop(client);
        handle.await.unwrap();

        let (actor, client) = session_actor::new(8);
        tokio::spawn(actor.run(store));
        assert_eq!(
            client.current_user_id().await.unwrap(),
            Some(UserId::new("u1"))
        );
        client.sign_out().await.unwrap();
        assert_eq!(client.current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_user_changes_follow_sign_in_and_sign_out() {
        let store: Arc<dyn SessionPersistence> = Arc::new(MemorySessionStore::new());
        let (actor, client) = session_actor::new(8);
        tokio::spawn(actor.run(store));

        let mut changes = client.user_changes();
        client
            .sign_in(AuthSession::signed_in(SessionUser::new("u1", "Maria")))
            .await
            .unwrap();
        assert_eq!(client.published_user_id(), Some(UserId::new("u1")));
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), Some(UserId::new("u1")));

        // Signing in again as the same user is not a change.
        client
            .sign_in(AuthSession::signed_in(SessionUser::new("u1", "Maria")))
            .await
            .unwrap();
        assert!(!changes.has_changed().unwrap());

        client.sign_out().await.unwrap();
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn test_dropped_reply_maps_to_session_error() {
        let mut mock = MockMailbox::<SessionRequest>::new();
        mock.expect(|message| drop(message));

        let (_users, user_changes) = watch::channel(None);
        let client = SessionClient::new(mock.mailbox(), user_changes);
        let result = client.current().await;
        assert_eq!(
            result,
            Err(SessionError::Actor(FrameworkError::ActorDropped))
        );
        mock.verify();
    }
}
