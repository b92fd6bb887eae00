//! The session provider: one actor holding the signed-in operator.
//!
//! The persisted session is read once in `on_start`. Afterwards the in-memory
//! copy answers reads, and every change is written through before it is
//! acknowledged. The signed-in user id is also published on a watch channel
//! once the change is persisted, so the board can follow sign-in and sign-out.

use crate::framework::{ActorState, Response, WeakMailbox};
use crate::model::{AuthSession, UserId};
use crate::session_actor::{SessionError, SessionPersistence};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug)]
pub enum SessionRequest {
    Get {
        respond_to: Response<Option<AuthSession>>,
    },
    Set {
        session: AuthSession,
        respond_to: Response<Result<(), SessionError>>,
    },
    Clear {
        respond_to: Response<Result<(), SessionError>>,
    },
}

#[derive(Debug)]
pub struct SessionState {
    current: Option<AuthSession>,
    users: watch::Sender<Option<UserId>>,
}

impl SessionState {
    pub fn new(users: watch::Sender<Option<UserId>>) -> Self {
        Self {
            current: None,
            users,
        }
    }

    fn publish_user(&self) {
        let user_id = self.current.as_ref().and_then(|s| s.user_id()).cloned();
        self.users.send_if_modified(|published| {
            if *published == user_id {
                return false;
            }
            *published = user_id;
            true
        });
    }
}

#[async_trait]
impl ActorState for SessionState {
    type Message = SessionRequest;
    type Context = Arc<dyn SessionPersistence>;

    async fn on_start(&mut self, ctx: &Self::Context, _mailbox: &WeakMailbox<SessionRequest>) {
        match ctx.load().await {
            Ok(session) => {
                let user_id = session.as_ref().and_then(|s| s.user_id()).cloned();
                info!(signed_in = user_id.is_some(), user_id = ?user_id, "Session restored");
                self.current = session;
                self.publish_user();
            }
            Err(e) => warn!(error = %e, "Session could not be restored"),
        }
    }

    async fn handle(
        &mut self,
        message: SessionRequest,
        ctx: &Self::Context,
        _mailbox: &WeakMailbox<SessionRequest>,
    ) {
        match message {
            SessionRequest::Get { respond_to } => {
                let _ = respond_to.send(self.current.clone());
            }
            SessionRequest::Set {
                session,
                respond_to,
            } => {
                let result = ctx.save(&session).await;
                if result.is_ok() {
                    info!(user_id = ?session.user_id(), "Signed in");
                    self.current = Some(session);
                    self.publish_user();
                }
                let _ = respond_to.send(result);
            }
            SessionRequest::Clear { respond_to } => {
                let result = ctx.clear().await;
                if result.is_ok() {
                    info!("Signed out");
                    self.current = None;
                    self.publish_user();
                }
                let _ = respond_to.send(result);
            }
        }
    }
}
