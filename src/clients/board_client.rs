use crate::board_actor::{BoardError, BoardNotice, BoardRequest, BoardSnapshot};
use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, Mailbox};
use crate::model::{OrderId, OrderStatus, StoreId};
use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tracing::instrument;

/// Client for interacting with the Board actor.
///
/// Status changes resolve once the write has been confirmed or rolled back;
/// the optimistic state is visible on [`BoardClient::watch`] before that.
#[derive(Clone)]
pub struct BoardClient {
    mailbox: Mailbox<BoardRequest>,
    snapshots: watch::Receiver<BoardSnapshot>,
    notices: broadcast::Sender<BoardNotice>,
}

impl BoardClient {
    pub fn new(
        mailbox: Mailbox<BoardRequest>,
        snapshots: watch::Receiver<BoardSnapshot>,
        notices: broadcast::Sender<BoardNotice>,
    ) -> Self {
        Self {
            mailbox,
            snapshots,
            notices,
        }
    }
}

#[async_trait]
impl ActorClient for BoardClient {
    type Message = BoardRequest;
    type Error = BoardError;

    fn mailbox(&self) -> &Mailbox<BoardRequest> {
        &self.mailbox
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        BoardError::Actor(e)
    }
}

impl BoardClient {
    /// Current state, answered by the board itself.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        self.ask(|respond_to| BoardRequest::Snapshot { respond_to })
            .await
    }

    /// Every published snapshot, newest value first.
    pub fn watch(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshots.clone()
    }

    /// Toast notices published from now on.
    pub fn notices(&self) -> broadcast::Receiver<BoardNotice> {
        self.notices.subscribe()
    }

    /// Writes `status`, optimistically. Returns the status written.
    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderStatus, BoardError> {
        self.ask(move |respond_to| BoardRequest::ChangeStatus {
            order_id,
            status,
            respond_to,
        })
        .await?
    }

    /// Applies the order's next action (accept, dispatch, finish).
    #[instrument(skip(self))]
    pub async fn advance(&self, order_id: OrderId) -> Result<OrderStatus, BoardError> {
        self.ask(move |respond_to| BoardRequest::Advance {
            order_id,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<OrderStatus, BoardError> {
        self.change_status(order_id, OrderStatus::Cancelled).await
    }

    /// Refetches the list. Returns the number of orders loaded.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        self.ask(|respond_to| BoardRequest::Refresh {
            respond_to: Some(respond_to),
        })
        .await?
    }

    /// Drops the current store context, resolves the store again and reloads.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<StoreId, BoardError> {
        self.ask(|respond_to| BoardRequest::Reload {
            respond_to: Some(respond_to),
        })
        .await?
    }

    /// Waits until the board has left the loading phase.
    pub async fn ready(&self) -> Result<BoardSnapshot, BoardError> {
        let mut snapshots = self.watch();
        let snapshot = snapshots
            .wait_for(|snapshot| !snapshot.is_loading())
            .await
            .map_err(|_| BoardError::Actor(FrameworkError::ActorClosed))?;
        Ok(snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{create_mock_mailbox, expect_message};

    fn client_with_receiver() -> (BoardClient, tokio::sync::mpsc::Receiver<BoardRequest>) {
        let (mailbox, receiver) = create_mock_mailbox(8);
        let (_, snapshots) = watch::channel(BoardSnapshot::loading());
        let (notices, _) = broadcast::channel(8);
        (BoardClient::new(mailbox, snapshots, notices), receiver)
    }

    #[tokio::test]
    async fn test_cancel_sends_change_to_cancelled() {
        let (client, mut receiver) = client_with_receiver();

        let pending = tokio::spawn(async move { client.cancel(OrderId(7)).await });

        match expect_message(&mut receiver).await {
            Some(BoardRequest::ChangeStatus {
                order_id,
                status,
                respond_to,
            }) => {
                assert_eq!(order_id, OrderId(7));
                assert_eq!(status, OrderStatus::Cancelled);
                let _ = respond_to.send(Ok(OrderStatus::Cancelled));
            }
            other => panic!("Expected ChangeStatus, got {other:?}"),
        }
        assert_eq!(pending.await.unwrap(), Ok(OrderStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_board_reports_actor_error() {
        let (client, receiver) = client_with_receiver();
        drop(receiver);

        assert_eq!(
            client.refresh().await,
            Err(BoardError::Actor(FrameworkError::ActorClosed))
        );
    }
}
