use crate::access::memory::InMemoryBackend;
use crate::access::polling::PollingOrderFeed;
use crate::access::rest::RestBackend;
use crate::access::{OrderFeed, OrderStore, StoreDirectory};
use crate::board_actor::{self, BoardContext};
use crate::clients::{BoardClient, SessionClient};
use crate::config::DashboardConfig;
use crate::session_actor::{self, FileSessionStore, SessionPersistence};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The three halves of the access layer the board runs against.
#[derive(Clone)]
pub struct Backends {
    pub orders: Arc<dyn OrderStore>,
    pub directory: Arc<dyn StoreDirectory>,
    pub feed: Arc<dyn OrderFeed>,
}

impl Backends {
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        Self {
            orders: Arc::new(backend.clone()),
            directory: Arc::new(backend.clone()),
            feed: Arc::new(backend),
        }
    }

    /// REST reads and writes, with changes detected by polling the same backend.
    pub fn rest(backend: RestBackend, poll_interval: Duration) -> Self {
        let backend = Arc::new(backend);
        Self {
            orders: backend.clone(),
            directory: backend.clone(),
            feed: Arc::new(PollingOrderFeed::new(backend, poll_interval)),
        }
    }
}

/// The running dashboard: a session actor and the board actor wired to it.
///
/// # Example
///
/// ```ignore
/// let system = DashboardSystem::start(backends, persistence, 32);
/// // The board reloads on its own for the new operator.
/// system.session_client.sign_in(session).await?;
/// system.board_client.advance(OrderId(42)).await?;
/// system.shutdown().await?;
/// ```
pub struct DashboardSystem {
    pub board_client: BoardClient,
    pub session_client: SessionClient,
    handles: Vec<JoinHandle<()>>,
}

impl DashboardSystem {
    /// Spawns both actors. Must be called from within a Tokio runtime.
    pub fn start(
        backends: Backends,
        persistence: Arc<dyn SessionPersistence>,
        mailbox_capacity: usize,
    ) -> Self {
        let (session_actor, session_client) = session_actor::new(mailbox_capacity);
        let (board_actor, board_client) = board_actor::new(mailbox_capacity);

        let session_handle = tokio::spawn(session_actor.run(persistence));
        let board_handle = tokio::spawn(board_actor.run(BoardContext {
            orders: backends.orders,
            directory: backends.directory,
            feed: backends.feed,
            session: session_client.clone(),
        }));

        Self {
            board_client,
            session_client,
            handles: vec![board_handle, session_handle],
        }
    }

    /// Starts against the configured backend, or against `fallback` when no
    /// backend is configured.
    pub fn from_config(config: &DashboardConfig, fallback: InMemoryBackend) -> Self {
        let backends = match &config.backend {
            Some(backend) => {
                info!(url = %backend.url, "Using REST backend");
                Backends::rest(
                    RestBackend::new(backend.url.clone(), backend.anon_key.clone()),
                    config.poll_interval,
                )
            }
            None => {
                info!("No backend configured, using in-memory backend");
                Backends::in_memory(fallback)
            }
        };
        let persistence = Arc::new(FileSessionStore::new(config.session_path.clone()));
        Self::start(backends, persistence, config.mailbox_capacity)
    }

    /// Drops the clients and waits for both actors to stop.
    ///
    /// Clones of the clients held elsewhere keep their actor running, and this
    /// waits for them too.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down dashboard...");

        drop(self.board_client);
        drop(self.session_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Dashboard shutdown complete.");
        Ok(())
    }
}
