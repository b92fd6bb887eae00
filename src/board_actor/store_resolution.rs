//! Finding the store the signed-in operator manages.
//!
//! Three lookups, tried in a fixed order, stopping at the first hit:
//!
//! 1. the store owned by the operator;
//! 2. any store visible to this client;
//! 3. the store of any existing order.
//!
//! A lookup that errors is logged and treated as "no row", so the cascade
//! always moves on to the next step.

use crate::access::{FetchError, StoreDirectory};
use crate::board_actor::StoreResolutionError;
use crate::model::{StoreId, UserId};
use tracing::{info, warn};

/// Which lookup produced the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    Owner,
    AnyVisibleStore,
    InferredFromOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStore {
    pub store_id: StoreId,
    pub path: ResolutionPath,
}

pub async fn resolve_store(
    directory: &dyn StoreDirectory,
    user_id: Option<&UserId>,
) -> Result<ResolvedStore, StoreResolutionError> {
    let Some(user_id) = user_id else {
        warn!("No session, store resolution skipped");
        return Err(StoreResolutionError::NoSession);
    };

    if let Some(store_id) = no_row_on_error("owner", directory.store_owned_by(user_id).await) {
        info!(%user_id, %store_id, path = ?ResolutionPath::Owner, "Store resolved");
        return Ok(ResolvedStore {
            store_id,
            path: ResolutionPath::Owner,
        });
    }

    warn!(%user_id, "No store owned by operator, trying any visible store");
    if let Some(store_id) = no_row_on_error("visible", directory.any_visible_store().await) {
        warn!(%user_id, %store_id, path = ?ResolutionPath::AnyVisibleStore, "Store resolved");
        return Ok(ResolvedStore {
            store_id,
            path: ResolutionPath::AnyVisibleStore,
        });
    }

    warn!(%user_id, "Still no store, inferring from orders");
    if let Some(store_id) = no_row_on_error("orders", directory.any_order_store().await) {
        warn!(%user_id, %store_id, path = ?ResolutionPath::InferredFromOrder, "Store resolved");
        return Ok(ResolvedStore {
            store_id,
            path: ResolutionPath::InferredFromOrder,
        });
    }

    warn!(%user_id, "No store found on any path");
    Err(StoreResolutionError::NotFound(user_id.clone()))
}

fn no_row_on_error(
    lookup: &'static str,
    result: Result<Option<StoreId>, FetchError>,
) -> Option<StoreId> {
    result.unwrap_or_else(|e| {
        warn!(lookup, error = %e, "Store lookup failed");
        None
    })
}
