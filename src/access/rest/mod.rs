//! # PostgREST Backend
//!
//! [`RestBackend`] implements [`OrderStore`] and [`StoreDirectory`] against the
//! hosted database's REST interface (`/rest/v1/...`). Every request carries the
//! project's anon key as `apikey`, plus a bearer token: the operator's access
//! token when one is set, otherwise the anon key itself.
//!
//! There is no server push here. Pair it with
//! [`PollingOrderFeed`](crate::access::polling::PollingOrderFeed) for change events.

pub mod wire;

use crate::access::{FetchError, OrderStore, StoreDirectory, UpdateError};
use crate::model::{Order, OrderId, OrderStatus, StoreId, UserId};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;
use wire::{OrderRow, OrderStoreRow, StoreIdRow, ORDER_SELECT};

#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: Url,
    anon_key: String,
    access_token: Option<String>,
}

impl RestBackend {
    pub fn new(base_url: Url, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    /// Sends the operator's access token instead of the anon key as bearer.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, table: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("rest/v1/{table}"))
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        match HeaderValue::from_str(&self.anon_key) {
            Ok(value) => {
                headers.insert("apikey", value);
            }
            Err(e) => warn!(error = %e, "Invalid apikey header value"),
        }
        match HeaderValue::from_str(&format!("Bearer {bearer}")) {
            Ok(value) => {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
            Err(e) => warn!(error = %e, "Invalid bearer header value"),
        }
        headers
    }

    fn get(&self, table: &str) -> Result<RequestBuilder, FetchError> {
        let url = self
            .endpoint(table)
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(self.client.get(url).headers(self.auth_headers()))
    }

    async fn fetch_rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let response = ensure_success(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

async fn ensure_success(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl OrderStore for RestBackend {
    #[instrument(skip(self))]
    async fn get_store_orders(&self, store_id: &StoreId) -> Result<Vec<Order>, FetchError> {
        let filter = format!("eq.{store_id}");
        let request = self.get("orders")?.query(&[
            ("select", ORDER_SELECT),
            ("store_id", filter.as_str()),
            ("order", "created_at.desc"),
        ]);
        let rows: Vec<OrderRow> = Self::fetch_rows(request).await?;
        debug!(count = rows.len(), "Orders fetched");
        Ok(rows.into_iter().map(|row| row.into_order(store_id)).collect())
    }

    #[instrument(skip(self))]
    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), UpdateError> {
        let url = self
            .endpoint("orders")
            .map_err(|e| UpdateError::Transport(e.to_string()))?;
        let filter = format!("eq.{order_id}");
        let response = self
            .client
            .patch(url)
            .headers(self.auth_headers())
            .header("Prefer", "return=representation")
            .query(&[("id", filter.as_str())])
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await
            .map_err(|e| UpdateError::Transport(e.to_string()))?;

        let code = response.status();
        if !code.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(UpdateError::Rejected { order_id, reason });
        }

        let rows: Vec<serde_json::Value> =
            response.json().await.map_err(|e| UpdateError::Decode {
                order_id,
                reason: e.to_string(),
            })?;
        if rows.is_empty() {
            return Err(UpdateError::NotFound(order_id));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreDirectory for RestBackend {
    async fn store_owned_by(&self, owner: &UserId) -> Result<Option<StoreId>, FetchError> {
        let filter = format!("eq.{owner}");
        let request = self.get("stores")?.query(&[
            ("select", "id"),
            ("owner_id", filter.as_str()),
            ("limit", "1"),
        ]);
        let rows: Vec<StoreIdRow> = Self::fetch_rows(request).await?;
        Ok(rows.into_iter().next().map(|row| StoreId::new(row.id)))
    }

    async fn any_visible_store(&self) -> Result<Option<StoreId>, FetchError> {
        let request = self.get("stores")?.query(&[("select", "id"), ("limit", "1")]);
        let rows: Vec<StoreIdRow> = Self::fetch_rows(request).await?;
        Ok(rows.into_iter().next().map(|row| StoreId::new(row.id)))
    }

    async fn any_order_store(&self) -> Result<Option<StoreId>, FetchError> {
        let request = self.get("orders")?.query(&[
            ("select", "store_id"),
            ("store_id", "not.is.null"),
            ("limit", "1"),
        ]);
        let rows: Vec<OrderStoreRow> = Self::fetch_rows(request).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.store_id)
            .map(StoreId::new))
    }
}
