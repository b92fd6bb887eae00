//! Row shapes returned by PostgREST and their conversion into the model.
//!
//! Rows are decoded leniently: optional joins may be absent or `null`, the
//! address column may hold an object or a bare string, and timestamps may or
//! may not carry an offset.

use crate::model::{
    Customer, DeliveryAddress, Order, OrderId, OrderItem, OrderStatus, ProductRef, StoreId,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Embedding used when reading orders: items with their product, and the customer profile.
pub const ORDER_SELECT: &str = "*,order_items(*,products(*)),profiles(*)";

#[derive(Debug, Deserialize)]
pub struct OrderRow {
    pub id: i64,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub delivery_fee: Option<Decimal>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_items: Option<Vec<OrderItemRow>>,
    #[serde(default)]
    pub profiles: Option<ProfileRow>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRow {
    pub id: i64,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub products: Option<ProductRow>,
}

#[derive(Debug, Deserialize)]
pub struct ProductRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// `select=id` on `stores`.
#[derive(Debug, Deserialize)]
pub struct StoreIdRow {
    pub id: String,
}

/// `select=store_id` on `orders`.
#[derive(Debug, Deserialize)]
pub struct OrderStoreRow {
    #[serde(default)]
    pub store_id: Option<String>,
}

impl OrderRow {
    /// Converts the row. `queried_store` fills in a missing `store_id`, which
    /// cannot differ since the query filtered on it.
    pub fn into_order(self, queried_store: &StoreId) -> Order {
        let store_id = self
            .store_id
            .map(StoreId::new)
            .unwrap_or_else(|| queried_store.clone());
        Order {
            id: OrderId(self.id),
            store_id,
            status: OrderStatus::parse(self.status.as_deref().unwrap_or_default()),
            total_amount: self.total_amount.unwrap_or_default(),
            delivery_fee: self.delivery_fee,
            payment_method: self.payment_method,
            delivery_address: self.delivery_address.and_then(address_from_json),
            customer: self.profiles.map(|profile| Customer {
                full_name: profile.full_name,
                phone: profile.phone,
            }),
            items: self
                .order_items
                .unwrap_or_default()
                .into_iter()
                .map(OrderItemRow::into_item)
                .collect(),
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        let quantity = u32::try_from(self.quantity.unwrap_or(0).max(0)).unwrap_or(u32::MAX);
        OrderItem {
            id: self.id,
            quantity,
            unit_price: self.unit_price.unwrap_or_default(),
            product_name: self.product_name.unwrap_or_default(),
            product: self.products.map(|product| ProductRef {
                id: product.id,
                name: product.name.unwrap_or_default(),
            }),
        }
    }
}

fn address_from_json(value: serde_json::Value) -> Option<DeliveryAddress> {
    match value {
        serde_json::Value::Object(_) => match serde_json::from_value(value) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(error = %e, "Unreadable delivery address");
                None
            }
        },
        serde_json::Value::String(line) if !line.trim().is_empty() => {
            Some(DeliveryAddress::new(line))
        }
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| parse_timestamp(&raw)))
}

/// Parses `timestamptz` output, or a naive `timestamp` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = raw.parse::<DateTime<Utc>>() {
        return Some(at);
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(_) => {
            warn!(raw, "Unreadable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_full_row_converts() {
        let row: OrderRow = serde_json::from_value(json!({
            "id": 42,
            "store_id": "s1",
            "status": "preparing",
            "total_amount": 27.5,
            "delivery_address": { "address": "Rua das Flores, 123", "district": "Centro" },
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "order_items": [
                { "id": 1, "quantity": 2, "unit_price": 10, "product_name": "X-Burger",
                  "products": { "id": 9, "name": "X-Burger" } }
            ],
            "profiles": { "full_name": "Maria", "phone": "11987654321" }
        }))
        .unwrap();

        let order = row.into_order(&StoreId::new("s1"));
        assert_eq!(order.id, OrderId(42));
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.total_amount, dec!(27.5));
        assert_eq!(order.delivery_street(), Some("Rua das Flores, 123"));
        assert_eq!(order.customer_name(), Some("Maria"));
        assert_eq!(order.items[0].line_total(), dec!(20));
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_sparse_row_converts_with_defaults() {
        let row: OrderRow = serde_json::from_value(json!({
            "id": 7,
            "status": "on_hold",
            "total_amount": null,
            "delivery_address": null,
            "order_items": null,
            "profiles": null,
            "created_at": "2024-05-01T10:00:00"
        }))
        .unwrap();

        let order = row.into_order(&StoreId::new("s9"));
        assert_eq!(order.store_id, StoreId::new("s9"));
        assert_eq!(order.status, OrderStatus::Unrecognized("on_hold".into()));
        assert_eq!(order.total_amount, Decimal::ZERO);
        assert_eq!(order.delivery_address, None);
        assert!(order.items.is_empty());
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_string_address_is_the_street() {
        let address = address_from_json(json!("Av. Brasil, 500")).unwrap();
        assert_eq!(address.street(), Some("Av. Brasil, 500"));
        assert_eq!(address_from_json(json!("  ")), None);
    }
}
