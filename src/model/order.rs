//! Orders as the board sees them: the order row joined with its items and the
//! customer profile.
//!
//! Orders are created by the customer-facing ordering surface and only ever
//! change status here. `store_id` never changes after creation.

use crate::model::{OrderStatus, StoreId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub delivery_fee: Option<Decimal>,
    pub payment_method: Option<String>,
    /// `None` means pickup.
    pub delivery_address: Option<DeliveryAddress>,
    pub customer: Option<Customer>,
    pub items: Vec<OrderItem>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a pending order with no items, customer or address.
    pub fn new(id: i64, store_id: StoreId, total_amount: Decimal) -> Self {
        Self {
            id: OrderId(id),
            store_id,
            status: OrderStatus::Pending,
            total_amount,
            delivery_fee: None,
            payment_method: None,
            delivery_address: None,
            customer: None,
            items: Vec::new(),
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_address(mut self, address: DeliveryAddress) -> Self {
        self.delivery_address = Some(address);
        self
    }

    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// The street line to deliver to, or `None` for pickup.
    pub fn delivery_street(&self) -> Option<&str> {
        self.delivery_address.as_ref().and_then(DeliveryAddress::street)
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .and_then(|c| c.full_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

/// Structured delivery address stored as JSON on the order row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryAddress {
    pub address: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
}

impl DeliveryAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn street(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }

    pub fn complement(&self) -> Option<&str> {
        non_blank(self.complement.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Customer profile joined onto an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A line of an order. Price and name are frozen at ordering time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub product_name: String,
    /// `None` once the product has been deleted from the menu.
    pub product: Option<ProductRef>,
}

impl OrderItem {
    pub fn new(id: i64, product_name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            id,
            quantity,
            unit_price,
            product_name: product_name.into(),
            product: None,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Frozen name first, then the live product name, then a placeholder.
    pub fn display_name(&self) -> &str {
        non_blank(Some(self.product_name.as_str()))
            .or_else(|| self.product.as_ref().and_then(|p| non_blank(Some(p.name.as_str()))))
            .unwrap_or("Produto indisponível")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: i64,
    pub name: String,
}
