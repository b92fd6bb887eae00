//! The order detail view: everything the operator sees after opening a card.

use crate::model::{DeliveryAddress, Order, OrderId, OrderItem, StatusAction};
use crate::view::format::{format_brl, relative_time};
use chrono::{DateTime, Utc};
use url::Url;

const MAPS_SEARCH: &str = "https://www.google.com/maps/search/";
const WHATSAPP: &str = "https://wa.me/";

#[derive(Debug, Clone, PartialEq)]
pub struct ItemLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl ItemLine {
    fn new(item: &OrderItem) -> Self {
        Self {
            name: item.display_name().to_string(),
            quantity: item.quantity,
            unit_price: format_brl(item.unit_price),
            line_total: format_brl(item.line_total()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub order_id: OrderId,
    /// `Pedido #42`
    pub title: String,
    pub elapsed: String,
    pub status_label: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub whatsapp_link: Option<Url>,
    /// `street, complement, district - city`, or `Retirada no local`.
    pub full_address: String,
    /// Only for deliveries.
    pub maps_link: Option<Url>,
    pub items: Vec<ItemLine>,
    pub payment_method: String,
    pub delivery_fee: Option<String>,
    pub notes: Option<String>,
    pub total: String,
    pub next_action: Option<StatusAction>,
}

impl OrderDetail {
    pub fn new(order: &Order, now: DateTime<Utc>) -> Self {
        let phone = order
            .customer
            .as_ref()
            .and_then(|customer| customer.phone.as_deref())
            .map(str::trim)
            .filter(|phone| !phone.is_empty());
        let address = order.delivery_address.as_ref().and_then(full_address);

        Self {
            order_id: order.id,
            title: format!("Pedido #{}", order.id),
            elapsed: relative_time(order.created_at, now),
            status_label: order.status.label().to_string(),
            customer_name: order.customer_name().unwrap_or("Cliente").to_string(),
            customer_phone: phone.map(str::to_string),
            whatsapp_link: phone.and_then(whatsapp_link),
            maps_link: address.as_deref().and_then(maps_link),
            full_address: address.unwrap_or_else(|| "Retirada no local".to_string()),
            items: order.items.iter().map(ItemLine::new).collect(),
            payment_method: order
                .payment_method
                .as_deref()
                .map(str::trim)
                .filter(|method| !method.is_empty())
                .unwrap_or("Não informado")
                .to_string(),
            delivery_fee: order.delivery_fee.map(format_brl),
            notes: order
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
            total: format_brl(order.total_amount),
            next_action: StatusAction::for_status(&order.status),
        }
    }

    pub fn is_pickup(&self) -> bool {
        self.maps_link.is_none()
    }
}

/// `None` when there is no street, which means pickup.
fn full_address(address: &DeliveryAddress) -> Option<String> {
    let street = address.street()?;
    let mut line = street.to_string();
    if let Some(complement) = address.complement() {
        line.push_str(", ");
        line.push_str(complement);
    }

    let district = non_blank(address.district.as_deref());
    let city = non_blank(address.city.as_deref());
    let locality = match (district, city) {
        (Some(district), Some(city)) => Some(format!("{district} - {city}")),
        (Some(part), None) | (None, Some(part)) => Some(part.to_string()),
        (None, None) => None,
    };
    if let Some(locality) = locality {
        line.push_str(", ");
        line.push_str(&locality);
    }
    Some(line)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Google Maps search for a full address.
pub fn maps_link(address: &str) -> Option<Url> {
    Url::parse_with_params(MAPS_SEARCH, &[("api", "1"), ("query", address)]).ok()
}

/// `wa.me` link for a phone number. Brazilian 10–11 digit numbers get the `55`
/// country code.
pub fn whatsapp_link(phone: &str) -> Option<Url> {
    let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if (10..=11).contains(&digits.len()) && !digits.starts_with("55") {
        digits.insert_str(0, "55");
    }
    Url::parse(&format!("{WHATSAPP}{digits}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, OrderStatus, ProductRef, StoreId};
    use rust_decimal_macros::dec;

    fn delivery_order() -> Order {
        let mut item = OrderItem::new(1, "X-Burger", 2, dec!(12.5));
        item.product = Some(ProductRef {
            id: 3,
            name: "X-Burger".into(),
        });
        Order::new(42, StoreId::new("s1"), dec!(30))
            .with_customer(Customer::new("João").with_phone("(11) 98765-4321"))
            .with_address(DeliveryAddress {
                address: Some("Rua das Flores, 123".into()),
                complement: Some("Apto 4".into()),
                district: Some("Centro".into()),
                city: Some("São Paulo".into()),
            })
            .with_item(item)
            .with_item(OrderItem::new(2, "", 1, dec!(5)))
            .with_payment_method("pix")
    }

    #[test]
    fn test_delivery_detail() {
        let detail = OrderDetail::new(&delivery_order(), Utc::now());

        assert_eq!(detail.title, "Pedido #42");
        assert_eq!(
            detail.full_address,
            "Rua das Flores, 123, Apto 4, Centro - São Paulo"
        );
        assert!(!detail.is_pickup());
        let maps = detail.maps_link.unwrap();
        assert_eq!(maps.host_str(), Some("www.google.com"));
        assert!(maps.query().unwrap().starts_with("api=1&query=Rua"));
        assert_eq!(
            detail.whatsapp_link.unwrap().as_str(),
            "https://wa.me/5511987654321"
        );
        assert_eq!(detail.items[0].line_total, "R$ 25,00");
        assert_eq!(detail.items[1].name, "Produto indisponível");
        assert_eq!(detail.payment_method, "pix");
        assert_eq!(
            detail.next_action.map(|a| a.label),
            Some("Aceitar Pedido")
        );
    }

    #[test]
    fn test_pickup_detail_without_payment_or_phone() {
        let order = Order::new(5, StoreId::new("s1"), dec!(8)).with_status(OrderStatus::Delivered);
        let detail = OrderDetail::new(&order, Utc::now());

        assert_eq!(detail.full_address, "Retirada no local");
        assert!(detail.is_pickup());
        assert_eq!(detail.whatsapp_link, None);
        assert_eq!(detail.payment_method, "Não informado");
        assert_eq!(detail.next_action, None);
    }

    #[test]
    fn test_whatsapp_keeps_existing_country_code() {
        assert_eq!(
            whatsapp_link("+55 11 98765-4321").unwrap().as_str(),
            "https://wa.me/5511987654321"
        );
        assert_eq!(whatsapp_link("---"), None);
    }
}
