//! Customer orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wire::{id_or_object, lenient, lenient_or_default};
use crate::types::{DeliveryStatus, OrderId, PaymentStatus};

/// An order as returned by `GET /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default, rename = "user")]
    pub customer: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_info: ShippingInfo,
    #[serde(default)]
    pub payment_info: PaymentInfo,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub delivery_status: DeliveryStatus,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total quantity across line items, saturating at `u32::MAX`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count: u32, item| count.saturating_add(item.quantity))
    }

    /// Customer name, or `"Unknown"` when the API did not populate it.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        self.customer
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown")
    }

    /// Customer email, or `"N/A"`.
    #[must_use]
    pub fn customer_email(&self) -> &str {
        self.customer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or("N/A")
    }

    /// Payment state, preferring the top-level field over `paymentInfo.status`.
    #[must_use]
    pub fn effective_payment_status(&self) -> Option<PaymentStatus> {
        self.payment_status.or(self.payment_info.status)
    }

    /// Whether the order counts towards sales figures.
    ///
    /// Paid orders always count. Without any payment state, delivered
    /// orders count.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        match self.effective_payment_status() {
            Some(status) => status == PaymentStatus::Paid,
            None => self.delivery_status == DeliveryStatus::Delivered,
        }
    }
}

/// The `user` field of an order: a bare id or a populated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CustomerRef")]
pub struct OrderCustomer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CustomerRef {
    Id(String),
    Populated {
        #[serde(rename = "_id", default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
}

impl From<CustomerRef> for OrderCustomer {
    fn from(value: CustomerRef) -> Self {
        match value {
            CustomerRef::Id(id) => Self {
                id: Some(id),
                ..Self::default()
            },
            CustomerRef::Populated { id, name, email } => Self { id, name, email },
        }
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, deserialize_with = "id_or_object")]
    pub product: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

const fn one() -> u32 {
    1
}

impl OrderItem {
    /// `price * quantity`, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
}

impl ShippingInfo {
    /// `address, city, state` without empty parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        [&self.address, &self.city, &self.state]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Body of `POST /orders`, built by the add-order form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer: NewOrderCustomer,
    pub items: Vec<NewOrderItem>,
    pub shipping_info: ShippingInfo,
    pub payment_info: PaymentInfo,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderCustomer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NewOrder {
    /// Sum of `price * quantity` over the items, or `None` if it does not
    /// fit in a `Decimal`.
    #[must_use]
    pub fn compute_total(items: &[NewOrderItem]) -> Option<Decimal> {
        items.iter().try_fold(Decimal::ZERO, |total, item| {
            item.price
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|line| total.checked_add(line))
        })
    }
}
