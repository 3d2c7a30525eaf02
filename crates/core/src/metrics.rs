//! Dashboard figures derived from the cached collections.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Order, Product, UserProfile};
use crate::types::{DeliveryStatus, UserRole};

/// Number of months shown in the sales chart.
pub const SALES_MONTHS: usize = 8;

/// Number of orders in the "recent orders" panel.
pub const RECENT_ORDERS: usize = 5;

/// Everything the dashboard home page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_sales: Decimal,
    pub orders_completed: usize,
    pub total_orders: usize,
    pub customers: usize,
    pub products: usize,
    pub low_stock: usize,
    pub status_breakdown: Vec<StatusCount>,
    pub monthly_sales: Vec<MonthlySales>,
    pub recent_orders: Vec<Order>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: DeliveryStatus,
    pub count: usize,
}

/// Sales total for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySales {
    pub month: String,
    pub total: Decimal,
    /// Bar height relative to the best month, 0–100.
    pub percent: u8,
}

impl DashboardSummary {
    /// Compute the summary. `low_stock_threshold` is inclusive.
    #[must_use]
    pub fn compute(
        orders: &[Order],
        products: &[Product],
        users: &[UserProfile],
        low_stock_threshold: i64,
    ) -> Self {
        Self {
            total_sales: total_sales(orders),
            orders_completed: orders
                .iter()
                .filter(|o| o.delivery_status == DeliveryStatus::Delivered)
                .count(),
            total_orders: orders.len(),
            customers: users.iter().filter(|u| u.role == UserRole::User).count(),
            products: products.len(),
            low_stock: low_stock(products, low_stock_threshold).len(),
            status_breakdown: status_breakdown(orders),
            monthly_sales: monthly_sales(orders, SALES_MONTHS),
            recent_orders: recent_orders(orders, RECENT_ORDERS),
        }
    }
}

/// Sum of `totalAmount` over settled orders.
#[must_use]
pub fn total_sales(orders: &[Order]) -> Decimal {
    orders
        .iter()
        .filter(|o| o.is_settled())
        .fold(Decimal::ZERO, |sum, o| sum.saturating_add(o.total_amount))
}

/// Products at or below the stock threshold, lowest stock first.
#[must_use]
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<&Product> {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|p| p.count_in_stock <= threshold)
        .collect();
    low.sort_by_key(|p| p.count_in_stock);
    low
}

/// Order count for every delivery status, including zero counts.
#[must_use]
pub fn status_breakdown(orders: &[Order]) -> Vec<StatusCount> {
    DeliveryStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: orders.iter().filter(|o| o.delivery_status == status).count(),
        })
        .collect()
}

/// Settled sales per month, oldest first, limited to the latest `months`
/// months that have dated orders.
#[must_use]
pub fn monthly_sales(orders: &[Order], months: usize) -> Vec<MonthlySales> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.is_settled()) {
        if let Some(created) = order.created_at {
            let month = totals
                .entry(created.format("%Y-%m").to_string())
                .or_default();
            *month = month.saturating_add(order.total_amount);
        }
    }

    let skip = totals.len().saturating_sub(months);
    let window: Vec<(String, Decimal)> = totals.into_iter().skip(skip).collect();
    let best = window
        .iter()
        .map(|(_, total)| *total)
        .max()
        .unwrap_or_default();

    window
        .into_iter()
        .map(|(month, total)| MonthlySales {
            percent: percent_of(total, best),
            month,
            total,
        })
        .collect()
}

fn percent_of(value: Decimal, best: Decimal) -> u8 {
    use rust_decimal::prelude::ToPrimitive;

    if best <= Decimal::ZERO {
        return 0;
    }
    (value * Decimal::ONE_HUNDRED / best)
        .round()
        .to_u8()
        .unwrap_or(100)
        .min(100)
}

/// The `limit` most recent orders; undated orders sort last.
#[must_use]
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<Order> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn orders() -> Vec<Order> {
        serde_json::from_value(json!([
            {"_id": "o1", "totalAmount": 1000, "deliveryStatus": "Delivered", "createdAt": "2024-01-10T00:00:00Z"},
            {"_id": "o2", "totalAmount": 2500, "paymentStatus": "Paid", "deliveryStatus": "Pending", "createdAt": "2024-01-20T00:00:00Z"},
            {"_id": "o3", "totalAmount": 4000, "paymentStatus": "Pending", "deliveryStatus": "Shipped", "createdAt": "2024-02-01T00:00:00Z"},
            {"_id": "o4", "totalAmount": 700, "paymentStatus": "Paid", "deliveryStatus": "Delivered", "createdAt": "2024-03-05T00:00:00Z"},
            {"_id": "o5", "totalAmount": 900, "deliveryStatus": "Delivered"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_total_sales_counts_settled_orders() {
        assert_eq!(total_sales(&orders()), Decimal::new(5100, 0));
    }

    #[test]
    fn test_status_breakdown_includes_every_status() {
        let breakdown = status_breakdown(&orders());
        let counts: Vec<_> = breakdown.iter().map(|s| (s.status, s.count)).collect();
        assert_eq!(
            counts,
            vec![
                (DeliveryStatus::Pending, 1),
                (DeliveryStatus::Shipped, 1),
                (DeliveryStatus::Delivered, 3),
            ]
        );
        assert!(status_breakdown(&[]).iter().all(|s| s.count == 0));
    }

    #[test]
    fn test_monthly_sales_window() {
        let sales = monthly_sales(&orders(), 8);
        let months: Vec<_> = sales.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, ["2024-01", "2024-03"]);
        assert_eq!(sales[0].total, Decimal::new(3500, 0));
        assert_eq!(sales[0].percent, 100);
        assert_eq!(sales[1].percent, 20);

        let last = monthly_sales(&orders(), 1);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].month, "2024-03");
    }

    #[test]
    fn test_recent_orders_newest_first_undated_last() {
        let recent = recent_orders(&orders(), 5);
        let ids: Vec<_> = recent.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["o4", "o3", "o2", "o1", "o5"]);
        assert_eq!(recent_orders(&orders(), 2).len(), 2);
    }

    #[test]
    fn test_summary() {
        let products: Vec<Product> = serde_json::from_value(json!([
            {"_id": "p1", "countInStock": 2},
            {"_id": "p2", "countInStock": 5},
            {"_id": "p3", "countInStock": 6}
        ]))
        .unwrap();
        let users: Vec<UserProfile> = serde_json::from_value(json!([
            {"_id": "u1", "email": "a@shop.ng", "role": "admin"},
            {"_id": "u2", "email": "b@shop.ng", "role": "user"},
            {"_id": "u3", "email": "c@shop.ng"}
        ]))
        .unwrap();

        let summary = DashboardSummary::compute(&orders(), &products, &users, 5);
        assert_eq!(summary.orders_completed, 3);
        assert_eq!(summary.total_orders, 5);
        assert_eq!(summary.customers, 2);
        assert_eq!(summary.products, 3);
        assert_eq!(summary.low_stock, 2);
        assert_eq!(summary.recent_orders.len(), 5);
    }
}
