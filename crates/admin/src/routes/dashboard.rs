//! Dashboard route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use storedesk_core::metrics::DashboardSummary;
use storedesk_core::{CurrencyCode, DeliveryStatus, Order};
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, Loaded, load_or_toast};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// A headline figure.
#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub hint: String,
}

/// One row of the delivery status breakdown.
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub status: DeliveryStatus,
    pub count: usize,
    pub percent: usize,
}

/// One month of the sales chart.
#[derive(Debug, Clone)]
pub struct MonthBar {
    pub month: String,
    pub total: String,
    pub percent: u8,
}

/// Recent order summary for the dashboard.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub customer: String,
    pub date: String,
    pub total: String,
    pub status: DeliveryStatus,
}

impl RecentOrderView {
    fn new(order: &Order, currency: CurrencyCode) -> Self {
        Self {
            customer: order.customer_name().to_owned(),
            date: order
                .created_at
                .map_or_else(|| "N/A".to_string(), |d| d.format("%b %-d, %Y").to_string()),
            total: currency.format(order.total_amount),
            status: order.delivery_status,
        }
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub cards: Vec<StatCard>,
    pub breakdown: Vec<StatusBar>,
    pub monthly_sales: Vec<MonthBar>,
    pub recent_orders: Vec<RecentOrderView>,
}

fn cards(summary: &DashboardSummary, currency: CurrencyCode) -> Vec<StatCard> {
    vec![
        StatCard {
            label: "Total Sales",
            value: currency.format(summary.total_sales),
            hint: "Paid orders, plus delivered orders with no payment status".to_string(),
        },
        StatCard {
            label: "Orders Completed",
            value: summary.orders_completed.to_string(),
            hint: format!("of {} orders", summary.total_orders),
        },
        StatCard {
            label: "Customers",
            value: summary.customers.to_string(),
            hint: "Registered accounts".to_string(),
        },
        StatCard {
            label: "Products",
            value: summary.products.to_string(),
            hint: format!("{} low on stock", summary.low_stock),
        },
    ]
}

fn breakdown(summary: &DashboardSummary) -> Vec<StatusBar> {
    summary
        .status_breakdown
        .iter()
        .map(|s| StatusBar {
            status: s.status,
            count: s.count,
            percent: (s.count * 100)
                .checked_div(summary.total_orders)
                .unwrap_or_default(),
        })
        .collect()
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    let stores = state.stores();
    let (orders, products, users) = tokio::join!(
        stores.orders.all(&admin.token),
        stores.products.all(&admin.token),
        stores.users.all(&admin.token),
    );

    let orders = match load_or_toast(
        &state,
        &session,
        &admin,
        orders,
        "Failed to fetch orders",
        Arc::default,
    )
    .await
    {
        Loaded::Ready(orders) => orders,
        Loaded::Expired(response) => return response,
    };
    let products = match load_or_toast(
        &state,
        &session,
        &admin,
        products,
        "Failed to fetch products",
        Arc::default,
    )
    .await
    {
        Loaded::Ready(products) => products,
        Loaded::Expired(response) => return response,
    };
    let users = match load_or_toast(
        &state,
        &session,
        &admin,
        users,
        "Failed to fetch users",
        Arc::default,
    )
    .await
    {
        Loaded::Ready(users) => users,
        Loaded::Expired(response) => return response,
    };

    let config = state.config();
    let summary =
        DashboardSummary::compute(&orders, &products, &users, config.low_stock_threshold);
    let currency = config.currency;

    DashboardTemplate {
        layout: Layout::new(&state, &session, &admin, "/").await,
        cards: cards(&summary, currency),
        breakdown: breakdown(&summary),
        monthly_sales: summary
            .monthly_sales
            .iter()
            .map(|m| MonthBar {
                month: m.month.clone(),
                total: currency.format(m.total),
                percent: m.percent,
            })
            .collect(),
        recent_orders: summary
            .recent_orders
            .iter()
            .map(|o| RecentOrderView::new(o, currency))
            .collect(),
    }
    .into_response()
}
