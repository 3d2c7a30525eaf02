//! Order route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use storedesk_core::listing::{ListQuery, filter_orders, filter_products, paginate};
use storedesk_core::validation::{FieldErrors, OrderForm, OrderLineInput};
use storedesk_core::{CurrencyCode, DeliveryStatus, Order, OrderId, PaymentStatus, Product};
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, Loaded, PageNav, load_or_toast, mutation_failed};
use crate::components::data_table::{DataTableConfig, orders_table_config};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Product picker rows on the add-order form.
const PICKER_SLOTS: usize = 5;

// =============================================================================
// View Types
// =============================================================================

/// A line item in an expanded order row.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
}

/// A status choice; for delivery buttons the current one is disabled.
#[derive(Debug, Clone)]
pub struct StatusButton {
    pub value: &'static str,
    pub current: bool,
}

/// Order row in the table, including the expanded details.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub customer: String,
    pub email: String,
    pub date: String,
    pub total: String,
    pub item_count: u32,
    pub delivery_status: DeliveryStatus,
    pub payment_status: String,
    pub payment_method: String,
    pub transaction_id: String,
    pub address: String,
    pub phone: String,
    pub items: Vec<OrderItemView>,
    pub delivery_buttons: Vec<StatusButton>,
    pub payment_options: Vec<StatusButton>,
    pub busy: bool,
}

impl OrderRow {
    fn new(order: &Order, currency: CurrencyCode, busy: bool) -> Self {
        let payment_status = order
            .effective_payment_status()
            .map_or_else(|| "N/A".to_string(), |s| s.to_string());
        Self {
            id: order.id.to_string(),
            customer: order.customer_name().to_owned(),
            email: order.customer_email().to_owned(),
            date: order
                .created_at
                .map_or_else(|| "N/A".to_string(), |d| d.format("%b %-d, %Y").to_string()),
            total: currency.format(order.total_amount),
            item_count: order.item_count(),
            delivery_status: order.delivery_status,
            payment_status,
            payment_method: order
                .payment_info
                .method
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            transaction_id: order
                .payment_info
                .transaction_id
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            address: order.shipping_info.one_line(),
            phone: order.shipping_info.phone.clone(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    price: currency.format(item.price),
                    line_total: currency.format(item.line_total()),
                    image: item.image.clone(),
                })
                .collect(),
            delivery_buttons: DeliveryStatus::ALL
                .iter()
                .map(|&status| StatusButton {
                    value: status.as_str(),
                    current: status == order.delivery_status,
                })
                .collect(),
            payment_options: PaymentStatus::ALL
                .iter()
                .map(|&status| StatusButton {
                    value: status.as_str(),
                    current: order.effective_payment_status() == Some(status),
                })
                .collect(),
            busy,
        }
    }
}

/// A product offered by the order picker.
#[derive(Debug, Clone)]
pub struct PickerOption {
    pub id: String,
    pub label: String,
}

impl PickerOption {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            label: format!(
                "{} ({}, {} in stock)",
                product.name,
                currency.format(product.effective_price()),
                product.count_in_stock
            ),
        }
    }
}

/// Picker rows: the submitted lines followed by blank slots.
fn picker_slots(items: &[OrderLineInput]) -> Vec<OrderLineInput> {
    let mut slots = items.to_vec();
    while slots.len() < PICKER_SLOTS {
        slots.push(OrderLineInput {
            product_id: String::new(),
            quantity: "1".to_string(),
        });
    }
    slots
}

// =============================================================================
// Templates
// =============================================================================

/// Orders list page.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub table: DataTableConfig,
    pub rows: Vec<OrderRow>,
    pub nav: PageNav,
    pub search_value: String,
    pub status_value: String,
    /// This page's URL, so status changes return to it.
    pub current_href: String,
}

impl OrdersIndexTemplate {
    fn filter_value(&self) -> &str {
        &self.status_value
    }
}

/// Add-order form.
#[derive(Template, WebTemplate)]
#[template(path = "orders/new.html")]
pub struct OrderNewTemplate {
    pub layout: Layout,
    pub form: OrderForm,
    pub slots: Vec<OrderLineInput>,
    pub options: Vec<PickerOption>,
    pub picker_search: String,
    pub errors: FieldErrors,
    pub payment_statuses: Vec<&'static str>,
}

impl OrderNewTemplate {
    fn payment_selected(&self, status: &str) -> bool {
        self.form.payment_status.eq_ignore_ascii_case(status)
    }
}

fn payment_statuses() -> Vec<&'static str> {
    PaymentStatus::ALL.iter().map(|s| s.as_str()).collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Orders list page handler.
///
/// GET /orders
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Response {
    let result = state.stores().orders.all(&admin.token).await;
    let orders = match load_or_toast(
        &state,
        &session,
        &admin,
        result,
        "Failed to fetch orders",
        Default::default,
    )
    .await
    {
        Loaded::Ready(orders) => orders,
        Loaded::Expired(response) => return response,
    };

    let config = state.config();
    let matching = filter_orders(&orders, query.delivery_status(), query.search_term());
    let page = paginate(matching, query.page(), config.pagination.orders_per_page);
    let stores = state.stores();

    OrdersIndexTemplate {
        layout: Layout::new(&state, &session, &admin, "/orders").await,
        table: orders_table_config(),
        rows: page
            .items
            .iter()
            .map(|o| OrderRow::new(o, config.currency, stores.orders.is_busy(&admin.token, &o.id)))
            .collect(),
        nav: PageNav::new("/orders", &query, &page),
        search_value: query.search_term().unwrap_or_default().to_owned(),
        status_value: query
            .delivery_status()
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default(),
        current_href: super::list_href("/orders", &query, page.page),
    }
    .into_response()
}

/// Picker search parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PickerQuery {
    pub q: Option<String>,
}

async fn render_order_form(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    catalog: &[Product],
    picker_search: &str,
    form: OrderForm,
    errors: FieldErrors,
) -> Response {
    let term = Some(picker_search.trim()).filter(|t| !t.is_empty());
    let currency = state.config().currency;
    let options = filter_products(catalog, None, term)
        .into_iter()
        .map(|p| PickerOption::new(p, currency))
        .collect();
    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (
        status,
        OrderNewTemplate {
            layout: Layout::new(state, session, admin, "/orders").await,
            slots: picker_slots(&form.items),
            form,
            options,
            picker_search: picker_search.to_owned(),
            errors,
            payment_statuses: payment_statuses(),
        },
    )
        .into_response()
}

/// Add-order form with a searchable product picker.
///
/// GET /orders/new
#[instrument(skip_all)]
pub async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(picker): Query<PickerQuery>,
) -> Response {
    let result = state.stores().products.all(&admin.token).await;
    let catalog = match load_or_toast(
        &state,
        &session,
        &admin,
        result,
        "Failed to fetch products",
        Default::default,
    )
    .await
    {
        Loaded::Ready(catalog) => catalog,
        Loaded::Expired(response) => return response,
    };
    let search = picker.q.unwrap_or_default();
    render_order_form(
        &state,
        &session,
        &admin,
        &catalog,
        &search,
        OrderForm::default(),
        FieldErrors::new(),
    )
    .await
}

/// Create an order.
///
/// POST /orders
#[instrument(skip_all)]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = OrderForm::from_pairs(&pairs);
    let catalog = match state.stores().products.all(&admin.token).await {
        Ok(catalog) => catalog,
        Err(e) => {
            return mutation_failed(
                &state,
                &session,
                &admin,
                &e,
                "Failed to fetch products",
                "/orders/new",
            )
            .await;
        }
    };

    let order = match form.validate(&catalog) {
        Ok(order) => order,
        Err(errors) => {
            return render_order_form(&state, &session, &admin, &catalog, "", form, errors).await;
        }
    };

    match state.stores().orders.create(&admin.token, &order).await {
        Ok(created) => {
            tracing::info!(order_id = %created.id, "Order placed from dashboard");
            flash::push(&session, Toast::success("Order created successfully")).await;
            Redirect::to("/orders").into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to create order", "/orders/new")
                .await
        }
    }
}

/// Status change form body.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    /// Listing URL to return to, so filters and page survive the change.
    #[serde(default)]
    pub back: Option<String>,
}

impl StatusForm {
    /// Return target; only local order list links are honored.
    fn back(&self) -> &str {
        self.back
            .as_deref()
            .filter(|b| {
                b.starts_with("/orders")
                    && !b.starts_with("//")
                    && !b.chars().any(char::is_control)
            })
            .unwrap_or("/orders")
    }
}

/// Set an order's delivery status.
///
/// POST /orders/{id}/delivery
#[instrument(skip_all, fields(order_id = %id))]
pub async fn set_delivery(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let back = form.back().to_owned();
    let Ok(status) = form.status.parse::<DeliveryStatus>() else {
        flash::push(&session, Toast::error("Failed to update delivery status")).await;
        return Redirect::to(&back).into_response();
    };

    match state
        .stores()
        .orders
        .set_delivery_status(&admin.token, &id, status)
        .await
    {
        Ok(stored) => {
            flash::push(&session, Toast::success(format!("Order marked as {stored}"))).await;
            Redirect::to(&back).into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to update delivery status", &back)
                .await
        }
    }
}

/// Set an order's payment status.
///
/// POST /orders/{id}/payment
#[instrument(skip_all, fields(order_id = %id))]
pub async fn set_payment(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let back = form.back().to_owned();
    let Ok(status) = form.status.parse::<PaymentStatus>() else {
        flash::push(&session, Toast::error("Failed to update payment status")).await;
        return Redirect::to(&back).into_response();
    };

    match state
        .stores()
        .orders
        .set_payment_status(&admin.token, &id, status)
        .await
    {
        Ok(stored) => {
            flash::push(&session, Toast::success(format!("Payment status set to {stored}"))).await;
            Redirect::to(&back).into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to update payment status", &back)
                .await
        }
    }
}

/// Delete an order.
///
/// POST /orders/{id}/delete
#[instrument(skip_all, fields(order_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Response {
    match state.stores().orders.delete(&admin.token, &id).await {
        Ok(()) => {
            flash::push(&session, Toast::success("Order deleted successfully")).await;
            Redirect::to("/orders").into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to delete order", "/orders").await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order() -> Order {
        serde_json::from_value(json!({
            "_id": "o1",
            "user": {"_id": "u1", "name": "Ada Obi", "email": "ada@shop.ng"},
            "items": [{"product": "p1", "name": "Soap", "price": 1500, "quantity": 2}],
            "shippingInfo": {"address": "1 Marina", "city": "Lagos", "state": "LA", "phone": "080"},
            "deliveryStatus": "Shipped",
            "totalAmount": 3000
        }))
        .unwrap()
    }

    #[test]
    fn test_order_row_disables_current_status() {
        let row = OrderRow::new(&order(), CurrencyCode::NGN, false);
        let current: Vec<_> = row
            .delivery_buttons
            .iter()
            .filter(|b| b.current)
            .map(|b| b.value)
            .collect();
        assert_eq!(current, vec!["Shipped"]);
        assert_eq!(row.delivery_buttons.len(), 3);
        assert_eq!(row.item_count, 2);
        assert_eq!(row.payment_status, "N/A");
        assert!(row.payment_options.iter().all(|o| !o.current));
        assert_eq!(row.address, "1 Marina, Lagos, LA");
        assert_eq!(row.date, "N/A");
    }

    #[test]
    fn test_picker_slots_pad_to_fixed_count() {
        let lines = vec![OrderLineInput {
            product_id: "p1".into(),
            quantity: "2".into(),
        }];
        let slots = picker_slots(&lines);
        assert_eq!(slots.len(), PICKER_SLOTS);
        assert_eq!(slots[0].product_id, "p1");
        assert!(slots[1..].iter().all(|s| s.product_id.is_empty() && s.quantity == "1"));
    }

    #[test]
    fn test_status_form_back_only_follows_order_links() {
        let form = |back: &str| StatusForm {
            status: "Shipped".into(),
            back: Some(back.into()),
        };
        assert_eq!(form("/orders?page=2").back(), "/orders?page=2");
        assert_eq!(form("https://evil.test").back(), "/orders");
        assert_eq!(form("//evil.test/orders").back(), "/orders");
        assert_eq!(form("/orders\r\nSet-Cookie: x=1").back(), "/orders");
        assert_eq!(form("/orders?status=pending\n").back(), "/orders");
        assert_eq!(form("/orders\t").back(), "/orders");
    }
}
