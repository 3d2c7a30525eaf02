//! End-to-end test harness for Storedesk.
//!
//! Each test starts two servers on ephemeral ports: an in-process fake of
//! the store REST API, and the real dashboard pointed at it. Tests drive
//! the dashboard with a cookie-keeping HTTP client and inspect what the fake
//! API received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storedesk-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use storedesk_admin::config::AdminConfig;
use storedesk_admin::state::AppState;

/// Password the fake API accepts for every account.
pub const ADMIN_PASSWORD: &str = "secret";

/// Token the fake API issues on login.
pub const ADMIN_TOKEN: &str = "tok-admin";

/// A product creation the fake API received.
#[derive(Debug, Clone, Default)]
pub struct CreatedProduct {
    pub fields: Vec<(String, String)>,
    pub image_names: Vec<String>,
}

impl CreatedProduct {
    /// Every value sent under `name`.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

/// An image replacement the fake API received.
#[derive(Debug, Clone, Default)]
pub struct ImageReplacement {
    pub product_id: String,
    pub existing: Vec<String>,
    pub image_names: Vec<String>,
}

/// State of the fake store API.
#[derive(Debug, Default)]
pub struct FakeStore {
    pub products: Vec<Value>,
    pub orders: Vec<Value>,
    pub users: Vec<Value>,
    /// Reject the issued token from now on.
    pub revoked: bool,
    /// Endpoints that answer with an error, e.g. `"products.update"`.
    pub failing: Vec<&'static str>,
    /// Added before every status change answers.
    pub status_delay: Duration,
    pub created: Vec<CreatedProduct>,
    pub updates: Vec<(String, Value)>,
    pub image_replacements: Vec<ImageReplacement>,
    pub new_orders: Vec<Value>,
    /// `(order id, status)` for every payment change.
    pub payment_changes: Vec<(String, Value)>,
    /// Every delivery change, successful or not.
    pub delivery_changes: usize,
    pub profile_updates: Vec<Value>,
    /// `kind:id` for every delete request, e.g. `user:u2`.
    pub deletes: Vec<String>,
}

impl FakeStore {
    /// A catalog with one product, one pending order and two users.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            products: vec![json!({
                "_id": "p1",
                "name": "Shea Butter",
                "brand": "Oja",
                "category": ["Body and Bath"],
                "price": 4500,
                "countInStock": 12,
                "description": "Raw unrefined shea butter",
                "images": ["https://cdn.shop.ng/shea.jpg"]
            })],
            orders: vec![json!({
                "_id": "o1",
                "user": {"_id": "u2", "name": "Bola Ade", "email": "bola@shop.ng"},
                "items": [{"product": "p1", "name": "Shea Butter", "price": 4500, "quantity": 2}],
                "shippingInfo": {"address": "1 Marina", "city": "Lagos", "state": "LA", "phone": "0800"},
                "paymentInfo": {"method": "card", "status": "Paid"},
                "deliveryStatus": "Pending",
                "totalAmount": 9000,
                "createdAt": "2024-06-01T09:30:00Z"
            })],
            users: vec![admin_user(), json!({
                "_id": "u2",
                "name": "Bola Ade",
                "email": "bola@shop.ng",
                "role": "user"
            })],
            ..Self::default()
        }
    }

    /// Make `endpoint` answer with an error from now on.
    pub fn fail(&mut self, endpoint: &'static str) {
        self.failing.push(endpoint);
    }

    fn fails(&self, endpoint: &str) -> bool {
        self.failing.contains(&endpoint)
    }
}

fn admin_user() -> Value {
    json!({
        "_id": "u1",
        "name": "Ada Obi",
        "email": "admin@shop.ng",
        "role": "admin",
        "createdAt": "2024-01-10T08:00:00Z"
    })
}

/// Shared handle on the fake API's state.
#[derive(Debug, Clone, Default)]
pub struct FakeApi(Arc<Mutex<FakeStore>>);

impl FakeApi {
    #[must_use]
    pub fn new(store: FakeStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Lock the state for inspection or changes.
    pub fn lock(&self) -> MutexGuard<'_, FakeStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn router(self) -> Router {
        Router::new()
            .route("/api/auth/admin/login", post(fake_login))
            .route("/api/products", get(fake_products).post(fake_create_product))
            .route(
                "/api/products/{id}",
                put(fake_update_product).delete(fake_delete_product),
            )
            .route("/api/products/{id}/images", put(fake_replace_images))
            .route("/api/orders", get(fake_orders).post(fake_create_order))
            .route("/api/orders/{id}", axum::routing::delete(fake_delete_order))
            .route("/api/orders/{id}/delivery", patch(fake_set_delivery))
            .route("/api/orders/{id}/payment", patch(fake_set_payment))
            .route("/api/users", get(fake_users))
            .route("/api/users/profile", get(fake_profile).patch(fake_update_profile))
            .route("/api/users/{id}", axum::routing::delete(fake_delete_user))
            .with_state(self)
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn not_found(what: &str) -> Response {
    error(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

/// Check the bearer token against the issued one.
fn authorize(api: &FakeApi, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {ADMIN_TOKEN}");
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(expected.as_str()) {
        return Err(unauthorized("Not authorized, no token"));
    }
    if api.lock().revoked {
        return Err(unauthorized("Token expired"));
    }
    Ok(())
}

async fn fake_login(Json(body): Json<Value>) -> Response {
    if body["password"] != ADMIN_PASSWORD {
        return unauthorized("Invalid credentials");
    }
    Json(json!({ "data": { "token": ADMIN_TOKEN, "user": admin_user() } })).into_response()
}

async fn fake_products(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }
    let products = api.lock().products.clone();
    Json(json!({ "products": products })).into_response()
}

async fn fake_create_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut created = CreatedProduct::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let _ = field.bytes().await;
            created.image_names.push(file_name);
        } else {
            let value = field.text().await.unwrap_or_default();
            created.fields.push((name, value));
        }
    }

    let mut store = api.lock();
    let id = format!("p{}", store.products.len() + 1);
    store.products.push(json!({
        "_id": id,
        "name": created.values("name").first().copied().unwrap_or_default(),
        "brand": created.values("brand").first().copied().unwrap_or_default(),
        "category": created.values("category"),
        "price": created.values("price").first().copied().unwrap_or("0"),
        "countInStock": 1,
        "images": created.image_names.iter().map(|n| format!("https://cdn.shop.ng/{n}")).collect::<Vec<_>>()
    }));
    store.created.push(created);
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn fake_update_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut store = api.lock();
    store.updates.push((id.clone(), body.clone()));
    if store.fails("products.update") {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database down");
    }

    let Some(product) = store.products.iter_mut().find(|p| p["_id"] == id.as_str()) else {
        return not_found("Product");
    };
    if let (Some(target), Some(changes)) = (product.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(json!({ "message": "Product updated", "data": body })).into_response()
}

async fn fake_orders(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }
    let orders = api.lock().orders.clone();
    Json(json!({ "orders": orders })).into_response()
}

async fn fake_replace_images(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut replacement = ImageReplacement {
        product_id: id.clone(),
        ..ImageReplacement::default()
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let _ = field.bytes().await;
            replacement.image_names.push(file_name);
        } else if name == "existingImages" {
            replacement.existing.push(field.text().await.unwrap_or_default());
        }
    }

    let mut store = api.lock();
    let images: Vec<String> = replacement
        .existing
        .iter()
        .cloned()
        .chain(replacement.image_names.iter().map(|n| format!("https://cdn.shop.ng/{n}")))
        .collect();
    store.image_replacements.push(replacement);

    let Some(product) = store.products.iter_mut().find(|p| p["_id"] == id.as_str()) else {
        return not_found("Product");
    };
    product["images"] = json!(images);
    Json(json!({ "message": "Images updated", "data": { "images": images } })).into_response()
}

async fn fake_delete_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut store = api.lock();
    store.deletes.push(format!("product:{id}"));
    if store.fails("products.delete") {
        // A 2xx without `success: true` is still a refusal.
        return Json(json!({ "success": false, "message": "Product is in an open order" }))
            .into_response();
    }
    let before = store.products.len();
    store.products.retain(|p| p["_id"] != id.as_str());
    if store.products.len() == before {
        return not_found("Product");
    }
    Json(json!({ "success": true })).into_response()
}

async fn fake_create_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut store = api.lock();
    store.new_orders.push(body.clone());
    if store.fails("orders.create") {
        return error(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    let order = json!({
        "_id": format!("o{}", store.orders.len() + 1),
        "user": body["customer"],
        "items": body["items"],
        "shippingInfo": body["shippingInfo"],
        "paymentInfo": body["paymentInfo"],
        "deliveryStatus": "Pending",
        "totalAmount": body["totalAmount"],
        "createdAt": "2024-07-01T12:00:00Z"
    });
    store.orders.push(order.clone());
    (StatusCode::CREATED, Json(json!({ "order": order }))).into_response()
}

async fn fake_delete_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut store = api.lock();
    store.deletes.push(format!("order:{id}"));
    if store.fails("orders.delete") {
        return error(StatusCode::CONFLICT, "Order is locked");
    }
    let before = store.orders.len();
    store.orders.retain(|o| o["_id"] != id.as_str());
    if store.orders.len() == before {
        return not_found("Order");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn fake_set_delivery(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let delay = {
        let mut store = api.lock();
        store.delivery_changes += 1;
        store.status_delay
    };
    tokio::time::sleep(delay).await;

    let status = body["status"].clone();
    let mut store = api.lock();
    if let Some(order) = store.orders.iter_mut().find(|o| o["_id"] == id.as_str()) {
        order["deliveryStatus"] = status.clone();
    }
    Json(json!({ "deliveryStatus": status })).into_response()
}

async fn fake_set_payment(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let status = body["status"].clone();
    let mut store = api.lock();
    store.payment_changes.push((id.clone(), status.clone()));
    if store.fails("orders.payment") {
        return error(StatusCode::BAD_GATEWAY, "Payment gateway offline");
    }
    let Some(order) = store.orders.iter_mut().find(|o| o["_id"] == id.as_str()) else {
        return not_found("Order");
    };
    order["paymentStatus"] = status.clone();
    Json(json!({ "paymentStatus": status })).into_response()
}

async fn fake_users(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }
    let users = api.lock().users.clone();
    Json(json!({ "data": { "users": users } })).into_response()
}

/// The signed-in admin is always `u1`.
async fn fake_profile(State(api): State<FakeApi>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }
    let store = api.lock();
    match store.users.iter().find(|u| u["_id"] == "u1") {
        Some(user) => Json(json!({ "data": user })).into_response(),
        None => not_found("User"),
    }
}

async fn fake_update_profile(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut store = api.lock();
    store.profile_updates.push(body.clone());
    if store.fails("users.profile") {
        return error(StatusCode::BAD_REQUEST, "Email already in use");
    }
    let Some(user) = store.users.iter_mut().find(|u| u["_id"] == "u1") else {
        return not_found("User");
    };
    if let (Some(target), Some(changes)) = (user.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(json!({ "data": user.clone() })).into_response()
}

async fn fake_delete_user(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&api, &headers) {
        return response;
    }

    let mut store = api.lock();
    store.deletes.push(format!("user:{id}"));
    if store.fails("users.delete") {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Cannot delete user with orders");
    }
    let before = store.users.len();
    store.users.retain(|u| u["_id"] != id.as_str());
    if store.users.len() == before {
        return not_found("User");
    }
    Json(json!({ "message": "User removed" })).into_response()
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });
    addr
}

/// A running dashboard wired to a fake store API.
pub struct TestContext {
    pub client: reqwest::Client,
    pub dashboard: SocketAddr,
    pub api: FakeApi,
    /// The dashboard's state, for driving stores directly.
    pub state: AppState,
}

impl TestContext {
    /// Start both servers over `store`.
    pub async fn start(store: FakeStore) -> Self {
        let api = FakeApi::new(store);
        let api_addr = spawn(api.clone().router()).await;

        let api_base = format!("http://{api_addr}/api");
        let config = AdminConfig::from_lookup(|key| {
            match key {
                "API_BASE_URL" => Some(api_base.as_str()),
                "ADMIN_BASE_URL" => Some("http://127.0.0.1:3001"),
                "ADMIN_SESSION_SECRET" => Some("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
                _ => None,
            }
            .map(String::from)
        })
        .expect("Invalid test configuration");
        let state = AppState::new(config).expect("Failed to build app state");
        let dashboard = spawn(storedesk_admin::app(state.clone())).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            dashboard,
            api,
            state,
        }
    }

    /// Absolute dashboard URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.dashboard)
    }

    /// Sign in through the login form.
    pub async fn login(&self) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .form(&[("email", "admin@shop.ng"), ("password", ADMIN_PASSWORD)])
            .send()
            .await
            .expect("Login request failed")
    }

    /// The dashboard's cached product list.
    pub async fn cached_products(&self) -> Vec<Value> {
        self.get_json("/api/products").await
    }

    /// The dashboard's cached order list.
    pub async fn cached_orders(&self) -> Vec<Value> {
        self.get_json("/api/orders").await
    }

    async fn get_json(&self, path: &str) -> Vec<Value> {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("List request failed")
            .json()
            .await
            .expect("List is not JSON")
    }

    /// Body text of a dashboard page.
    pub async fn page(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Page request failed")
            .text()
            .await
            .expect("Page body is not text")
    }
}

/// A JSON number or numeric string as `f64`.
#[must_use]
pub fn number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
