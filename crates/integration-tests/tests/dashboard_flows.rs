//! Dashboard flows against the fake store API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use storedesk_admin::stores::StoreError;
use storedesk_core::{DeliveryStatus, OrderId, PaymentStatus};
use storedesk_integration_tests::{ADMIN_TOKEN, FakeStore, TestContext, number};

fn product_price(products: &[serde_json::Value], id: &str) -> Option<f64> {
    products
        .iter()
        .find(|p| p["_id"] == id)
        .and_then(|p| number(&p["price"]))
}

#[tokio::test]
async fn test_readiness_reports_reachable_api() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    let resp = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_password_with_api_message() {
    let ctx = TestContext::start(FakeStore::seeded()).await;

    let resp = ctx
        .client
        .post(ctx.url("/auth/login"))
        .form(&[("email", "admin@shop.ng"), ("password", "wrong")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/auth/login");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_login_lands_on_dashboard() {
    let ctx = TestContext::start(FakeStore::seeded()).await;

    let resp = ctx.login().await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Login Successful"));
    assert!(body.contains("Ada Obi"));
    assert!(!body.contains(ADMIN_TOKEN));
}

#[tokio::test]
async fn test_create_product_sends_multipart_fields_and_images() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;

    let image = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("serum.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = Form::new()
        .text("name", "Glow Serum")
        .text("brand", "Lumi")
        .text("category", "Face")
        .text("category", "Asian")
        .text("price", "12000")
        .text("discounted_price", "")
        .text("count_in_stock", "8")
        .text("description", "Vitamin C serum")
        .text("is_featured", "on")
        .part("images", image);

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/products");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Product created successfully"));
    assert!(body.contains("Glow Serum"));

    let store = ctx.api.lock();
    let created = store.created.first().unwrap();
    assert_eq!(created.values("category"), vec!["Face", "Asian"]);
    assert_eq!(created.values("price"), vec!["12000"]);
    assert_eq!(created.values("countInStock"), vec!["8"]);
    assert_eq!(created.values("isFeatured"), vec!["true"]);
    assert!(created.values("discountedPrice").is_empty());
    assert_eq!(created.image_names, vec!["serum.jpg".to_string()]);
}

#[tokio::test]
async fn test_create_product_without_images_is_rejected_locally() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;

    let form = Form::new()
        .text("name", "Glow Serum")
        .text("brand", "Lumi")
        .text("category", "Face")
        .text("price", "12000")
        .text("count_in_stock", "8")
        .text("description", "Vitamin C serum");

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("At least one image is required"));
    assert!(ctx.api.lock().created.is_empty());
}

#[tokio::test]
async fn test_update_product_sends_json_and_refreshes_cache() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    assert_eq!(product_price(&ctx.cached_products().await, "p1"), Some(4500.0));

    let resp = ctx
        .client
        .post(ctx.url("/products/p1"))
        .form(&[
            ("name", "Shea Butter"),
            ("brand", "Oja"),
            ("category", "Body and Bath, Face"),
            ("price", "3900"),
            ("discounted_price", ""),
            ("count_in_stock", "7"),
            ("description", "Raw unrefined shea butter"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/products");
    assert!(resp.text().await.unwrap().contains("Product updated"));

    {
        let store = ctx.api.lock();
        let (id, body) = store.updates.first().unwrap();
        assert_eq!(id, "p1");
        assert_eq!(body["price"].as_f64(), Some(3900.0));
        assert_eq!(body["countInStock"], 7);
        assert_eq!(body["category"], serde_json::json!(["Body and Bath", "Face"]));
        assert!(body.get("discountedPrice").is_none());
        assert_eq!(body["isFeatured"], false);
    }

    assert_eq!(product_price(&ctx.cached_products().await, "p1"), Some(3900.0));
}

#[tokio::test]
async fn test_failed_update_keeps_cached_product() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_products().await;
    ctx.api.lock().fail("products.update");

    let resp = ctx
        .client
        .post(ctx.url("/products/p1"))
        .form(&[
            ("name", "Shea Butter"),
            ("brand", "Oja"),
            ("category", "Body and Bath"),
            ("price", "100"),
            ("count_in_stock", "7"),
            ("description", "Raw unrefined shea butter"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("Database down"));
    assert_eq!(product_price(&ctx.cached_products().await, "p1"), Some(4500.0));
}

#[tokio::test]
async fn test_delivery_status_change_updates_order_list() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;

    let resp = ctx
        .client
        .post(ctx.url("/orders/o1/delivery"))
        .form(&[("status", "Shipped"), ("back", "/orders?status=pending")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders");
    assert_eq!(resp.url().query(), Some("status=pending"));
    assert!(resp.text().await.unwrap().contains("Order marked as Shipped"));

    let orders = ctx.cached_orders().await;
    assert_eq!(orders.first().unwrap()["deliveryStatus"], "Shipped");
}

#[tokio::test]
async fn test_revoked_token_signs_the_admin_out() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_products().await;
    ctx.api.lock().revoked = true;

    let resp = ctx
        .client
        .post(ctx.url("/products/refresh"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/auth/login");
    assert!(resp.text().await.unwrap().contains("Your session has expired"));

    let resp = ctx.client.get(ctx.url("/products")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/auth/login");
}

fn jpeg(name: &str) -> Part {
    Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name(name.to_owned())
        .mime_str("image/jpeg")
        .unwrap()
}

#[tokio::test]
async fn test_replace_images_keeps_selection_and_adds_uploads() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_products().await;

    let form = Form::new()
        .text("existing_images", "https://cdn.shop.ng/shea.jpg")
        .part("images", jpeg("jar.jpg"));
    let resp = ctx
        .client
        .post(ctx.url("/products/p1/images"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/products/p1");
    assert!(resp.text().await.unwrap().contains("Images updated"));

    {
        let store = ctx.api.lock();
        let replacement = store.image_replacements.first().unwrap();
        assert_eq!(replacement.product_id, "p1");
        assert_eq!(replacement.existing, vec!["https://cdn.shop.ng/shea.jpg".to_string()]);
        assert_eq!(replacement.image_names, vec!["jar.jpg".to_string()]);
    }

    let products = ctx.cached_products().await;
    let images = products.first().unwrap()["images"].as_array().unwrap().clone();
    assert_eq!(
        images,
        vec![
            serde_json::json!("https://cdn.shop.ng/shea.jpg"),
            serde_json::json!("https://cdn.shop.ng/jar.jpg"),
        ]
    );
}

#[tokio::test]
async fn test_replace_images_over_the_limit_never_reaches_api() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;

    let mut form = Form::new();
    for n in 0..6 {
        form = form.text("existing_images", format!("https://cdn.shop.ng/{n}.jpg"));
    }
    let form = form.part("images", jpeg("extra.jpg"));
    let resp = ctx
        .client
        .post(ctx.url("/products/p1/images"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/products/p1/images");
    assert!(resp.text().await.unwrap().contains("Cannot exceed 6 images."));
    assert!(ctx.api.lock().image_replacements.is_empty());
}

#[tokio::test]
async fn test_delete_product_drops_it_from_cache() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    assert_eq!(ctx.cached_products().await.len(), 1);

    let resp = ctx
        .client
        .post(ctx.url("/products/p1/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/products");
    assert!(resp.text().await.unwrap().contains("Product deleted successfully"));
    assert_eq!(ctx.api.lock().deletes, vec!["product:p1".to_string()]);
    assert!(ctx.cached_products().await.is_empty());
}

#[tokio::test]
async fn test_delete_product_refused_without_success_flag_keeps_cache() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_products().await;
    ctx.api.lock().fail("products.delete");

    let resp = ctx
        .client
        .post(ctx.url("/products/p1/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/products");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Product is in an open order"));
    assert!(!body.contains("Product deleted successfully"));
    assert_eq!(product_price(&ctx.cached_products().await, "p1"), Some(4500.0));
}

#[tokio::test]
async fn test_encoded_slashes_in_ids_stay_inside_one_segment() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;

    let resp = ctx
        .client
        .post(ctx.url("/products/..%2Fusers%2Fu1/delete"))
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains("Product not found"));

    let resp = ctx
        .client
        .post(ctx.url("/orders/o1%3Fforce=1/delete"))
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains("Order not found"));

    let store = ctx.api.lock();
    assert_eq!(
        store.deletes,
        vec!["product:../users/u1".to_string(), "order:o1?force=1".to_string()]
    );
    assert_eq!(store.users.len(), 2);
    assert_eq!(store.orders.len(), 1);
}

fn order_form(quantity: &str) -> Vec<(&'static str, String)> {
    vec![
        ("customer_name", "Chidi Eze".to_owned()),
        ("customer_email", "chidi@shop.ng".to_owned()),
        ("address", "4 Allen Avenue".to_owned()),
        ("city", "Ikeja".to_owned()),
        ("state", "LA".to_owned()),
        ("phone", "0803".to_owned()),
        ("payment_method", "transfer".to_owned()),
        ("payment_status", "Paid".to_owned()),
        ("transaction_id", String::new()),
        ("product_id", "p1".to_owned()),
        ("quantity", quantity.to_owned()),
        ("product_id", String::new()),
        ("quantity", "1".to_owned()),
    ]
}

#[tokio::test]
async fn test_create_order_posts_priced_lines_and_prepends_to_cache() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    assert_eq!(ctx.cached_orders().await.len(), 1);

    let resp = ctx
        .client
        .post(ctx.url("/orders"))
        .form(&order_form("3"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders");
    assert!(resp.text().await.unwrap().contains("Order created successfully"));

    {
        let store = ctx.api.lock();
        let posted = store.new_orders.first().unwrap();
        assert_eq!(posted["customer"]["name"], "Chidi Eze");
        assert_eq!(posted["customer"]["email"], "chidi@shop.ng");
        assert_eq!(posted["items"].as_array().unwrap().len(), 1);
        assert_eq!(posted["items"][0]["product"], "p1");
        assert_eq!(posted["items"][0]["quantity"], 3);
        assert_eq!(number(&posted["items"][0]["price"]), Some(4500.0));
        assert_eq!(number(&posted["totalAmount"]), Some(13500.0));
        assert_eq!(posted["shippingInfo"]["city"], "Ikeja");
        assert_eq!(posted["paymentInfo"]["status"], "Paid");
        assert!(posted["paymentInfo"].get("transactionId").is_none());
    }

    // The fake appends; the cache puts the new order first.
    let orders = ctx.cached_orders().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders.first().unwrap()["_id"], "o2");
}

#[tokio::test]
async fn test_create_order_rejected_by_api_keeps_cache() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_orders().await;
    ctx.api.lock().fail("orders.create");

    let resp = ctx
        .client
        .post(ctx.url("/orders"))
        .form(&order_form("2"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders/new");
    assert!(resp.text().await.unwrap().contains("Insufficient stock"));
    assert_eq!(ctx.api.lock().new_orders.len(), 1);
    assert_eq!(ctx.cached_orders().await.len(), 1);
}

#[tokio::test]
async fn test_payment_status_change_patches_cached_order() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_orders().await;

    let resp = ctx
        .client
        .post(ctx.url("/orders/o1/payment"))
        .form(&[("status", "refunded"), ("back", "/orders")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders");
    assert!(resp.text().await.unwrap().contains("Payment status set to Refunded"));
    assert_eq!(
        ctx.api.lock().payment_changes,
        vec![("o1".to_string(), serde_json::json!("Refunded"))]
    );
    let orders = ctx.cached_orders().await;
    assert_eq!(orders.first().unwrap()["paymentStatus"], "Refunded");
}

#[tokio::test]
async fn test_failed_payment_status_change_leaves_order_untouched() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_orders().await;
    ctx.api.lock().fail("orders.payment");

    let resp = ctx
        .client
        .post(ctx.url("/orders/o1/payment"))
        .form(&[("status", "Refunded")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders");
    assert!(resp.text().await.unwrap().contains("Payment gateway offline"));
    let orders = ctx.cached_orders().await;
    assert!(orders.first().unwrap().get("paymentStatus").is_none());
}

#[tokio::test]
async fn test_delete_order_accepts_empty_response() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_orders().await;

    let resp = ctx
        .client
        .post(ctx.url("/orders/o1/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders");
    assert!(resp.text().await.unwrap().contains("Order deleted successfully"));
    assert!(ctx.cached_orders().await.is_empty());
}

#[tokio::test]
async fn test_failed_order_delete_keeps_cached_order() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.cached_orders().await;
    ctx.api.lock().fail("orders.delete");

    let resp = ctx
        .client
        .post(ctx.url("/orders/o1/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/orders");
    assert!(resp.text().await.unwrap().contains("Order is locked"));
    assert_eq!(ctx.cached_orders().await.len(), 1);
}

fn profile_form() -> [(&'static str, &'static str); 8] {
    [
        ("first_name", "Adaeze"),
        ("last_name", "Obi"),
        ("email", "admin@shop.ng"),
        ("phone", "0801"),
        ("gender", "female"),
        ("street", "9 Awolowo Road"),
        ("city", "Ikoyi"),
        ("state", "LA"),
    ]
}

#[tokio::test]
async fn test_profile_update_sends_camel_case_and_shows_new_name() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    assert!(ctx.page("/profile").await.contains("Ada Obi"));

    let resp = ctx
        .client
        .post(ctx.url("/profile"))
        .form(&profile_form())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/profile");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Profile updated successfully"));
    assert!(body.contains("Adaeze Obi"));

    let store = ctx.api.lock();
    let sent = store.profile_updates.first().unwrap();
    assert_eq!(sent["name"], "Adaeze Obi");
    assert_eq!(sent["firstName"], "Adaeze");
    assert_eq!(sent["lastName"], "Obi");
    assert_eq!(sent["address"]["street"], "9 Awolowo Road");
    assert!(sent.get("first_name").is_none());
}

#[tokio::test]
async fn test_rejected_profile_update_returns_to_form() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.api.lock().fail("users.profile");

    let resp = ctx
        .client
        .post(ctx.url("/profile"))
        .form(&profile_form())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/profile/edit");
    assert!(resp.text().await.unwrap().contains("Email already in use"));
    let profile = ctx.page("/profile").await;
    assert!(profile.contains("Ada Obi"));
    assert!(!profile.contains("Adaeze"));
}

#[tokio::test]
async fn test_delete_user_removes_row() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    assert!(ctx.page("/users").await.contains("bola@shop.ng"));

    let resp = ctx
        .client
        .post(ctx.url("/users/u2/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/users");
    let body = resp.text().await.unwrap();
    assert!(body.contains("User deleted successfully"));
    assert!(!body.contains("bola@shop.ng"));
}

#[tokio::test]
async fn test_failed_user_delete_keeps_row() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.login().await;
    ctx.page("/users").await;
    ctx.api.lock().fail("users.delete");

    let resp = ctx
        .client
        .post(ctx.url("/users/u2/delete"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/users");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Cannot delete user with orders"));
    assert!(body.contains("bola@shop.ng"));
}

#[tokio::test]
async fn test_second_change_to_same_order_is_busy_while_first_runs() {
    let ctx = TestContext::start(FakeStore::seeded()).await;
    ctx.api.lock().status_delay = Duration::from_millis(300);
    let order = OrderId::new("o1");

    let first = {
        let state = ctx.state.clone();
        let order = order.clone();
        tokio::spawn(async move {
            state
                .stores()
                .orders
                .set_delivery_status(ADMIN_TOKEN, &order, DeliveryStatus::Shipped)
                .await
        })
    };

    let orders = &ctx.state.stores().orders;
    for _ in 0..200 {
        if orders.is_busy(ADMIN_TOKEN, &order) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(orders.is_busy(ADMIN_TOKEN, &order));

    let delivery = orders
        .set_delivery_status(ADMIN_TOKEN, &order, DeliveryStatus::Delivered)
        .await;
    assert!(matches!(delivery, Err(StoreError::Busy)));
    let payment = orders
        .set_payment_status(ADMIN_TOKEN, &order, PaymentStatus::Paid)
        .await;
    assert!(matches!(payment, Err(StoreError::Busy)));

    assert_eq!(first.await.unwrap().unwrap(), DeliveryStatus::Shipped);
    assert!(!orders.is_busy(ADMIN_TOKEN, &order));
    let store = ctx.api.lock();
    assert_eq!(store.delivery_changes, 1);
    assert!(store.payment_changes.is_empty());
}
