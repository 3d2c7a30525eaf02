//! Form validation.
//!
//! Each form struct holds the raw strings a browser submitted. `validate`
//! checks every field and either returns the typed payload the store API
//! accepts, or a [`FieldErrors`] map with one message per failing field.
//! Validation never stops at the first error, so a re-rendered form can
//! show all problems at once.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::models::wire::split_list;
use crate::models::{
    Address, NewOrder, NewOrderCustomer, NewOrderItem, NewProduct, PaymentInfo, Product,
    ProductUpdate, ProfileUpdate, ShippingInfo,
};
use crate::types::{Email, PaymentStatus};

/// Maximum number of images on a product.
pub const MAX_PRODUCT_IMAGES: usize = Product::MAX_IMAGES;

/// Per-field validation messages, keyed by form field name.
#[derive(thiserror::Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Message for `field`, or an empty string. Convenient in templates.
    #[must_use]
    pub fn message(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(value)` when no field failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one message was recorded.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn trimmed(value: &str) -> String {
    value.trim().to_owned()
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

fn checked(value: Option<&String>) -> bool {
    value.is_some_and(|v| !matches!(v.trim(), "" | "false" | "off" | "0"))
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) -> String {
    let value = trimmed(value);
    if value.is_empty() {
        errors.add(field, message);
    }
    value
}

fn parse_price(errors: &mut FieldErrors, raw: &str) -> Decimal {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add("price", "Price is required");
        return Decimal::ZERO;
    }
    match Decimal::from_str(raw) {
        Ok(price) if price > Decimal::ZERO => price,
        Ok(_) => {
            errors.add("price", "Price must be greater than 0");
            Decimal::ZERO
        }
        Err(_) => {
            errors.add("price", "Price must be a number");
            Decimal::ZERO
        }
    }
}

fn parse_discount(errors: &mut FieldErrors, raw: &str, price: Decimal) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Decimal::from_str(raw) {
        Ok(d) if d.is_sign_negative() && !d.is_zero() => {
            errors.add("discounted_price", "Discounted price cannot be negative");
            None
        }
        Ok(d) if price > Decimal::ZERO && d > price => {
            errors.add("discounted_price", "Discounted price cannot exceed the price");
            None
        }
        Ok(d) => Some(d),
        Err(_) => {
            errors.add("discounted_price", "Discounted price must be a number");
            None
        }
    }
}

fn parse_stock(errors: &mut FieldErrors, raw: &str) -> i64 {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add("count_in_stock", "Stock count is required");
        return 0;
    }
    let Ok(stock) = Decimal::from_str(raw) else {
        errors.add("count_in_stock", "Stock count must be a number");
        return 0;
    };
    if !stock.fract().is_zero() {
        errors.add("count_in_stock", "Stock must be a whole number");
        return 0;
    }
    if stock.is_sign_negative() && !stock.is_zero() {
        errors.add("count_in_stock", "Stock cannot be negative");
        return 0;
    }
    stock.to_i64().unwrap_or_else(|| {
        errors.add("count_in_stock", "Stock count must be a number");
        0
    })
}

// =============================================================================
// Products
// =============================================================================

/// The add-product form. Images arrive as separate multipart parts, so only
/// their count is validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub discounted_price: String,
    pub count_in_stock: String,
    pub size: String,
    pub sku: String,
    pub target_audience: String,
    pub description: String,
    pub is_featured: Option<String>,
    pub bestseller: Option<String>,
}

impl ProductForm {
    /// Validate the form together with the number of chosen image files.
    ///
    /// # Errors
    ///
    /// Returns every failing field's message.
    pub fn validate(&self, image_count: usize) -> Result<NewProduct, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = require(&mut errors, "name", &self.name, "Product name is required");
        let brand = require(&mut errors, "brand", &self.brand, "Brand is required");
        let category = split_list(&self.category);
        if category.is_empty() {
            errors.add("category", "Category is required");
        }
        let price = parse_price(&mut errors, &self.price);
        let discounted_price = parse_discount(&mut errors, &self.discounted_price, price);
        let count_in_stock = parse_stock(&mut errors, &self.count_in_stock);
        if image_count == 0 {
            errors.add("images", "At least one image is required");
        } else if image_count > MAX_PRODUCT_IMAGES {
            errors.add("images", "You can upload up to 6 images only.");
        }
        let description = require(
            &mut errors,
            "description",
            &self.description,
            "Description is required",
        );

        errors.into_result(|| NewProduct {
            name,
            brand,
            category,
            price,
            discounted_price,
            count_in_stock,
            size: optional(&self.size),
            sku: optional(&self.sku),
            target_audience: optional(&self.target_audience),
            description,
            is_featured: checked(self.is_featured.as_ref()),
            bestseller: checked(self.bestseller.as_ref()),
        })
    }
}

/// The edit-product form. Categories are typed comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductEditForm {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub discounted_price: String,
    pub count_in_stock: String,
    pub size: String,
    pub sku: String,
    pub target_audience: String,
    pub description: String,
    pub is_featured: Option<String>,
    pub bestseller: Option<String>,
}

impl ProductEditForm {
    /// Pre-fill the form from a cached product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category.join(", "),
            price: product.price.normalize().to_string(),
            discounted_price: product
                .discounted_price
                .map(|d| d.normalize().to_string())
                .unwrap_or_default(),
            count_in_stock: product.count_in_stock.to_string(),
            size: product.size.clone().unwrap_or_default(),
            sku: product.sku.clone().unwrap_or_default(),
            target_audience: product.target_audience.clone().unwrap_or_default(),
            description: product.description.clone(),
            is_featured: product.is_featured.then(|| "on".to_owned()),
            bestseller: product.bestseller.then(|| "on".to_owned()),
        }
    }

    /// # Errors
    ///
    /// Returns every failing field's message.
    pub fn validate(&self) -> Result<ProductUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = require(&mut errors, "name", &self.name, "Product name is required");
        let brand = require(&mut errors, "brand", &self.brand, "Brand is required");
        let category = split_list(&self.category);
        if category.is_empty() {
            errors.add("category", "Category is required");
        }
        let price = parse_price(&mut errors, &self.price);
        let discounted_price = parse_discount(&mut errors, &self.discounted_price, price);
        let count_in_stock = parse_stock(&mut errors, &self.count_in_stock);

        errors.into_result(|| ProductUpdate {
            name,
            brand,
            category,
            price,
            discounted_price,
            count_in_stock,
            size: optional(&self.size),
            sku: optional(&self.sku),
            target_audience: optional(&self.target_audience),
            description: trimmed(&self.description),
            is_featured: checked(self.is_featured.as_ref()),
            bestseller: checked(self.bestseller.as_ref()),
        })
    }
}

/// Check an image set made of kept URLs plus new uploads.
///
/// # Errors
///
/// Returns an `images` message when the set is empty or larger than six.
pub fn validate_image_selection(existing: usize, uploads: usize) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let total = existing.saturating_add(uploads);
    if total == 0 {
        errors.add("images", "At least one image is required");
    } else if total > MAX_PRODUCT_IMAGES {
        errors.add("images", "Cannot exceed 6 images.");
    }
    errors.into_result(|| ())
}

// =============================================================================
// Orders
// =============================================================================

/// A product picked on the add-order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderLineInput {
    pub product_id: String,
    pub quantity: String,
}

/// The add-order form.
///
/// Line items are submitted as repeated `product_id`/`quantity` pairs, which
/// a plain struct cannot deserialize, so the form is built from raw pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderForm {
    pub customer_name: String,
    pub customer_email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: String,
    pub items: Vec<OrderLineInput>,
}

impl OrderForm {
    /// Build the form from urlencoded key/value pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = Self::default();
        let mut products = Vec::new();
        let mut quantities = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "customer_name" => form.customer_name.clone_from(value),
                "customer_email" => form.customer_email.clone_from(value),
                "address" => form.address.clone_from(value),
                "city" => form.city.clone_from(value),
                "state" => form.state.clone_from(value),
                "phone" => form.phone.clone_from(value),
                "payment_method" => form.payment_method.clone_from(value),
                "payment_status" => form.payment_status.clone_from(value),
                "transaction_id" => form.transaction_id.clone_from(value),
                "product_id" => products.push(value.clone()),
                "quantity" => quantities.push(value.clone()),
                _ => {}
            }
        }
        // Unused picker slots submit an empty product id.
        form.items = products
            .into_iter()
            .enumerate()
            .filter(|(_, product_id)| !product_id.trim().is_empty())
            .map(|(i, product_id)| OrderLineInput {
                product_id,
                quantity: quantities.get(i).cloned().unwrap_or_else(|| "1".to_owned()),
            })
            .collect();
        form
    }

    /// Validate against the product catalog, pricing lines from it.
    ///
    /// # Errors
    ///
    /// Returns every failing field's message.
    pub fn validate(&self, catalog: &[Product]) -> Result<NewOrder, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = require(
            &mut errors,
            "customer_name",
            &self.customer_name,
            "Customer name is required",
        );
        let email = match Email::parse(&self.customer_email) {
            Ok(email) => email.into_inner(),
            Err(e) => {
                errors.add("customer_email", e.to_string());
                String::new()
            }
        };
        let shipping_info = ShippingInfo {
            address: require(&mut errors, "address", &self.address, "Address is required"),
            city: require(&mut errors, "city", &self.city, "City is required"),
            state: require(&mut errors, "state", &self.state, "State is required"),
            phone: require(&mut errors, "phone", &self.phone, "Phone is required"),
        };
        let status = optional(&self.payment_status).and_then(|raw| {
            PaymentStatus::from_str(&raw)
                .map_err(|_| errors.add("payment_status", "Choose a valid payment status"))
                .ok()
        });

        let mut items: Vec<NewOrderItem> = Vec::with_capacity(self.items.len());
        for line in &self.items {
            let Some(product) = catalog.iter().find(|p| p.id.as_str() == line.product_id) else {
                errors.add("items", "A selected product is no longer available");
                continue;
            };
            let quantity = match line.quantity.trim().parse::<u32>() {
                Ok(q) if q >= 1 => q,
                _ => {
                    errors.add("items", "Quantity must be at least 1");
                    continue;
                }
            };
            if let Some(existing) = items.iter_mut().find(|i| i.product == line.product_id) {
                existing.quantity = existing.quantity.saturating_add(quantity);
                continue;
            }
            items.push(NewOrderItem {
                product: product.id.to_string(),
                name: product.name.clone(),
                price: product.effective_price(),
                quantity,
                image: product.primary_image().map(str::to_owned),
            });
        }
        if self.items.is_empty() {
            errors.add("items", "Add at least one product");
        }

        let total_amount = NewOrder::compute_total(&items).unwrap_or_else(|| {
            errors.add("items", "Order total is too large");
            Decimal::ZERO
        });

        errors.into_result(|| NewOrder {
            customer: NewOrderCustomer { name, email },
            total_amount,
            items,
            shipping_info,
            payment_info: PaymentInfo {
                method: optional(&self.payment_method),
                status,
                transaction_id: optional(&self.transaction_id),
            },
        })
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The edit-profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub street: String,
    pub city: String,
    pub state: String,
}

impl ProfileForm {
    /// Pre-fill the form from the cached profile.
    #[must_use]
    pub fn from_profile(profile: &crate::models::UserProfile) -> Self {
        let (first, last) = match (&profile.first_name, &profile.last_name) {
            (Some(first), last) => (first.clone(), last.clone().unwrap_or_default()),
            (None, _) => profile
                .name
                .split_once(' ')
                .map_or_else(
                    || (profile.name.clone(), String::new()),
                    |(f, l)| (f.to_owned(), l.to_owned()),
                ),
        };
        let address = profile.address.clone().unwrap_or_default();
        Self {
            first_name: first,
            last_name: last,
            email: profile.email.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            street: address.street,
            city: address.city,
            state: address.state,
        }
    }

    /// # Errors
    ///
    /// Returns every failing field's message.
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = require(
            &mut errors,
            "first_name",
            &self.first_name,
            "First name is required",
        );
        let last_name = optional(&self.last_name);
        let email = optional(&self.email).and_then(|raw| match Email::parse(&raw) {
            Ok(email) => Some(email.into_inner()),
            Err(e) => {
                errors.add("email", e.to_string());
                None
            }
        });
        let address = Address {
            street: trimmed(&self.street),
            city: trimmed(&self.city),
            state: trimmed(&self.state),
        };

        errors.into_result(|| ProfileUpdate {
            name: last_name
                .as_ref()
                .map_or_else(|| first_name.clone(), |last| format!("{first_name} {last}")),
            first_name,
            last_name,
            email,
            phone: optional(&self.phone),
            gender: optional(&self.gender),
            address: (!address.is_empty()).then_some(address),
        })
    }
}

// =============================================================================
// Login
// =============================================================================

/// The sign-in form.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validated sign-in credentials, the body of the admin login request.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns messages for an invalid email or an empty password.
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        match email {
            Some(email) if errors.is_empty() => Ok(Credentials {
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_form() -> ProductForm {
        ProductForm {
            name: "Shea Butter".into(),
            brand: "Oja".into(),
            category: "Body and Bath".into(),
            price: "4500".into(),
            count_in_stock: "12".into(),
            description: "Unrefined".into(),
            is_featured: Some("on".into()),
            ..ProductForm::default()
        }
    }

    fn catalog() -> Vec<Product> {
        serde_json::from_value(json!([
            {"_id": "p1", "name": "Soap", "price": 1500, "images": ["https://cdn/soap.jpg"]},
            {"_id": "p2", "name": "Oil", "price": 3000, "discountedPrice": 2500}
        ]))
        .unwrap()
    }

    #[test]
    fn test_valid_product_form() {
        let product = product_form().validate(2).unwrap();
        assert_eq!(product.name, "Shea Butter");
        assert_eq!(product.category, vec!["Body and Bath"]);
        assert_eq!(product.price, Decimal::new(4500, 0));
        assert_eq!(product.count_in_stock, 12);
        assert!(product.is_featured);
        assert!(!product.bestseller);
        assert!(product.sku.is_none());
    }

    #[test]
    fn test_empty_product_form_reports_every_field() {
        let errors = ProductForm::default().validate(0).unwrap_err();
        assert_eq!(errors.get("name"), Some("Product name is required"));
        assert_eq!(errors.get("brand"), Some("Brand is required"));
        assert_eq!(errors.get("category"), Some("Category is required"));
        assert_eq!(errors.get("price"), Some("Price is required"));
        assert_eq!(errors.get("count_in_stock"), Some("Stock count is required"));
        assert_eq!(errors.get("images"), Some("At least one image is required"));
        assert_eq!(errors.get("description"), Some("Description is required"));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_price_rules() {
        let mut form = product_form();
        form.price = "abc".into();
        assert_eq!(
            form.validate(1).unwrap_err().get("price"),
            Some("Price must be a number")
        );
        form.price = "0".into();
        assert_eq!(
            form.validate(1).unwrap_err().get("price"),
            Some("Price must be greater than 0")
        );
        form.price = "-3".into();
        assert_eq!(
            form.validate(1).unwrap_err().get("price"),
            Some("Price must be greater than 0")
        );
    }

    #[test]
    fn test_stock_rules() {
        let mut form = product_form();
        form.count_in_stock = "many".into();
        assert_eq!(
            form.validate(1).unwrap_err().message("count_in_stock"),
            "Stock count must be a number"
        );
        form.count_in_stock = "2.5".into();
        assert_eq!(
            form.validate(1).unwrap_err().message("count_in_stock"),
            "Stock must be a whole number"
        );
        form.count_in_stock = "-1".into();
        assert_eq!(
            form.validate(1).unwrap_err().message("count_in_stock"),
            "Stock cannot be negative"
        );
        form.count_in_stock = "0".into();
        assert_eq!(form.validate(1).unwrap().count_in_stock, 0);
    }

    #[test]
    fn test_too_many_images() {
        let errors = product_form().validate(7).unwrap_err();
        assert_eq!(errors.get("images"), Some("You can upload up to 6 images only."));
        assert!(product_form().validate(6).is_ok());
    }

    #[test]
    fn test_discount_cannot_exceed_price() {
        let mut form = product_form();
        form.discounted_price = "5000".into();
        assert!(form.validate(1).unwrap_err().has("discounted_price"));
        form.discounted_price = "4000".into();
        assert_eq!(
            form.validate(1).unwrap().discounted_price,
            Some(Decimal::new(4000, 0))
        );
    }

    #[test]
    fn test_edit_form_round_trips_product() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1", "name": "Toner", "brand": "Glow", "category": ["Face", "Asian"],
            "price": 125.5, "countInStock": 4, "description": "", "bestseller": true
        }))
        .unwrap();
        let form = ProductEditForm::from_product(&product);
        assert_eq!(form.category, "Face, Asian");
        assert_eq!(form.price, "125.5");

        let update = form.validate().unwrap();
        assert_eq!(update.category, vec!["Face", "Asian"]);
        assert_eq!(update.price, Decimal::new(1255, 1));
        assert!(update.bestseller);
        assert!(!update.is_featured);
    }

    #[test]
    fn test_image_selection_limit() {
        assert!(validate_image_selection(4, 2).is_ok());
        let errors = validate_image_selection(4, 3).unwrap_err();
        assert_eq!(errors.get("images"), Some("Cannot exceed 6 images."));
        assert!(validate_image_selection(0, 0).is_err());
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_order_form_prices_from_catalog() {
        let form = OrderForm::from_pairs(&pairs(&[
            ("customer_name", "Ada"),
            ("customer_email", "ada@shop.ng"),
            ("address", "1 Marina"),
            ("city", "Lagos"),
            ("state", "LA"),
            ("phone", "0800"),
            ("payment_status", "paid"),
            ("product_id", "p1"),
            ("quantity", "2"),
            ("product_id", "p2"),
            ("quantity", "1"),
        ]));
        let order = form.validate(&catalog()).unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].image.as_deref(), Some("https://cdn/soap.jpg"));
        assert_eq!(order.items[1].price, Decimal::new(2500, 0));
        assert_eq!(order.total_amount, Decimal::new(5500, 0));
        assert_eq!(order.payment_info.status, Some(PaymentStatus::Paid));
    }

    #[test]
    fn test_order_form_requires_items_and_contact() {
        let errors = OrderForm::default().validate(&catalog()).unwrap_err();
        assert_eq!(errors.get("items"), Some("Add at least one product"));
        assert_eq!(errors.get("customer_name"), Some("Customer name is required"));
        assert_eq!(errors.get("customer_email"), Some("Email is required"));
        assert!(errors.has("address"));
        assert!(errors.has("phone"));
    }

    #[test]
    fn test_order_form_rejects_total_overflow() {
        let catalog: Vec<Product> = serde_json::from_value(json!([
            {"_id": "p1", "name": "Gold", "price": "79228162514264337593543950335"}
        ]))
        .unwrap();
        let form = OrderForm::from_pairs(&pairs(&[
            ("customer_name", "Ada"),
            ("customer_email", "ada@shop.ng"),
            ("address", "1 Marina"),
            ("city", "Lagos"),
            ("state", "LA"),
            ("phone", "0800"),
            ("product_id", "p1"),
            ("quantity", "2"),
        ]));
        let errors = form.validate(&catalog).unwrap_err();
        assert_eq!(errors.get("items"), Some("Order total is too large"));
    }

    #[test]
    fn test_order_form_rejects_zero_quantity() {
        let form = OrderForm::from_pairs(&pairs(&[("product_id", "p1"), ("quantity", "0")]));
        let errors = form.validate(&catalog()).unwrap_err();
        assert_eq!(errors.get("items"), Some("Quantity must be at least 1"));
    }

    #[test]
    fn test_order_form_skips_empty_picker_slots() {
        let form = OrderForm::from_pairs(&pairs(&[
            ("product_id", ""),
            ("quantity", "1"),
            ("product_id", "p2"),
            ("quantity", "4"),
            ("product_id", " "),
            ("quantity", "1"),
        ]));
        assert_eq!(form.items.len(), 1);
        assert_eq!(form.items[0].product_id, "p2");
        assert_eq!(form.items[0].quantity, "4");
    }

    #[test]
    fn test_order_form_merges_repeated_product() {
        let mut form = OrderForm::from_pairs(&pairs(&[
            ("product_id", "p1"),
            ("quantity", "1"),
            ("product_id", "p1"),
            ("quantity", "2"),
        ]));
        form.customer_name = "Ada".into();
        form.customer_email = "ada@shop.ng".into();
        form.address = "a".into();
        form.city = "b".into();
        form.state = "c".into();
        form.phone = "d".into();
        let order = form.validate(&catalog()).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
    }

    #[test]
    fn test_profile_form() {
        let form = ProfileForm {
            first_name: " Ada ".into(),
            last_name: "Obi".into(),
            email: "ada@shop.ng".into(),
            city: "Lagos".into(),
            ..ProfileForm::default()
        };
        let update = form.validate().unwrap();
        assert_eq!(update.name, "Ada Obi");
        assert_eq!(update.address.unwrap().city, "Lagos");

        let errors = ProfileForm {
            email: "nope".into(),
            ..ProfileForm::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("first_name"), Some("First name is required"));
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
    }

    #[test]
    fn test_login_form() {
        let creds = LoginForm {
            email: " admin@shop.ng ".into(),
            password: "hunter22".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(creds.email.as_str(), "admin@shop.ng");
        assert!(!format!("{creds:?}").contains("hunter22"));

        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }
}
