//! Catalog product records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wire::one_or_many;
use crate::types::{CurrencyCode, Price, ProductId};

/// Categories offered by the add-product form.
pub const PRODUCT_CATEGORIES: [&str; 5] = [
    "Face",
    "Asian",
    "Body and Bath",
    "Cleanser and Toners",
    "Haircare",
];

/// A product as returned by `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub category: Vec<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Decimal>,
    #[serde(default)]
    pub count_in_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub bestseller: bool,
}

impl Product {
    /// Maximum number of images a product may carry.
    pub const MAX_IMAGES: usize = 6;

    /// First image, used as the table thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// The price a customer pays: the discounted price when one is set.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discounted_price
            .filter(|d| *d > Decimal::ZERO && *d < self.price)
            .unwrap_or(self.price)
    }

    /// Price with currency, for display.
    #[must_use]
    pub const fn price_in(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }

    /// Categories joined for display.
    #[must_use]
    pub fn category_label(&self) -> String {
        self.category.join(", ")
    }

    /// Overlay the fields the API echoed back onto this cached record.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if patch.discounted_price.is_some() {
            self.discounted_price = patch.discounted_price;
        }
        if let Some(stock) = patch.count_in_stock {
            self.count_in_stock = stock;
        }
        if patch.size.is_some() {
            self.size = patch.size;
        }
        if patch.sku.is_some() {
            self.sku = patch.sku;
        }
        if patch.target_audience.is_some() {
            self.target_audience = patch.target_audience;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(featured) = patch.is_featured {
            self.is_featured = featured;
        }
        if let Some(bestseller) = patch.bestseller {
            self.bestseller = bestseller;
        }
    }
}

/// A partial product, as returned in the `data` field of update responses.
///
/// Every field is optional; only those present replace cached values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "optional_categories")]
    pub category: Option<Vec<String>>,
    pub price: Option<Decimal>,
    pub discounted_price: Option<Decimal>,
    pub count_in_stock: Option<i64>,
    pub size: Option<String>,
    pub sku: Option<String>,
    pub target_audience: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub bestseller: Option<bool>,
}

fn optional_categories<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    one_or_many(deserializer).map(Some)
}

impl From<ProductUpdate> for ProductPatch {
    fn from(update: ProductUpdate) -> Self {
        Self {
            name: Some(update.name),
            brand: Some(update.brand),
            category: Some(update.category),
            price: Some(update.price),
            discounted_price: update.discounted_price,
            count_in_stock: Some(update.count_in_stock),
            size: update.size,
            sku: update.sku,
            target_audience: update.target_audience,
            description: Some(update.description),
            images: None,
            is_featured: Some(update.is_featured),
            bestseller: Some(update.bestseller),
        }
    }
}

/// Body of `PUT /products/{id}` (everything but images).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    pub brand: String,
    pub category: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub discounted_price: Option<Decimal>,
    pub count_in_stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    pub description: String,
    pub is_featured: bool,
    pub bestseller: bool,
}

/// A validated new product, sent to `POST /products` as multipart form data
/// together with its image files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub category: Vec<String>,
    pub price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub count_in_stock: i64,
    pub size: Option<String>,
    pub sku: Option<String>,
    pub target_audience: Option<String>,
    pub description: String,
    pub is_featured: bool,
    pub bestseller: bool,
}

impl NewProduct {
    /// Text fields of the multipart body, in the order the API reads them.
    ///
    /// Categories are repeated under the same `category` key.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("name", self.name.clone()), ("brand", self.brand.clone())];
        fields.extend(self.category.iter().map(|c| ("category", c.clone())));
        fields.push(("price", self.price.normalize().to_string()));
        if let Some(discounted) = self.discounted_price {
            fields.push(("discountedPrice", discounted.normalize().to_string()));
        }
        fields.push(("countInStock", self.count_in_stock.to_string()));
        if let Some(size) = &self.size {
            fields.push(("size", size.clone()));
        }
        if let Some(sku) = &self.sku {
            fields.push(("sku", sku.clone()));
        }
        if let Some(audience) = &self.target_audience {
            fields.push(("targetAudience", audience.clone()));
        }
        fields.push(("description", self.description.clone()));
        fields.push(("isFeatured", self.is_featured.to_string()));
        fields.push(("bestseller", self.bestseller.to_string()));
        fields
    }
}
