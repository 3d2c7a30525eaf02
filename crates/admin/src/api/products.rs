//! Product endpoints.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use storedesk_core::{NewProduct, Product, ProductId, ProductPatch, ProductUpdate};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// An uploaded image file, forwarded to the API as a multipart part.
#[derive(Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    fn into_part(self) -> Result<Part, ApiError> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(mime) => part
                .mime_str(&mime)
                .map_err(|e| ApiError::Parse(format!("Invalid content type '{mime}': {e}"))),
            None => Ok(part),
        }
    }
}

#[derive(Deserialize)]
struct ProductList {
    #[serde(default)]
    products: Vec<Product>,
}

/// Response of the update endpoints: the changed fields plus an optional
/// confirmation message.
#[derive(Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: ProductPatch,
}

impl ApiClient {
    /// Fetch every product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token))]
    pub async fn list_products(&self, token: &str) -> Result<Vec<Product>, ApiError> {
        let request = self.request(Method::GET, &["products"], Some(token))?;
        let list: ProductList = self.send_json(request).await?;
        tracing::debug!(count = list.products.len(), "Fetched products");
        Ok(list.products)
    }

    /// Create a product with its image files.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token, product, images), fields(name = %product.name, images = images.len()))]
    pub async fn create_product(
        &self,
        token: &str,
        product: &NewProduct,
        images: Vec<Upload>,
    ) -> Result<(), ApiError> {
        let mut form = Form::new();
        for (key, value) in product.form_fields() {
            form = form.text(key, value);
        }
        for image in images {
            form = form.part("images", image.into_part()?);
        }

        let request = self
            .request(Method::POST, &["products"], Some(token))?
            .multipart(form);
        self.send_optional_json(request).await?;
        Ok(())
    }

    /// Update a product's fields (not its images).
    ///
    /// Returns the fields the API echoed back and its message, if any.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<(ProductPatch, Option<String>), ApiError> {
        let request = self
            .request(Method::PUT, &["products", id.as_str()], Some(token))?
            .json(update);
        let response: UpdateResponse = self.send_json(request).await?;
        Ok((response.data, response.message))
    }

    /// Replace a product's image set with the kept URLs plus new uploads.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token, existing, uploads), fields(product_id = %id, kept = existing.len(), added = uploads.len()))]
    pub async fn update_product_images(
        &self,
        token: &str,
        id: &ProductId,
        existing: &[String],
        uploads: Vec<Upload>,
    ) -> Result<(ProductPatch, Option<String>), ApiError> {
        let mut form = Form::new();
        for url in existing {
            form = form.text("existingImages", url.clone());
        }
        for upload in uploads {
            form = form.part("images", upload.into_part()?);
        }

        let request = self
            .request(Method::PUT, &["products", id.as_str(), "images"], Some(token))?
            .multipart(form);
        let response: UpdateResponse = self.send_json(request).await?;
        Ok((response.data, response.message))
    }

    /// Delete a product.
    ///
    /// Succeeds on `204` or a body with `success: true`; any other 2xx body
    /// is treated as a refusal.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["products", id.as_str()], Some(token))?;
        match self.send_optional_json(request).await? {
            None => Ok(()),
            Some(body) if body.get("success").and_then(serde_json::Value::as_bool) == Some(true) => {
                Ok(())
            }
            Some(body) => Err(ApiError::Api {
                status: 200,
                message: body
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned),
            }),
        }
    }
}
