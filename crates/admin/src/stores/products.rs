//! Product catalog store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storedesk_core::validation::validate_image_selection;
use storedesk_core::{NewProduct, Product, ProductId, ProductUpdate};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{InFlight, SessionKey, StoreError, build_cache};
use crate::api::{ApiClient, Upload};

/// Cached product lists, one per session.
#[derive(Clone)]
pub struct ProductStore {
    api: ApiClient,
    cache: Cache<SessionKey, Arc<Vec<Product>>>,
    in_flight: InFlight,
    write: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductStore")
            .field("cached_sessions", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ProductStore {
    pub(super) fn new(api: ApiClient, ttl: Duration, in_flight: InFlight) -> Self {
        Self {
            api,
            cache: build_cache(ttl),
            in_flight,
            write: Arc::new(Mutex::new(())),
        }
    }

    /// All products, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails.
    pub async fn all(&self, token: &str) -> Result<Arc<Vec<Product>>, StoreError> {
        let key = SessionKey::from_token(token);
        if let Some(products) = self.cache.get(&key).await {
            return Ok(products);
        }
        self.fetch(token, key).await
    }

    /// Re-fetch the list, replacing the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails; the old copy is kept.
    pub async fn refresh(&self, token: &str) -> Result<Arc<Vec<Product>>, StoreError> {
        self.fetch(token, SessionKey::from_token(token)).await
    }

    async fn fetch(&self, token: &str, key: SessionKey) -> Result<Arc<Vec<Product>>, StoreError> {
        let products = Arc::new(self.api.list_products(token).await?);
        self.cache.insert(key, Arc::clone(&products)).await;
        Ok(products)
    }

    /// A single product from the list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no product has this id.
    pub async fn find(&self, token: &str, id: &ProductId) -> Result<Product, StoreError> {
        self.all(token)
            .await?
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Product".to_string()))
    }

    /// Create a product, then re-fetch the list so it includes the new one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` while another create runs for this
    /// session, or `StoreError::Api` if the API rejects the product.
    #[instrument(skip_all, fields(name = %product.name))]
    pub async fn create(
        &self,
        token: &str,
        product: &NewProduct,
        images: Vec<Upload>,
    ) -> Result<(), StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, "product:new".to_string())?;

        self.api.create_product(token, product, images).await?;
        tracing::info!("Product created");

        if let Err(e) = self.fetch(token, key.clone()).await {
            tracing::warn!(error = %e, "Product list refresh after create failed");
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }

    /// Update a product's fields and merge the API's answer into the cache.
    ///
    /// Returns the merged product and the API's message, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound`, `Busy`, or `Api`.
    #[instrument(skip(self, token, update), fields(product_id = %id))]
    pub async fn update(
        &self,
        token: &str,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<(Product, Option<String>), StoreError> {
        let key = SessionKey::from_token(token);
        let mut product = self.find(token, id).await?;
        let _guard = self.in_flight.acquire(&key, format!("product:{id}"))?;

        let (patch, message) = self.api.update_product(token, id, update).await?;
        product.apply(patch);
        self.replace(&key, &product).await;
        tracing::info!("Product updated");
        Ok((product, message))
    }

    /// Replace a product's images with `existing` plus `uploads`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` when the set would be empty or
    /// exceed six images, otherwise `NotFound`, `Busy`, or `Api`.
    #[instrument(skip(self, token, existing, uploads), fields(product_id = %id))]
    pub async fn update_images(
        &self,
        token: &str,
        id: &ProductId,
        existing: &[String],
        uploads: Vec<Upload>,
    ) -> Result<(Product, Option<String>), StoreError> {
        validate_image_selection(existing.len(), uploads.len()).map_err(StoreError::Validation)?;

        let key = SessionKey::from_token(token);
        let mut product = self.find(token, id).await?;
        let _guard = self.in_flight.acquire(&key, format!("product:{id}"))?;

        let (patch, message) = self
            .api
            .update_product_images(token, id, existing, uploads)
            .await?;
        product.apply(patch);
        self.replace(&key, &product).await;
        tracing::info!(images = product.images.len(), "Product images updated");
        Ok((product, message))
    }

    /// Delete a product and drop it from the cache.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`; the cache keeps the product on
    /// failure.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete(&self, token: &str, id: &ProductId) -> Result<(), StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, format!("product:{id}"))?;

        self.api.delete_product(token, id).await?;

        let _write = self.write.lock().await;
        if let Some(current) = self.cache.get(&key).await {
            let remaining: Vec<Product> = current.iter().filter(|p| &p.id != id).cloned().collect();
            self.cache.insert(key, Arc::new(remaining)).await;
        }
        tracing::info!("Product deleted");
        Ok(())
    }

    /// Whether a mutation of this product is running for the session.
    #[must_use]
    pub fn is_busy(&self, token: &str, id: &ProductId) -> bool {
        self.in_flight
            .is_busy(&SessionKey::from_token(token), &format!("product:{id}"))
    }

    /// Forget this session's cached list.
    pub async fn invalidate(&self, token: &str) {
        self.cache.invalidate(&SessionKey::from_token(token)).await;
    }

    async fn replace(&self, key: &SessionKey, product: &Product) {
        let _write = self.write.lock().await;
        if let Some(current) = self.cache.get(key).await {
            let updated: Vec<Product> = current
                .iter()
                .map(|p| if p.id == product.id { product.clone() } else { p.clone() })
                .collect();
            self.cache.insert(key.clone(), Arc::new(updated)).await;
        }
    }
}
