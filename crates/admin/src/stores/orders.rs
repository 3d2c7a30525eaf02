//! Order store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storedesk_core::{DeliveryStatus, NewOrder, Order, OrderId, PaymentStatus};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{InFlight, SessionKey, StoreError, build_cache};
use crate::api::ApiClient;

/// Cached order lists, one per session.
#[derive(Clone)]
pub struct OrderStore {
    api: ApiClient,
    cache: Cache<SessionKey, Arc<Vec<Order>>>,
    in_flight: InFlight,
    write: Arc<Mutex<()>>,
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("cached_sessions", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl OrderStore {
    pub(super) fn new(api: ApiClient, ttl: Duration, in_flight: InFlight) -> Self {
        Self {
            api,
            cache: build_cache(ttl),
            in_flight,
            write: Arc::new(Mutex::new(())),
        }
    }

    /// All orders, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails.
    pub async fn all(&self, token: &str) -> Result<Arc<Vec<Order>>, StoreError> {
        let key = SessionKey::from_token(token);
        if let Some(orders) = self.cache.get(&key).await {
            return Ok(orders);
        }
        self.refresh(token).await
    }

    /// Re-fetch the list, replacing the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails; the old copy is kept.
    pub async fn refresh(&self, token: &str) -> Result<Arc<Vec<Order>>, StoreError> {
        let orders = Arc::new(self.api.list_orders(token).await?);
        self.cache
            .insert(SessionKey::from_token(token), Arc::clone(&orders))
            .await;
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no order has this id.
    pub async fn find(&self, token: &str, id: &OrderId) -> Result<Order, StoreError> {
        self.all(token)
            .await?
            .iter()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Order".to_string()))
    }

    /// Create an order and put it at the top of the cached list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`.
    #[instrument(skip_all, fields(items = order.items.len()))]
    pub async fn create(&self, token: &str, order: &NewOrder) -> Result<Order, StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, "order:new".to_string())?;

        let created = self.api.create_order(token, order).await?;
        tracing::info!(order_id = %created.id, "Order created");

        let _write = self.write.lock().await;
        if let Some(current) = self.cache.get(&key).await {
            let mut orders = Vec::with_capacity(current.len() + 1);
            orders.push(created.clone());
            orders.extend(current.iter().filter(|o| o.id != created.id).cloned());
            self.cache.insert(key, Arc::new(orders)).await;
        }
        Ok(created)
    }

    /// Set the delivery status and patch only that field in the cache.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn set_delivery_status(
        &self,
        token: &str,
        id: &OrderId,
        status: DeliveryStatus,
    ) -> Result<DeliveryStatus, StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, format!("order:{id}"))?;

        let stored = self.api.update_delivery_status(token, id, status).await?;
        self.patch(&key, id, |order| order.delivery_status = stored)
            .await;
        tracing::info!(status = %stored, "Delivery status updated");
        Ok(stored)
    }

    /// Set the payment status and patch only that field in the cache.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn set_payment_status(
        &self,
        token: &str,
        id: &OrderId,
        status: PaymentStatus,
    ) -> Result<PaymentStatus, StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, format!("order:{id}"))?;

        let stored = self.api.update_payment_status(token, id, status).await?;
        self.patch(&key, id, |order| order.payment_status = Some(stored))
            .await;
        tracing::info!(status = %stored, "Payment status updated");
        Ok(stored)
    }

    /// Delete an order and drop it from the cache.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn delete(&self, token: &str, id: &OrderId) -> Result<(), StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, format!("order:{id}"))?;

        self.api.delete_order(token, id).await?;

        let _write = self.write.lock().await;
        if let Some(current) = self.cache.get(&key).await {
            let remaining: Vec<Order> = current.iter().filter(|o| &o.id != id).cloned().collect();
            self.cache.insert(key, Arc::new(remaining)).await;
        }
        tracing::info!("Order deleted");
        Ok(())
    }

    #[must_use]
    pub fn is_busy(&self, token: &str, id: &OrderId) -> bool {
        self.in_flight
            .is_busy(&SessionKey::from_token(token), &format!("order:{id}"))
    }

    /// Forget this session's cached list.
    pub async fn invalidate(&self, token: &str) {
        self.cache.invalidate(&SessionKey::from_token(token)).await;
    }

    async fn patch(&self, key: &SessionKey, id: &OrderId, apply: impl Fn(&mut Order)) {
        let _write = self.write.lock().await;
        if let Some(current) = self.cache.get(key).await {
            let updated: Vec<Order> = current
                .iter()
                .cloned()
                .map(|mut order| {
                    if &order.id == id {
                        apply(&mut order);
                    }
                    order
                })
                .collect();
            self.cache.insert(key.clone(), Arc::new(updated)).await;
        }
    }
}
