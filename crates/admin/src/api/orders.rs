//! Order endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use storedesk_core::{DeliveryStatus, NewOrder, Order, OrderId, PaymentStatus};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Deserialize)]
struct OrderList {
    #[serde(default)]
    orders: Vec<Order>,
}

/// `POST /orders` answers with the order under `data` or `order`.
#[derive(Deserialize)]
struct CreatedOrder {
    #[serde(alias = "order")]
    data: Order,
}

#[derive(Serialize)]
struct StatusBody<S> {
    status: S,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryResponse {
    delivery_status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentResponse {
    payment_status: String,
}

impl ApiClient {
    /// Fetch every order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, &["orders"], Some(token))?;
        let list: OrderList = self.send_json(request).await?;
        tracing::debug!(count = list.orders.len(), "Fetched orders");
        Ok(list.orders)
    }

    /// Create an order on behalf of a customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token, order), fields(items = order.items.len(), total = %order.total_amount))]
    pub async fn create_order(&self, token: &str, order: &NewOrder) -> Result<Order, ApiError> {
        let request = self
            .request(Method::POST, &["orders"], Some(token))?
            .json(order);
        let created: CreatedOrder = self.send_json(request).await?;
        Ok(created.data)
    }

    /// Set an order's delivery status. Returns the status the API stored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure, or `Parse` if the API
    /// echoes an unknown status.
    #[instrument(skip(self, token, status), fields(order_id = %id, status = %status))]
    pub async fn update_delivery_status(
        &self,
        token: &str,
        id: &OrderId,
        status: DeliveryStatus,
    ) -> Result<DeliveryStatus, ApiError> {
        let request = self
            .request(Method::PATCH, &["orders", id.as_str(), "delivery"], Some(token))?
            .json(&StatusBody { status });
        let response: DeliveryResponse = self.send_json(request).await?;
        response
            .delivery_status
            .parse()
            .map_err(ApiError::Parse)
    }

    /// Set an order's payment status. Returns the status the API stored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure, or `Parse` if the API
    /// echoes an unknown status.
    #[instrument(skip(self, token, status), fields(order_id = %id, status = %status))]
    pub async fn update_payment_status(
        &self,
        token: &str,
        id: &OrderId,
        status: PaymentStatus,
    ) -> Result<PaymentStatus, ApiError> {
        let request = self
            .request(Method::PATCH, &["orders", id.as_str(), "payment"], Some(token))?
            .json(&StatusBody { status });
        let response: PaymentResponse = self.send_json(request).await?;
        response
            .payment_status
            .parse()
            .map_err(ApiError::Parse)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn delete_order(&self, token: &str, id: &OrderId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["orders", id.as_str()], Some(token))?;
        self.send_optional_json(request).await?;
        Ok(())
    }
}
