//! Orders REST API client
//!
//! Thin client for the order endpoints. Every request carries the API key;
//! authenticated endpoints additionally carry a bearer token (a guest
//! registration JWT for user surfaces, a managed-identity session token
//! for admin surfaces).

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use barkeep_core::{BarkeepError, Order, OrderStatus, OrdersMetadata};

/// Admin order queue snapshot, orders plus counters
#[derive(Debug, Clone, Deserialize)]
pub struct AdminOrders {
    #[serde(rename = "data")]
    pub orders: Vec<Order>,
    pub metadata: OrdersMetadata,
}

/// Payload envelope the API wraps single resources in
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

/// Orders API client
#[derive(Debug, Clone)]
pub struct OrdersApi {
    client: Client,
    base_url: String,
    api_key: String,
    bearer_token: Option<String>,
}

impl OrdersApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bearer_token: None,
        }
    }

    /// Attach the bearer token used for authenticated endpoints
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header("x-api-key", &self.api_key);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<T, BarkeepError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BarkeepError::network(format!("Failed to fetch {}: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BarkeepError::api(format!(
                "Orders API error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BarkeepError::parse(format!("Failed to parse {} response: {}", what, e)))
    }

    /// Place a new order for the current user session
    pub async fn create_order(
        &self,
        drink_id: &str,
        user_session_id: &str,
    ) -> Result<Order, BarkeepError> {
        debug!("creating order for drink {}", drink_id);
        let body = serde_json::json!({
            "drink_id": drink_id,
            "user_session_id": user_session_id,
        });
        let response: ApiResponse<Order> = self
            .send(self.request(Method::POST, "/orders").json(&body), "order")
            .await?;
        Ok(response.data)
    }

    /// Fetch a single order by id
    pub async fn order(&self, id: &str) -> Result<Order, BarkeepError> {
        let response: ApiResponse<Order> = self
            .send(self.request(Method::GET, &format!("/orders/{}", id)), "order")
            .await?;
        Ok(response.data)
    }

    /// Fetch the current user's orders
    pub async fn my_orders(&self, include_completed: bool) -> Result<Vec<Order>, BarkeepError> {
        let path = if include_completed {
            "/orders?include_completed=true"
        } else {
            "/orders"
        };
        debug!("fetching user orders from {}", path);
        let response: ApiResponse<Vec<Order>> =
            self.send(self.request(Method::GET, path), "orders").await?;
        Ok(response.data)
    }

    /// Fetch the admin order queue with its counters
    pub async fn admin_orders(&self) -> Result<AdminOrders, BarkeepError> {
        debug!("fetching admin order queue");
        self.send(self.request(Method::GET, "/admin/orders"), "admin orders")
            .await
    }

    /// Move an order to a new status (admin only)
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, BarkeepError> {
        debug!("updating order {} to {}", id, status);
        let body = serde_json::json!({ "status": status });
        let response: ApiResponse<Order> = self
            .send(
                self.request(Method::PUT, &format!("/admin/orders/{}", id))
                    .json(&body),
                "order status",
            )
            .await?;
        Ok(response.data)
    }
}
