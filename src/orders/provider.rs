use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{Order, OrderStatus};
use crate::shared::AppError;

/// Read-only seam to the purchase/order subsystem. This crate never
/// mutates orders.
#[async_trait]
pub trait OrderProvider: Send + Sync {
    /// All of a guardian's orders, regardless of status
    async fn orders_for_guardian(&self, guardian_id: &str) -> Result<Vec<Order>, AppError>;

    /// Orders filtered to the given statuses, in the provider's stored order
    async fn orders_with_status(
        &self,
        guardian_id: &str,
        statuses: &[OrderStatus],
    ) -> Result<Vec<Order>, AppError> {
        let orders = self.orders_for_guardian(guardian_id).await?;
        Ok(orders
            .into_iter()
            .filter(|o| statuses.contains(&o.status))
            .collect())
    }
}

/// In-memory implementation of OrderProvider for development and testing
#[derive(Default)]
pub struct InMemoryOrderProvider {
    orders: Arc<RwLock<HashMap<String, Vec<Order>>>>,
}

impl InMemoryOrderProvider {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn record_order(&self, guardian_id: &str, order: Order) {
        let mut orders = self.orders.write().await;
        orders.entry(guardian_id.to_string()).or_default().push(order);
    }
}

#[async_trait]
impl OrderProvider for InMemoryOrderProvider {
    async fn orders_for_guardian(&self, guardian_id: &str) -> Result<Vec<Order>, AppError> {
        let orders = self.orders.read().await;
        let guardian_orders = orders.get(guardian_id).cloned().unwrap_or_default();
        debug!(
            guardian_id = %guardian_id,
            order_count = guardian_orders.len(),
            "Fetched guardian orders from memory"
        );
        Ok(guardian_orders)
    }
}
