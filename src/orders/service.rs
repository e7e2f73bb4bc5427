use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::store::{NewLineItem, NewOrder, OrderConnection, OrderStore, StoreError};

pub const MISSING_ORDER_INFO: &str = "Missing required order information.";
pub const NEGATIVE_ORDER_TOTAL: &str = "Order total cannot be negative.";
pub const INVALID_ORDER_ITEM: &str =
    "Each order item needs a product, a positive quantity and a non-negative price.";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("database error: {0}")]
    Database(#[from] StoreError),
}

// [business] Checkout payload as posted by the storefront - every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: Option<u64>,
    pub total_amount: Option<Decimal>,
    pub items: Option<Vec<OrderItemRequest>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Option<u64>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
}

/// A request that passed validation: a header plus at least one line item.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub header: NewOrder,
    pub items: Vec<NewLineItem>,
}

impl PlaceOrderRequest {
    /// Pure check, no I/O. A zero total counts as missing; a negative one
    /// gets its own message.
    pub fn validate(&self) -> Result<ValidatedOrder, OrderError> {
        let user_id = self
            .user_id
            .ok_or(OrderError::Validation(MISSING_ORDER_INFO))?;

        let total_price = match self.total_amount {
            Some(total) if total > Decimal::ZERO => total,
            Some(total) if total < Decimal::ZERO => {
                return Err(OrderError::Validation(NEGATIVE_ORDER_TOTAL))
            }
            _ => return Err(OrderError::Validation(MISSING_ORDER_INFO)),
        };

        let items = match self.items.as_deref() {
            Some(items) if !items.is_empty() => items,
            _ => return Err(OrderError::Validation(MISSING_ORDER_INFO)),
        };

        let items = items
            .iter()
            .map(OrderItemRequest::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedOrder {
            header: NewOrder {
                user_id,
                total_price,
            },
            items,
        })
    }
}

impl OrderItemRequest {
    fn validate(&self) -> Result<NewLineItem, OrderError> {
        let product_id = self.product_id.ok_or(OrderError::Validation(INVALID_ORDER_ITEM))?;
        let quantity = self
            .quantity
            .filter(|q| *q > 0)
            .and_then(|q| u32::try_from(q).ok())
            .ok_or(OrderError::Validation(INVALID_ORDER_ITEM))?;
        let price_at_order = match self.price {
            Some(price) if price >= Decimal::ZERO => price,
            _ => return Err(OrderError::Validation(INVALID_ORDER_ITEM)),
        };

        Ok(NewLineItem {
            product_id,
            quantity,
            price_at_order,
        })
    }
}

/// Places orders through an injected [`OrderStore`].
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Validates, then writes the header and every line item in one
    /// transaction. Returns the generated order id. Any failure after
    /// `begin` rolls back before the error is returned; the connection is
    /// released when it goes out of scope on every path.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> Result<u64, OrderError> {
        let order = request.validate().map_err(|e| {
            warn!("Rejected order request: {}", e);
            e
        })?;

        info!(
            user_id = order.header.user_id,
            items = order.items.len(),
            "Placing order"
        );

        let mut conn = self.store.acquire().await.map_err(|e| {
            error!("Failed to acquire database connection: {}", e);
            e
        })?;

        conn.begin().await.map_err(|e| {
            error!("Failed to begin order transaction: {}", e);
            e
        })?;

        let order_id = match write_order(conn.as_mut(), &order).await {
            Ok(order_id) => order_id,
            Err(e) => {
                error!("Order insert failed, rolling back: {}", e);
                rollback(conn.as_mut()).await;
                return Err(e.into());
            }
        };

        if let Err(e) = conn.commit().await {
            error!("Order commit failed, rolling back: {}", e);
            rollback(conn.as_mut()).await;
            return Err(e.into());
        }

        info!(order_id, "Order committed");
        Ok(order_id)
    }
}

// Statements run strictly in sequence on the one transactional handle
async fn write_order(
    conn: &mut dyn OrderConnection,
    order: &ValidatedOrder,
) -> Result<u64, StoreError> {
    let order_id = conn.insert_order(&order.header).await?;

    for item in &order.items {
        conn.insert_line_item(order_id, item).await?;
    }

    Ok(order_id)
}

async fn rollback(conn: &mut dyn OrderConnection) {
    // The caller reports the insert or commit error; a rollback failure is only logged
    if let Err(e) = conn.rollback().await {
        error!("Rollback failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::memory::InMemoryOrderStore;
    use std::time::Duration;

    fn item(product_id: u64, quantity: i64, price: Decimal) -> OrderItemRequest {
        OrderItemRequest {
            product_id: Some(product_id),
            quantity: Some(quantity),
            price: Some(price),
        }
    }

    fn request(items: Vec<OrderItemRequest>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: Some(7),
            total_amount: Some(Decimal::new(4998, 2)),
            items: Some(items),
        }
    }

    fn service(store: &InMemoryOrderStore) -> OrderService {
        OrderService::new(Arc::new(store.clone()))
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let valid = request(vec![item(3, 2, Decimal::new(2499, 2))]);
        assert!(valid.validate().is_ok());

        let mut missing_user = valid.clone();
        missing_user.user_id = None;

        let mut missing_total = valid.clone();
        missing_total.total_amount = None;

        let mut zero_total = valid.clone();
        zero_total.total_amount = Some(Decimal::ZERO);

        let mut missing_items = valid.clone();
        missing_items.items = None;

        let empty_items = request(vec![]);

        for bad in [
            missing_user,
            missing_total,
            zero_total,
            missing_items,
            empty_items,
        ] {
            match bad.validate() {
                Err(OrderError::Validation(message)) => assert_eq!(message, MISSING_ORDER_INFO),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_negative_total_is_not_reported_as_missing() {
        let mut negative = request(vec![item(3, 2, Decimal::new(2499, 2))]);
        negative.total_amount = Some(Decimal::new(-500, 2));

        match negative.validate() {
            Err(OrderError::Validation(message)) => assert_eq!(message, NEGATIVE_ORDER_TOTAL),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_items() {
        for bad in [
            item(3, 0, Decimal::ONE),
            item(3, -1, Decimal::ONE),
            item(3, i64::MAX, Decimal::ONE),
            item(3, 1, Decimal::NEGATIVE_ONE),
            OrderItemRequest {
                product_id: None,
                quantity: Some(1),
                price: Some(Decimal::ONE),
            },
            OrderItemRequest {
                product_id: Some(3),
                quantity: Some(1),
                price: None,
            },
        ] {
            match request(vec![bad]).validate() {
                Err(OrderError::Validation(message)) => assert_eq!(message, INVALID_ORDER_ITEM),
                other => panic!("expected item validation error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_validation_failure_never_acquires() {
        let store = InMemoryOrderStore::default();
        store.set_unavailable(true);

        let err = service(&store)
            .place_order(&request(vec![]))
            .await
            .unwrap_err();

        // Unavailable store would have produced a database error
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_place_order_writes_header_and_items() {
        let store = InMemoryOrderStore::default();
        let order_id = service(&store)
            .place_order(&request(vec![
                item(3, 2, Decimal::new(2499, 2)),
                item(4, 1, Decimal::new(100, 2)),
            ]))
            .await
            .unwrap();

        let orders = store.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, order_id);
        assert_eq!(orders[0].order.user_id, 7);
        assert_eq!(orders[0].order.total_price, Decimal::new(4998, 2));

        let items = store.line_items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.order_id == order_id));
        assert_eq!(items[0].item.product_id, 3);
        assert_eq!(items[1].item.product_id, 4);
        assert_eq!(store.commits(), 1);
        assert_eq!(store.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_second_item_failure_rolls_back_everything() {
        let store = InMemoryOrderStore::default();
        store.fail_line_item_at(2);

        let err = service(&store)
            .place_order(&request(vec![
                item(3, 2, Decimal::new(2499, 2)),
                item(4, 1, Decimal::new(100, 2)),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Database(StoreError::Database(_))));
        assert!(store.orders().is_empty());
        assert!(store.line_items().is_empty());
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let store = InMemoryOrderStore::default();
        store.fail_commit();

        let err = service(&store)
            .place_order(&request(vec![item(3, 2, Decimal::new(2499, 2))]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Database(_)));
        assert!(store.orders().is_empty());
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_pool_exhaustion_is_a_database_error() {
        let store = InMemoryOrderStore::new(1, Duration::from_millis(20));
        let held = store.acquire().await.unwrap();

        let err = service(&store)
            .place_order(&request(vec![item(3, 2, Decimal::new(2499, 2))]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Database(StoreError::PoolExhausted)));

        drop(held);
        assert_eq!(store.checked_out(), 0);
        assert!(store.orders().is_empty());
    }
}
