//! Connection capabilities consumed by the order write path.
//!
//! A store hands out one connection per request. Dropping the boxed
//! connection returns it to the pool, so release happens exactly once on
//! every exit path without the caller having to remember it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("timed out waiting for a pooled database connection")]
    PoolExhausted,
    #[error("{0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Order header as written to `orders`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: u64,
    pub total_price: Decimal,
}

/// One row for `orders_products`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub product_id: u64,
    pub quantity: u32,
    pub price_at_order: Decimal,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Waits for a free connection; fails with [`StoreError::PoolExhausted`]
    /// once the pool's acquire timeout elapses.
    async fn acquire(&self) -> Result<Box<dyn OrderConnection>, StoreError>;
}

/// A checked-out connection. Not shared across tasks; all statements of one
/// order run sequentially on the same handle.
#[async_trait]
pub trait OrderConnection: Send {
    async fn begin(&mut self) -> Result<(), StoreError>;

    /// Inserts the header and returns the generated `order_id`.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<u64, StoreError>;

    async fn insert_line_item(&mut self, order_id: u64, item: &NewLineItem)
        -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        assert_eq!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::PoolExhausted
        );
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
