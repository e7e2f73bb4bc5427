use async_trait::async_trait;
use sqlx::{MySql, Transaction};

use super::store::{NewLineItem, NewOrder, OrderConnection, OrderStore, StoreError};
use crate::db::Database;

// [business] Order store backed by the shared MySQL pool
#[derive(Debug, Clone)]
pub struct MySqlOrderStore {
    db: Database,
}

impl MySqlOrderStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for MySqlOrderStore {
    // [library] Pool::begin checks out a connection and opens the transaction on it;
    // an acquire timeout still surfaces as PoolTimedOut
    async fn acquire(&self) -> Result<Box<dyn OrderConnection>, StoreError> {
        let tx = self.db.begin().await?;
        Ok(Box::new(MySqlOrderConnection { tx: Some(tx) }))
    }
}

// Dropping an unfinished `Transaction` rolls it back before the connection is reused
struct MySqlOrderConnection {
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlOrderConnection {
    fn open(&mut self) -> Result<&mut Transaction<'static, MySql>, StoreError> {
        self.tx
            .as_mut()
            .ok_or_else(|| StoreError::Database("order transaction already finished".to_string()))
    }
}

#[async_trait]
impl OrderConnection for MySqlOrderConnection {
    async fn begin(&mut self) -> Result<(), StoreError> {
        self.open().map(|_| ())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<u64, StoreError> {
        let tx = self.open()?;
        let result = sqlx::query("INSERT INTO orders (user_id, total_price) VALUES (?, ?)")
            .bind(order.user_id)
            .bind(order.total_price)
            .execute(&mut **tx)
            .await?;

        Ok(result.last_insert_id())
    }

    async fn insert_line_item(
        &mut self,
        order_id: u64,
        item: &NewLineItem,
    ) -> Result<(), StoreError> {
        let tx = self.open()?;
        sqlx::query(
            "INSERT INTO orders_products (order_id, product_id, quantity, price_at_order)
             VALUES (?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price_at_order)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(StoreError::Database(
                "order transaction already finished".to_string(),
            )),
        }
    }

    // A failed commit has already consumed the transaction; sqlx rolls it back on drop
    async fn rollback(&mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
