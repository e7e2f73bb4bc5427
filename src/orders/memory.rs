//! In-process order store with the same transactional contract as the
//! MySQL one. Rows written inside a transaction only become visible on
//! commit. Used as the injected store in tests; failures can be scripted
//! to exercise rollback paths.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::store::{NewLineItem, NewOrder, OrderConnection, OrderStore, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub order_id: u64,
    pub order: NewOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredLineItem {
    pub order_id: u64,
    pub item: NewLineItem,
}

#[derive(Debug, Default)]
struct State {
    last_order_id: u64,
    orders: Vec<StoredOrder>,
    line_items: Vec<StoredLineItem>,
    checked_out: usize,
    commits: usize,
    rollbacks: usize,
    unavailable: bool,
    fail_line_item_at: Option<usize>,
    fail_commit: bool,
    unknown_products: HashSet<u64>,
}

#[derive(Debug, Clone)]
pub struct InMemoryOrderStore {
    state: Arc<Mutex<State>>,
    permits: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl InMemoryOrderStore {
    pub fn new(max_connections: usize, acquire_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            permits: Arc::new(Semaphore::new(max_connections)),
            acquire_timeout,
        }
    }

    /// Every acquire fails as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Fail the `n`th (1-based) line-item insert of every transaction.
    pub fn fail_line_item_at(&self, n: usize) {
        self.state.lock().fail_line_item_at = Some(n);
    }

    pub fn fail_commit(&self) {
        self.state.lock().fail_commit = true;
    }

    /// Line items referencing this product fail like a foreign key violation.
    pub fn reject_product(&self, product_id: u64) {
        self.state.lock().unknown_products.insert(product_id);
    }

    pub fn orders(&self) -> Vec<StoredOrder> {
        self.state.lock().orders.clone()
    }

    pub fn line_items(&self) -> Vec<StoredLineItem> {
        self.state.lock().line_items.clone()
    }

    pub fn checked_out(&self) -> usize {
        self.state.lock().checked_out
    }

    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().rollbacks
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(5))
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn acquire(&self) -> Result<Box<dyn OrderConnection>, StoreError> {
        if self.state.lock().unavailable {
            return Err(StoreError::Database("connection refused".to_string()));
        }

        let permit = tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| StoreError::PoolExhausted)?
            .map_err(|_| StoreError::Database("pool closed".to_string()))?;

        self.state.lock().checked_out += 1;

        Ok(Box::new(InMemoryConnection {
            state: self.state.clone(),
            _permit: permit,
            pending: None,
        }))
    }
}

#[derive(Debug, Default)]
struct Pending {
    orders: Vec<StoredOrder>,
    line_items: Vec<StoredLineItem>,
    line_item_inserts: usize,
}

struct InMemoryConnection {
    state: Arc<Mutex<State>>,
    _permit: OwnedSemaphorePermit,
    pending: Option<Pending>,
}

#[async_trait]
impl OrderConnection for InMemoryConnection {
    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.pending.is_some() {
            return Err(StoreError::Database(
                "transaction already in progress".to_string(),
            ));
        }
        self.pending = Some(Pending::default());
        Ok(())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<u64, StoreError> {
        let mut state = self.state.lock();
        // [business] ids are consumed even if the transaction later rolls back
        state.last_order_id += 1;
        let stored = StoredOrder {
            order_id: state.last_order_id,
            order: order.clone(),
        };

        match self.pending.as_mut() {
            Some(pending) => pending.orders.push(stored.clone()),
            None => state.orders.push(stored.clone()),
        }

        Ok(stored.order_id)
    }

    async fn insert_line_item(
        &mut self,
        order_id: u64,
        item: &NewLineItem,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();

        if state.unknown_products.contains(&item.product_id) {
            return Err(StoreError::Database(format!(
                "Cannot add or update a child row: a foreign key constraint fails (product_id {})",
                item.product_id
            )));
        }

        let stored = StoredLineItem {
            order_id,
            item: item.clone(),
        };

        match self.pending.as_mut() {
            Some(pending) => {
                pending.line_item_inserts += 1;
                if state.fail_line_item_at == Some(pending.line_item_inserts) {
                    return Err(StoreError::Database(format!(
                        "simulated failure on line item {}",
                        pending.line_item_inserts
                    )));
                }
                pending.line_items.push(stored);
            }
            None => state.line_items.push(stored),
        }

        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.fail_commit {
            return Err(StoreError::Database("simulated commit failure".to_string()));
        }

        let pending = self
            .pending
            .take()
            .ok_or_else(|| StoreError::Database("no transaction in progress".to_string()))?;

        state.orders.extend(pending.orders);
        state.line_items.extend(pending.line_items);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.pending = None;
        self.state.lock().rollbacks += 1;
        Ok(())
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        // Uncommitted work is discarded, same as a closed server session
        self.pending = None;
        self.state.lock().checked_out -= 1;
    }
}
