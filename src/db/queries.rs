use super::models::*;
use crate::db::Database;
use anyhow::Result;
use sqlx::{query, query_as};

// User queries
pub async fn get_user_by_id(db: &Database, user_id: u64) -> Result<Option<User>> {
    let user = query_as::<_, User>(
        "SELECT user_id, email, name, password_hash, role, created_at
         FROM users
         WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(db.as_ref())
    .await?;

    Ok(user)
}

pub async fn get_user_by_email(db: &Database, email: &str) -> Result<Option<User>> {
    let user = query_as::<_, User>(
        "SELECT user_id, email, name, password_hash, role, created_at
         FROM users
         WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db.as_ref())
    .await?;

    Ok(user)
}

pub async fn list_users(db: &Database) -> Result<Vec<User>> {
    let users = query_as::<_, User>(
        "SELECT user_id, email, name, password_hash, role, created_at
         FROM users
         ORDER BY user_id",
    )
    .fetch_all(db.as_ref())
    .await?;

    Ok(users)
}

pub async fn create_user(
    db: &Database,
    email: &str,
    name: Option<&str>,
    password_hash: &str,
) -> Result<User> {
    let result = query("INSERT INTO users (email, name, password_hash) VALUES (?, ?, ?)")
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .execute(db.as_ref())
        .await?;

    get_user_by_id(db, result.last_insert_id())
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", result.last_insert_id()))
}

// Absent fields keep their stored value
pub async fn update_user_profile(
    db: &Database,
    user_id: u64,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<Option<User>> {
    query(
        "UPDATE users
         SET name = COALESCE(?, name), email = COALESCE(?, email)
         WHERE user_id = ?",
    )
    .bind(name)
    .bind(email)
    .bind(user_id)
    .execute(db.as_ref())
    .await?;

    get_user_by_id(db, user_id).await
}

// Category queries
pub async fn list_categories(db: &Database) -> Result<Vec<Category>> {
    let categories = query_as::<_, Category>(
        "SELECT category_id, name, description FROM categories ORDER BY name",
    )
    .fetch_all(db.as_ref())
    .await?;

    Ok(categories)
}

pub async fn create_category(
    db: &Database,
    name: &str,
    description: Option<&str>,
) -> Result<Category> {
    let result = query("INSERT INTO categories (name, description) VALUES (?, ?)")
        .bind(name)
        .bind(description)
        .execute(db.as_ref())
        .await?;

    Ok(Category {
        category_id: result.last_insert_id(),
        name: name.to_string(),
        description: description.map(String::from),
    })
}

// Order history queries (the write path lives in crate::orders)
pub async fn get_order(db: &Database, order_id: u64) -> Result<Option<OrderDetails>> {
    let order = query_as::<_, Order>(
        "SELECT order_id, user_id, total_price, date AS created_at
         FROM orders
         WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(db.as_ref())
    .await?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items = get_order_items(db, order.order_id).await?;
    Ok(Some(OrderDetails::from_parts(order, items)))
}

pub async fn get_order_items(db: &Database, order_id: u64) -> Result<Vec<OrderLineItem>> {
    let items = query_as::<_, OrderLineItem>(
        "SELECT order_id, product_id, quantity, price_at_order
         FROM orders_products
         WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_all(db.as_ref())
    .await?;

    Ok(items)
}

pub async fn list_orders_for_user(db: &Database, user_id: u64) -> Result<Vec<OrderDetails>> {
    let orders = query_as::<_, Order>(
        "SELECT order_id, user_id, total_price, date AS created_at
         FROM orders
         WHERE user_id = ?
         ORDER BY date DESC, order_id DESC",
    )
    .bind(user_id)
    .fetch_all(db.as_ref())
    .await?;

    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        let items = get_order_items(db, order.order_id).await?;
        details.push(OrderDetails::from_parts(order, items));
    }

    Ok(details)
}

// [business] Lets handlers map duplicate emails / category names to 409
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
