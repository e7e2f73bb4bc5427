// [library] Serde - JSON serialization for API responses and request bodies
use serde::{Deserialize, Serialize};

// [library] Exact decimal arithmetic for money - maps to MySQL DECIMAL
use rust_decimal::Decimal;

// [library] TIMESTAMP columns decode into timezone-aware OffsetDateTime
use time::OffsetDateTime;

// [business] Authorization role carried in the `role` column and the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    // [security] Unknown role strings never grant admin rights
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            _ => Role::Customer,
        }
    }
}

// [business] User entity - a storefront account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: u64,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String, // [security] Argon2id PHC string - never serialized
    pub role: String,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_db(&self.role)
    }
}

// [business] Public view of a user - what profile endpoints return
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let role = user.role();
        Self {
            id: user.user_id,
            email: user.email,
            name: user.name,
            role,
            created_at: user.created_at,
        }
    }
}

// [business] Product category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Category {
    #[serde(rename = "id")]
    pub category_id: u64,
    pub name: String,
    pub description: Option<String>,
}

// [business] Order header row - one per checkout, never mutated after insert
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub order_id: u64,
    pub user_id: u64,
    pub total_price: Decimal,
    pub created_at: OffsetDateTime,
}

// [business] Line item row - price_at_order is a snapshot taken at purchase time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct OrderLineItem {
    #[serde(skip_serializing, default)]
    pub order_id: u64,
    pub product_id: u64,
    pub quantity: u32,
    pub price_at_order: Decimal,
}

// [business] Order header plus its line items, as returned by the read endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetails {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub user_id: u64,
    pub total_price: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub items: Vec<OrderLineItem>,
}

impl OrderDetails {
    pub fn from_parts(order: Order, items: Vec<OrderLineItem>) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            total_price: order.total_price,
            created_at: order.created_at,
            items,
        }
    }
}

// [business] Uniform JSON body for errors and simple acknowledgements: {message, details?}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiMessage {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiMessage {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            details: None,
        }
    }

    // [rust] Builder-style method for attaching diagnostics
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
