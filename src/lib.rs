//! Storefront backend: order placement, user profiles, categories and
//! bearer-token authentication over a pooled MySQL connection.

pub mod config; // Configuration management and environment variable handling
pub mod db; // Database models, queries, and connection pooling
pub mod orders; // Transactional order placement over an injected store
pub mod security; // Access tokens and password hashing
pub mod web; // HTTP routing, middleware and handlers
