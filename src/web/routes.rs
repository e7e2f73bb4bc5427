// [library] Axum web framework routing components
use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    config::Config,
    db::Database,
    orders::OrderService,
    web::{
        create_category_handler, get_order_handler, get_user_handler, list_categories_handler,
        list_user_orders_handler, list_users_handler, login_handler, place_order_handler,
        register_handler, require_admin, require_auth, update_user_handler,
    },
};

// [business] Application state - pool, config and the order service with its injected store
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(db: Database, config: Config, orders: OrderService) -> Self {
        Self { db, config, orders }
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for OrderService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.orders.clone()
    }
}

// [business] Public, authenticated and admin-only route groups merged into one router
pub fn create_app_router(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), require_auth);

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/categories", get(list_categories_handler));

    // [security] Layers run bottom-up: require_auth first, then the handler
    let authenticated = Router::new()
        .route("/api/orders", post(place_order_handler))
        .route("/api/orders/:id", get(get_order_handler))
        .route(
            "/api/users/:id",
            get(get_user_handler).put(update_user_handler),
        )
        .route("/api/users/:id/orders", get(list_user_orders_handler))
        .route_layer(auth.clone());

    // [security] require_admin needs the AuthUser that require_auth inserts
    let admin = Router::new()
        .route("/api/users", get(list_users_handler))
        .route("/api/categories", post(create_category_handler))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(auth);

    public
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check().await;
        assert_eq!(result, "OK");
    }
}
