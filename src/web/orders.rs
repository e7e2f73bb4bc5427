use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{api_error, internal_error, ApiError, ApiPath, AuthUser};
use crate::{
    db::{models::*, queries, Database},
    orders::{OrderError, OrderService, PlaceOrderRequest, MISSING_ORDER_INFO},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub message: String,
    #[serde(rename = "orderId")]
    pub order_id: u64,
}

/// POST /api/orders - place an order atomically
pub async fn place_order_handler(
    State(orders): State<OrderService>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderPlaced>), ApiError> {
    // An unreadable body is treated like one with nothing in it
    let Json(request) = payload.map_err(|rejection| {
        warn!("Unreadable order payload: {}", rejection);
        (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::new(MISSING_ORDER_INFO).with_details(rejection.body_text())),
        )
    })?;

    if let Some(owner) = request.user_id {
        if !user.can_access(owner) {
            warn!(
                caller = user.user_id,
                owner, "Order placed on behalf of another user"
            );
        }
    }

    match orders.place_order(&request).await {
        Ok(order_id) => {
            info!(order_id, caller = user.user_id, "Order placed");
            Ok((
                StatusCode::CREATED,
                Json(OrderPlaced {
                    message: "Order placed successfully".to_string(),
                    order_id,
                }),
            ))
        }
        Err(OrderError::Validation(message)) => Err(api_error(StatusCode::BAD_REQUEST, message)),
        Err(OrderError::Database(e)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiMessage::new("Database error").with_details(e.to_string())),
        )),
    }
}

/// GET /api/orders/:id - order with line items; owner or admin
pub async fn get_order_handler(
    State(db): State<Database>,
    Extension(user): Extension<AuthUser>,
    ApiPath(order_id): ApiPath<u64>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order = queries::get_order(&db, order_id)
        .await
        .map_err(|e| internal_error("Database error loading order", e))?;

    // [security] Someone else's order answers exactly like a missing one
    match order {
        Some(order) if user.can_access(order.user_id) => Ok(Json(order)),
        Some(order) => {
            warn!(
                caller = user.user_id,
                owner = order.user_id,
                order_id,
                "Order lookup by a non-owner"
            );
            Err(order_not_found())
        }
        None => Err(order_not_found()),
    }
}

fn order_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Order not found.")
}
