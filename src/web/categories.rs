use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::{info, warn};

use super::{api_error, internal_error, ApiError, ApiJson};
use crate::db::{models::*, queries, Database};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

/// GET /api/categories - public, ordered by name
pub async fn list_categories_handler(
    State(db): State<Database>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = queries::list_categories(&db)
        .await
        .map_err(|e| internal_error("Database error listing categories", e))?;

    Ok(Json(categories))
}

/// POST /api/categories - admin only
pub async fn create_category_handler(
    State(db): State<Database>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Category name is required."));
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let category = queries::create_category(&db, name, description)
        .await
        .map_err(|e| {
            if queries::is_unique_violation(&e) {
                warn!("Duplicate category name: {}", name);
                api_error(StatusCode::CONFLICT, "Category already exists.")
            } else {
                internal_error("Database error creating category", e)
            }
        })?;

    info!("Category created: {}", category.category_id);
    Ok((StatusCode::CREATED, Json(category)))
}
