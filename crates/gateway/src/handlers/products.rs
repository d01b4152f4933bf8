use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::ProductRow;
use crate::AppState;

/// `GET /api/products` — the catalog boundary. Rows are seeded by migration
/// and managed by the product service; this surface is read-only.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(rows))
}

/// `GET /api/products/:id`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductRow>, ApiError> {
    sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("product not found".to_string()))
}
