use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use gearstore_domain::review::{validate_review, ReviewStatistics};

use crate::error::ApiError;
use crate::models::{CreateReviewRequest, ReviewRow};
use crate::AppState;

/// `GET /api/reviews/producto/:productoId` — reviews for a product, newest
/// first.
pub async fn list_by_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewRow>>, ApiError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
    )
    .bind(product_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// `GET /api/reviews/producto/:productoId/estadisticas` — count, mean and
/// per-star distribution, computed on read and memoized until the next
/// review lands for the product.
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ReviewStatistics>, ApiError> {
    let stats = state
        .stats_cache
        .try_get_with(product_id, async {
            let ratings: Vec<i16> =
                sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
                    .bind(product_id)
                    .fetch_all(&state.db)
                    .await?;
            Ok::<_, sqlx::Error>(ReviewStatistics::from_ratings(&ratings))
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(stats))
}

/// `POST /api/reviews` — bounds-checked creation; invalidates the cached
/// statistics for the product.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Response, ApiError> {
    validate_review(payload.rating, &payload.comment)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if payload.autor.trim().is_empty() {
        return Err(ApiError::Validation("autor is required".to_string()));
    }

    let row = sqlx::query_as::<_, ReviewRow>(
        "INSERT INTO reviews (id, product_id, author, rating, comment) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.product_id)
    .bind(payload.autor.trim())
    .bind(payload.rating)
    .bind(&payload.comment)
    .fetch_one(&state.db)
    .await?;

    state.stats_cache.invalidate(&payload.product_id).await;
    tracing::info!("review {} created for product {}", row.id, row.product_id);

    Ok((StatusCode::CREATED, Json(row)).into_response())
}
