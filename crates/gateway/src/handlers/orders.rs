use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use gearstore_domain::order::{
    delivery_estimate, redact_payment, OrderStatus, RawOrderPayload, UnknownStatus,
};

use crate::auth::{require_admin, require_session};
use crate::error::ApiError;
use crate::models::{
    CreateOrderResponse, OrderResponse, OrderRow, ProductRow, ResolvedOrderLine,
    UpdateOrderRequest,
};
use crate::AppState;

/// Joins order lines against the catalog. Lines whose product reference no
/// longer resolves keep their snapshot data with `producto: null`.
async fn resolve_orders(
    state: &AppState,
    rows: Vec<OrderRow>,
) -> Result<Vec<OrderResponse>, ApiError> {
    let ids: Vec<Uuid> = rows
        .iter()
        .flat_map(|r| r.lines.0.iter())
        .filter_map(|l| Uuid::parse_str(&l.product_id).ok())
        .collect();

    let by_id: HashMap<Uuid, ProductRow> = if ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&state.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let responses = rows
        .into_iter()
        .map(|row| OrderResponse {
            id: row.id,
            productos: row
                .lines
                .0
                .into_iter()
                .map(|line| {
                    let producto = Uuid::parse_str(&line.product_id)
                        .ok()
                        .and_then(|pid| by_id.get(&pid).cloned());
                    ResolvedOrderLine {
                        product_id: line.product_id,
                        name: line.name,
                        price: line.price,
                        quantity: line.quantity,
                        producto,
                    }
                })
                .collect(),
            personal: row.personal.0,
            payment: row.payment.0,
            montos: row.amounts.0,
            discount_code: row.discount_code,
            estado: row.status,
            purchased_at: row.purchased_at,
            delivery_estimate: row.delivery_estimate,
        })
        .collect();

    Ok(responses)
}

async fn fetch_order(state: &AppState, id: Uuid) -> Result<OrderRow, ApiError> {
    sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))
}

/// `POST /api/orders` — validates the submission, redacts payment data,
/// stamps the purchase timestamp and its seven-day delivery estimate, and
/// persists the order as `pendiente`.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RawOrderPayload>,
) -> Result<Response, ApiError> {
    let claims = require_session(&headers, &state)?;

    let payload = payload
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let payment = redact_payment(payload.payment);

    let purchased_at = Utc::now();
    let estimate = delivery_estimate(purchased_at);
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO orders \
         (id, lines, personal, payment, amounts, discount_code, status, purchased_at, delivery_estimate) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(id)
    .bind(sqlx::types::Json(&payload.lines))
    .bind(sqlx::types::Json(&payload.personal))
    .bind(sqlx::types::Json(&payment))
    .bind(sqlx::types::Json(&payload.amounts))
    .bind(&payload.discount_code)
    .bind(OrderStatus::Pending.as_str())
    .bind(purchased_at)
    .bind(estimate)
    .execute(&state.db)
    .await?;

    tracing::info!("order {id} created for {}", claims.email);

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: id,
            delivery_estimate: estimate,
        }),
    )
        .into_response())
}

/// `GET /api/orders` — administrative list, newest first, catalog-joined.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    require_admin(&headers, &state)?;

    let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY purchased_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(resolve_orders(&state, rows).await?))
}

/// `GET /api/orders/:id` — a single catalog-joined order.
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    require_session(&headers, &state)?;

    let row = fetch_order(&state, id).await?;
    let mut resolved = resolve_orders(&state, vec![row]).await?;
    resolved
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))
}

/// `PUT /api/orders/:id` — partial administrative update of status and/or
/// delivery estimate. Status changes must follow the order state machine.
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    require_admin(&headers, &state)?;

    let current = fetch_order(&state, id).await?;

    if let Some(requested) = payload.estado.as_deref() {
        let next: OrderStatus = requested
            .parse()
            .map_err(|e: UnknownStatus| ApiError::Validation(e.to_string()))?;
        let from: OrderStatus = current
            .status
            .parse()
            .map_err(|e: UnknownStatus| ApiError::Internal(e.to_string()))?;
        if !from.can_transition_to(next) {
            return Err(ApiError::Validation(format!(
                "cannot change order status from {from} to {next}"
            )));
        }
    }

    let updated = sqlx::query_as::<_, OrderRow>(
        "UPDATE orders SET \
         status = COALESCE($2, status), \
         delivery_estimate = COALESCE($3, delivery_estimate) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(payload.estado.as_deref())
    .bind(payload.delivery_estimate)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("order {id} updated");

    let mut resolved = resolve_orders(&state, vec![updated]).await?;
    resolved
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))
}

/// `DELETE /api/orders/:id` — administrative removal.
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&headers, &state)?;

    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("order not found".to_string()));
    }

    tracing::info!("order {id} deleted");
    Ok(Json(serde_json::json!({ "message": "order deleted" })))
}
