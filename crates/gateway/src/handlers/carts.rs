use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use gearstore_domain::cart::{Cart, CartError, CartLine};

use crate::error::ApiError;
use crate::models::{AddToCartRequest, CartRow, RemoveCartLineRequest, UpdateCartLineRequest};
use crate::AppState;

fn cart_from_row(row: &CartRow) -> Cart {
    Cart {
        lines: row.lines.0.clone(),
        total: row.total,
    }
}

async fn fetch_cart(state: &AppState, id: Uuid) -> Result<CartRow, ApiError> {
    sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("cart not found".to_string()))
}

async fn save_cart(state: &AppState, id: Uuid, cart: &Cart) -> Result<CartRow, ApiError> {
    let row = sqlx::query_as::<_, CartRow>(
        "UPDATE carts SET lines = $2, total = $3, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(sqlx::types::Json(&cart.lines))
    .bind(cart.total)
    .fetch_one(&state.db)
    .await?;
    Ok(row)
}

async fn delete_cart_row(state: &AppState, id: Uuid) -> Result<u64, ApiError> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(result.rows_affected())
}

/// `GET /api/cart/client/:clientId` — the customer's cart, or the empty
/// shape `{lines: [], total: 0}` when none exists. Never a 404.
pub async fn get_cart_for_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Response, ApiError> {
    let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE client_id = $1")
        .bind(&client_id)
        .fetch_optional(&state.db)
        .await?;

    match row {
        Some(row) => Ok(Json(row).into_response()),
        None => Ok(Json(Cart::empty()).into_response()),
    }
}

/// `POST /api/cart` — merges the product into the customer's cart, creating
/// the cart document on first add. Same product id accumulates quantity and
/// refreshes display attributes; the total is recomputed either way.
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Response, ApiError> {
    let (Some(product_id), Some(name), Some(price), Some(client_id)) = (
        payload.product_id,
        payload.name,
        payload.price,
        payload.cliente,
    ) else {
        return Err(ApiError::Validation(
            "productId, name, price and cliente are required".to_string(),
        ));
    };

    let quantity = payload.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(ApiError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    let line = CartLine {
        product_id,
        name,
        price,
        image: payload.image,
        quantity,
    };

    let existing = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE client_id = $1")
        .bind(&client_id)
        .fetch_optional(&state.db)
        .await?;

    match existing {
        Some(row) => {
            let mut cart = cart_from_row(&row);
            cart.add_or_update_line(line);
            let updated = save_cart(&state, row.id, &cart).await?;
            Ok((StatusCode::OK, Json(updated)).into_response())
        }
        None => {
            let mut cart = Cart::empty();
            cart.add_or_update_line(line);
            let created = sqlx::query_as::<_, CartRow>(
                "INSERT INTO carts (id, client_id, lines, total) \
                 VALUES ($1, $2, $3, $4) RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(&client_id)
            .bind(sqlx::types::Json(&cart.lines))
            .bind(cart.total)
            .fetch_one(&state.db)
            .await?;
            tracing::info!("created cart for client {client_id}");
            Ok((StatusCode::CREATED, Json(created)).into_response())
        }
    }
}

/// `PUT /api/cart/:id` — overwrites a line's quantity; zero or negative
/// removes the line, and a cart drained to nothing is deleted outright.
pub async fn update_cart_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartLineRequest>,
) -> Result<Response, ApiError> {
    let row = fetch_cart(&state, id).await?;

    let mut cart = cart_from_row(&row);
    cart.set_line_quantity(&payload.product_id, payload.quantity)
        .map_err(|CartError::ProductNotInCart| {
            ApiError::NotFound("product not in cart".to_string())
        })?;

    if cart.is_empty() {
        delete_cart_row(&state, id).await?;
        return Ok(Json(Cart::empty()).into_response());
    }

    let updated = save_cart(&state, id, &cart).await?;
    Ok(Json(updated).into_response())
}

/// `DELETE /api/cart/:id` — with a `productId` in the body, removes that
/// line (deleting the cart when it was the last); without one, removes the
/// whole cart document.
pub async fn delete_cart_or_line(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<RemoveCartLineRequest>>,
) -> Result<Response, ApiError> {
    let product_id = body.and_then(|Json(b)| b.product_id);

    let Some(product_id) = product_id else {
        if delete_cart_row(&state, id).await? == 0 {
            return Err(ApiError::NotFound("cart not found".to_string()));
        }
        tracing::info!("deleted cart {id}");
        return Ok(Json(serde_json::json!({ "message": "cart deleted" })).into_response());
    };

    let row = fetch_cart(&state, id).await?;
    let mut cart = cart_from_row(&row);
    cart.remove_line(&product_id);

    if cart.is_empty() {
        delete_cart_row(&state, id).await?;
        return Ok(Json(serde_json::json!({ "message": "cart deleted" })).into_response());
    }

    let updated = save_cart(&state, id, &cart).await?;
    Ok(Json(updated).into_response())
}
