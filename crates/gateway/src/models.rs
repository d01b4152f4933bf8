use chrono::{DateTime, Utc};
use gearstore_domain::cart::CartLine;
use gearstore_domain::order::{Amounts, PersonalDetails, StoredPayment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// One cart document per customer. `lines` and `total` are written together
/// after every mutation; `total` is always recomputed, never trusted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartRow {
    pub id: Uuid,
    #[serde(rename = "cliente")]
    pub client_id: String,
    pub lines: Json<Vec<CartLine>>,
    pub total: Decimal,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Persisted order. Payment is the redacted shape only; the raw card number
/// and CVV never reach this struct.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub lines: Json<Vec<CartLine>>,
    pub personal: Json<PersonalDetails>,
    pub payment: Json<StoredPayment>,
    pub amounts: Json<Amounts>,
    pub discount_code: Option<String>,
    pub status: String,
    pub purchased_at: DateTime<Utc>,
    pub delivery_estimate: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    #[serde(rename = "productoId")]
    pub product_id: Uuid,
    #[serde(rename = "autor")]
    pub author: String,
    #[serde(rename = "calificacion")]
    pub rating: i16,
    #[serde(rename = "comentario")]
    pub comment: String,
    #[serde(rename = "verificado")]
    pub verified: bool,
    #[serde(rename = "reportado")]
    pub reported: bool,
    #[serde(rename = "utiles")]
    pub helpful_count: i32,
    #[serde(rename = "fecha")]
    pub created_at: DateTime<Utc>,
}

/// Catalog boundary row. Management of the catalog lives with the product
/// service; these rows exist so order reads can resolve their references.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: i32,
}

// ── API Payloads ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub quantity: Option<u32>,
    pub cliente: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartLineRequest {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub quantity: i64,
}

/// Body of `DELETE /api/cart/:id`. Without a `productId` the whole cart
/// document is removed.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveCartLineRequest {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    #[serde(rename = "pedidoId")]
    pub order_id: Uuid,
    #[serde(rename = "fechaEntregaEstimada")]
    pub delivery_estimate: DateTime<Utc>,
}

/// Partial administrative update; only supplied fields change.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub estado: Option<String>,
    #[serde(rename = "fechaEntregaEstimada")]
    pub delivery_estimate: Option<DateTime<Utc>>,
}

/// An order line joined against the catalog. `producto` is `null` when the
/// referenced product no longer resolves.
#[derive(Debug, Serialize)]
pub struct ResolvedOrderLine {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub producto: Option<ProductRow>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub productos: Vec<ResolvedOrderLine>,
    #[serde(rename = "datosPersonales")]
    pub personal: PersonalDetails,
    #[serde(rename = "datosPago")]
    pub payment: StoredPayment,
    pub montos: Amounts,
    #[serde(rename = "codigoDescuento", skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    pub estado: String,
    #[serde(rename = "fechaCompra")]
    pub purchased_at: DateTime<Utc>,
    #[serde(rename = "fechaEntregaEstimada")]
    pub delivery_estimate: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(rename = "productoId")]
    pub product_id: Uuid,
    pub autor: String,
    #[serde(rename = "calificacion")]
    pub rating: i16,
    #[serde(rename = "comentario")]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn add_to_cart_request_uses_the_wire_names() {
        let req: AddToCartRequest = serde_json::from_value(serde_json::json!({
            "productId": "p1",
            "name": "Mouse",
            "price": 20,
            "quantity": 2,
            "cliente": "c1"
        }))
        .unwrap();
        assert_eq!(req.product_id.as_deref(), Some("p1"));
        assert_eq!(req.price, Some(dec!(20)));
        assert_eq!(req.cliente.as_deref(), Some("c1"));
        assert!(req.image.is_none());
    }

    #[test]
    fn order_creation_response_exposes_pedido_id() {
        let resp = CreateOrderResponse {
            order_id: Uuid::nil(),
            delivery_estimate: Utc::now(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("pedidoId").is_some());
        assert!(json.get("fechaEntregaEstimada").is_some());
    }

    #[test]
    fn cart_row_serializes_cliente() {
        let row = CartRow {
            id: Uuid::nil(),
            client_id: "c1".to_string(),
            lines: Json(vec![]),
            total: dec!(0),
            updated_at: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["cliente"], "c1");
        assert_eq!(json["lines"], serde_json::json!([]));
    }

    #[test]
    fn update_order_request_accepts_partial_bodies() {
        let only_status: UpdateOrderRequest =
            serde_json::from_value(serde_json::json!({ "estado": "enviado" })).unwrap();
        assert_eq!(only_status.estado.as_deref(), Some("enviado"));
        assert!(only_status.delivery_estimate.is_none());

        let empty: UpdateOrderRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.estado.is_none());
    }
}
