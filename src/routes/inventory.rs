//! Inventory listing and stock adjustment. Adjustments clamp at zero in
//! SQL so concurrent decrements can never drive stock negative.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::catalog::LOW_STOCK_THRESHOLD;
use crate::error::{ApiError, ApiResult};
use crate::notify::create_notification;
use crate::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InventoryRow {
    pub id: Uuid,
    pub product_name: String,
    pub stock: i32,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let inventory: Vec<InventoryRow> =
        sqlx::query_as("SELECT id, product_name, stock FROM products")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(json!({ "inventory": inventory })))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub change: Option<i64>,
    #[serde(rename = "productId")]
    pub product_id: Option<Uuid>,
}

#[derive(Debug, sqlx::FromRow)]
struct AdjustedProduct {
    product_name: String,
    stock: i32,
    seller_id: Option<Uuid>,
}

pub async fn adjust(
    State(state): State<AppState>,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let change = req
        .change
        .ok_or_else(|| ApiError::BadRequest("Invalid change value".into()))?;

    match req.product_id {
        Some(product_id) => {
            let adjusted: Option<AdjustedProduct> = sqlx::query_as(
                "UPDATE products SET stock = GREATEST(stock + $1, 0) WHERE id = $2 \
                 RETURNING product_name, stock, seller_id",
            )
            .bind(change)
            .bind(product_id)
            .fetch_optional(&state.db)
            .await?;

            let updated = adjusted.is_some() as u64;
            if let Some(product) = adjusted {
                if product.stock <= LOW_STOCK_THRESHOLD {
                    let (kind, title) = if product.stock == 0 {
                        ("out_of_stock", "Product out of stock")
                    } else {
                        ("low_stock", "Product stock is low")
                    };
                    create_notification(
                        &state.db,
                        product.seller_id,
                        "seller",
                        title,
                        &format!("{} has {} units left", product.product_name, product.stock),
                        Some(kind),
                        Some(product_id),
                        None,
                    )
                    .await;
                }
            }
            Ok(Json(json!({
                "message": format!("Product ID {product_id} stock updated successfully"),
                "updated_count": updated,
            })))
        }
        None => {
            let updated = sqlx::query("UPDATE products SET stock = GREATEST(stock + $1, 0)")
                .bind(change)
                .execute(&state.db)
                .await?
                .rows_affected();
            Ok(Json(json!({
                "message": "All product stocks updated successfully",
                "updated_count": updated,
            })))
        }
    }
}
