//! Delivery-quote endpoint: postal codes to zone to charge.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::fee::{compute_fee, ZoneTariff};
use crate::domain::geo::{classify, resolve_point, GeoPoint, PostalZoneRow};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub seller_id: Uuid,
    pub user_id: Uuid,
    #[validate(range(min = 0.000001, message = "weight must be a positive number"))]
    pub weight: f64,
    #[validate(range(min = 0.000001, message = "orderAmount must be a positive number"))]
    pub order_amount: f64,
    #[serde(default)]
    pub is_cod: bool,
}

#[derive(Debug, Serialize)]
pub struct DeliveryQuote {
    pub zone_name: &'static str,
    pub delivery_time: String,
    pub total_delivery_charge: i64,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub result: Vec<DeliveryQuote>,
}

pub async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> ApiResult<Json<QuoteResponse>> {
    params
        .validate()
        .map_err(|err| ApiError::InvalidQuoteInput(err.to_string()))?;

    let seller_point = point_for(&state, "sellers", params.seller_id).await?;
    let buyer_point = point_for(&state, "users", params.user_id).await?;

    let zone = classify(&seller_point, &buyer_point);
    let tariff: Option<ZoneTariff> = sqlx::query_as(
        "SELECT name, delivery_time, delivery_charge, free_delivery_min_amount \
         FROM zones WHERE name = $1",
    )
    .bind(zone.as_str())
    .fetch_optional(&state.db)
    .await?;

    let (delivery_time, total_delivery_charge) = compute_fee(
        zone,
        tariff.as_ref(),
        params.weight,
        params.order_amount,
        params.is_cod,
    );

    Ok(Json(QuoteResponse {
        result: vec![DeliveryQuote {
            zone_name: zone.as_str(),
            delivery_time,
            total_delivery_charge,
        }],
    }))
}

/// Looks up a party's postal code and collapses its postal-zone rows into a
/// point. Any gap in the chain (unknown party, no postal code, no matching
/// zone rows) is a `ZoneNotFound` for the whole quote.
async fn point_for(state: &AppState, table: &str, id: Uuid) -> ApiResult<GeoPoint> {
    // `table` is a compile-time constant at both call sites, never user input.
    let postal_code: Option<Option<String>> =
        sqlx::query_scalar(&format!("SELECT postal_code FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let postal_code = postal_code.flatten().ok_or(ApiError::ZoneNotFound)?;

    let rows: Vec<PostalZoneRow> = sqlx::query_as(
        "SELECT postal_code, district, thana, latitude, longitude, is_remote \
         FROM postal_zones WHERE postal_code = $1",
    )
    .bind(&postal_code)
    .fetch_all(&state.db)
    .await?;

    resolve_point(&rows).ok_or(ApiError::ZoneNotFound)
}
