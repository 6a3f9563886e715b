//! Zone tariff and postal reference-data administration.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::fee::ZoneTariff;
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let zones: Vec<ZoneTariff> =
        sqlx::query_as("SELECT name, delivery_time, delivery_charge, free_delivery_min_amount FROM zones")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(json!({ "zones": zones })))
}

#[derive(Debug, Deserialize)]
pub struct CreateZoneRequest {
    pub name: String,
    pub delivery_time: String,
    pub delivery_charge: i64,
    pub free_delivery_min_amount: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateZoneRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let created = sqlx::query(
        "INSERT INTO zones (name, delivery_time, delivery_charge, free_delivery_min_amount) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(&req.name)
    .bind(&req.delivery_time)
    .bind(req.delivery_charge)
    .bind(req.free_delivery_min_amount)
    .execute(&state.db)
    .await?
    .rows_affected();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Zone created successfully", "created_count": created })),
    ))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostalZoneRecord {
    pub id: i64,
    pub postal_code: String,
    pub division: Option<String>,
    pub district: String,
    pub thana: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_remote: bool,
}

#[derive(Debug, Deserialize)]
pub struct PostalZoneQuery {
    pub postal_code: Option<String>,
}

pub async fn list_postal(
    State(state): State<AppState>,
    Query(query): Query<PostalZoneQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let rows: Vec<PostalZoneRecord> = match &query.postal_code {
        Some(code) => {
            sqlx::query_as(
                "SELECT id, postal_code, division, district, thana, latitude, longitude, is_remote \
                 FROM postal_zones WHERE postal_code = $1 \
                 ORDER BY TRIM(division), TRIM(district), TRIM(thana)",
            )
            .bind(code)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT id, postal_code, division, district, thana, latitude, longitude, is_remote \
                 FROM postal_zones \
                 ORDER BY TRIM(division), TRIM(district), TRIM(thana)",
            )
            .fetch_all(&state.db)
            .await?
        }
    };
    Ok(Json(json!({ "postal_zones": rows })))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostalZoneRequest {
    pub postal_code: String,
    pub division: Option<String>,
    pub district: String,
    pub thana: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub is_remote: bool,
}

pub async fn create_postal(
    State(state): State<AppState>,
    Json(req): Json<CreatePostalZoneRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let record: PostalZoneRecord = sqlx::query_as(
        "INSERT INTO postal_zones (postal_code, division, district, thana, latitude, longitude, is_remote) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, postal_code, division, district, thana, latitude, longitude, is_remote",
    )
    .bind(&req.postal_code)
    .bind(&req.division)
    .bind(&req.district)
    .bind(&req.thana)
    .bind(req.latitude)
    .bind(req.longitude)
    .bind(req.is_remote)
    .fetch_one(&state.db)
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Postal zone created successfully", "postal_zone": record })),
    ))
}
