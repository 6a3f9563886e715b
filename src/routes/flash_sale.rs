//! Flash-sale campaign endpoints: the active-campaign read path (which
//! doubles as an activation sweep), manual creation/deletion, and the
//! auto-generator toggle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::domain::flash_sale::{CampaignRow, SaleProduct};
use crate::error::{ApiError, ApiResult};
use crate::jobs;
use crate::AppState;

const DEFAULT_DURATION_HOURS: i64 = 12;

/// Admin view of all campaigns, scheduled and active alike.
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let campaigns: Vec<CampaignRow> = sqlx::query_as(
        "SELECT id, is_active, start_time, end_time, sale_products \
         FROM flash_sale_campaigns ORDER BY start_time",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(json!({ "campaigns": campaigns })))
}

/// Runs the activation sweep and returns the campaign it surfaced, or
/// `{"active": false}` when no window covers the current time.
pub async fn active(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    match jobs::activation_sweep(&state.db, Utc::now()).await? {
        Some(campaign) => Ok(Json(json!({
            "active": true,
            "id": campaign.id,
            "isactive": campaign.is_active,
            "start_time": campaign.start_time,
            "end_time": campaign.end_time,
            "sale_products": campaign.sale_products,
        }))),
        None => Ok(Json(json!({ "active": false }))),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[serde(default, rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "saleProducts")]
    #[validate(length(min = 1, message = "saleProducts must not be empty"))]
    pub sale_products: Vec<SaleProduct>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    req.validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let now = Utc::now();
    let start_time = req.start_time.unwrap_or_else(|| now.timestamp());
    let end_time = req
        .end_time
        .unwrap_or_else(|| (now + Duration::hours(DEFAULT_DURATION_HOURS)).timestamp());
    if end_time <= start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".into()));
    }

    let id = Uuid::new_v4();
    let snapshots = serde_json::to_value(&req.sale_products)
        .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));
    sqlx::query(
        "INSERT INTO flash_sale_campaigns (id, is_active, start_time, end_time, sale_products) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(req.is_active)
    .bind(start_time)
    .bind(end_time)
    .bind(&snapshots)
    .execute(&state.db)
    .await?;

    // Deferred expiry in addition to the periodic sweep; both are idempotent.
    jobs::schedule_expiry(state.clone(), id, end_time);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Flash sale created successfully", "id": id })),
    ))
}

/// Deleting twice is a no-op, mirroring the expiry path: the second call
/// reports `deleted_count: 0` instead of erroring.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = jobs::delete_campaign(&state.db, id).await?;
    Ok(Json(json!({
        "message": "Flash sale deleted",
        "deleted_count": deleted,
    })))
}

pub async fn auto_status(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let enabled = jobs::auto_enabled(&state.db).await?;
    Ok(Json(json!({ "enabled": enabled })))
}

#[derive(Debug, Deserialize)]
pub struct ToggleAutoRequest {
    pub enable: bool,
}

pub async fn toggle_auto(
    State(state): State<AppState>,
    Json(req): Json<ToggleAutoRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    jobs::set_auto_enabled(&state.db, req.enable).await?;
    Ok(Json(json!({ "enabled": req.enable })))
}
