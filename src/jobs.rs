//! Campaign lifecycle operations shared by the HTTP read path and the
//! background schedule, plus the loops themselves.
//!
//! Every campaign read-modify-write runs inside a transaction holding
//! `FOR UPDATE` row locks, so an on-demand sweep and a scheduled sweep
//! racing on the same campaign serialize instead of losing updates.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::catalog::{ProductRow, LOW_STOCK_THRESHOLD};
use crate::domain::flash_sale::{pick_active, sweep_action, CampaignRow, SaleProduct, SweepAction};
use crate::domain::generator::{plan_campaign, CANDIDATE_MIN_RATING, CANDIDATE_MIN_STOCK};
use crate::error::ApiResult;
use crate::notify::create_notification;
use crate::AppState;

pub const AUTO_ENABLED_KEY: &str = "flash_auto_enabled";

const CAMPAIGN_COLUMNS: &str = "id, is_active, start_time, end_time, sale_products";

/// Recomputes every campaign's active flag against `now`, persisting flips
/// and propagating them to the live catalog. Expired campaigns are deleted
/// with their product flags reset. Returns the campaign surfaced to
/// clients: the first active one by ascending `start_time`.
pub async fn activation_sweep(db: &PgPool, now: DateTime<Utc>) -> ApiResult<Option<CampaignRow>> {
    let mut tx = db.begin().await?;
    let campaigns: Vec<CampaignRow> = sqlx::query_as(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM flash_sale_campaigns ORDER BY start_time FOR UPDATE"
    ))
    .fetch_all(&mut *tx)
    .await?;

    let mut remaining = Vec::with_capacity(campaigns.len());
    for mut campaign in campaigns {
        match sweep_action(&campaign, now.timestamp()) {
            SweepAction::Delete => {
                set_product_flags(&mut tx, &campaign.products(), false).await;
                sqlx::query("DELETE FROM flash_sale_campaigns WHERE id = $1")
                    .bind(campaign.id)
                    .execute(&mut *tx)
                    .await?;
            }
            SweepAction::Flip { active } => {
                let snapshots = campaign.with_snapshot_flags(active);
                sqlx::query(
                    "UPDATE flash_sale_campaigns SET is_active = $2, sale_products = $3 \
                     WHERE id = $1",
                )
                .bind(campaign.id)
                .bind(active)
                .bind(&snapshots)
                .execute(&mut *tx)
                .await?;
                set_product_flags(&mut tx, &campaign.products(), active).await;
                campaign.is_active = active;
                campaign.sale_products = snapshots;
                remaining.push(campaign);
            }
            SweepAction::Keep => remaining.push(campaign),
        }
    }
    tx.commit().await?;
    Ok(pick_active(&remaining, now.timestamp()).cloned())
}

/// Deletes one campaign and resets the flash flag of every product in its
/// snapshot. Idempotent: a missing campaign is a no-op returning 0.
pub async fn delete_campaign(db: &PgPool, id: Uuid) -> ApiResult<u64> {
    let mut tx = db.begin().await?;
    let campaign: Option<CampaignRow> = sqlx::query_as(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM flash_sale_campaigns WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(campaign) = campaign else {
        return Ok(0);
    };
    set_product_flags(&mut tx, &campaign.products(), false).await;
    let deleted = sqlx::query("DELETE FROM flash_sale_campaigns WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(deleted)
}

/// Propagates a campaign's active flag to the live products it snapshotted.
/// Each update runs under its own savepoint, so a statement failure rolls
/// back that product alone and leaves the outer transaction usable; the
/// campaign's own transition still commits. A product that no longer exists
/// (0 rows touched) is logged and skipped.
async fn set_product_flags(
    tx: &mut Transaction<'_, Postgres>,
    products: &[SaleProduct],
    active: bool,
) {
    for product in products {
        match flag_product(tx, product.id, active).await {
            Ok(0) => {
                tracing::warn!(product_id = %product.id, "flash flag target no longer exists");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, product_id = %product.id, "flash flag propagation failed");
            }
        }
    }
}

async fn flag_product(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    active: bool,
) -> Result<u64, sqlx::Error> {
    let mut sp = tx.begin().await?;
    let done = sqlx::query("UPDATE products SET is_flash_sale = $2 WHERE id = $1")
        .bind(id)
        .bind(active)
        .execute(&mut *sp)
        .await?;
    sp.commit().await?;
    Ok(done.rows_affected())
}

pub async fn auto_enabled(db: &PgPool) -> ApiResult<bool> {
    let value: Option<serde_json::Value> =
        sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
            .bind(AUTO_ENABLED_KEY)
            .fetch_optional(db)
            .await?;
    Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
}

pub async fn set_auto_enabled(db: &PgPool, enable: bool) -> ApiResult<()> {
    sqlx::query(
        "INSERT INTO app_settings (key, value) VALUES ($1, $2) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(AUTO_ENABLED_KEY)
    .bind(serde_json::json!(enable))
    .execute(db)
    .await?;
    Ok(())
}

/// One auto-generation pass. No-ops unless the persisted enable flag is set
/// and no campaign is currently live; otherwise plans a 24-hour campaign
/// over the candidate products, inserts it active, and writes each
/// product's reduced main pool back to the catalog. Per-product write-back
/// failures are logged and do not abort the batch.
pub async fn auto_generate<R: Rng>(
    db: &PgPool,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ApiResult<Option<Uuid>> {
    if !auto_enabled(db).await? {
        return Ok(None);
    }
    let live: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM flash_sale_campaigns WHERE is_active AND end_time > $1)",
    )
    .bind(now.timestamp())
    .fetch_one(db)
    .await?;
    if live {
        return Ok(None);
    }

    let products: Vec<ProductRow> = sqlx::query_as(
        "SELECT id, product_name, regular_price, sale_price, discount, rating, is_new, \
                is_flash_sale, stock, weight, extras, seller_id \
         FROM products WHERE (rating > $1 OR is_new) AND stock > $2",
    )
    .bind(CANDIDATE_MIN_RATING)
    .bind(CANDIDATE_MIN_STOCK)
    .fetch_all(db)
    .await?;

    let Some(plan) = plan_campaign(&products, now, rng) else {
        tracing::debug!("flash sale generator found no eligible products");
        return Ok(None);
    };

    let campaign_id = Uuid::new_v4();
    let snapshots = serde_json::to_value(&plan.snapshots)
        .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));
    sqlx::query(
        "INSERT INTO flash_sale_campaigns (id, is_active, start_time, end_time, sale_products) \
         VALUES ($1, TRUE, $2, $3, $4)",
    )
    .bind(campaign_id)
    .bind(plan.start_time)
    .bind(plan.end_time)
    .bind(&snapshots)
    .execute(db)
    .await?;

    for update in &plan.updates {
        let result = sqlx::query(
            "UPDATE products SET stock = $2, sale_price = $3, discount = $4, extras = $5, \
                    is_flash_sale = TRUE, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(update.id)
        .bind(update.stock)
        .bind(update.sale_price)
        .bind(update.discount)
        .bind(&update.extras)
        .execute(db)
        .await;

        match result {
            Err(err) => {
                tracing::warn!(%err, product_id = %update.id, "stock write-back failed");
            }
            Ok(_) if update.stock <= LOW_STOCK_THRESHOLD => {
                let product = products.iter().find(|p| p.id == update.id);
                let name = product.map(|p| p.product_name.as_str()).unwrap_or("product");
                create_notification(
                    db,
                    product.and_then(|p| p.seller_id),
                    "seller",
                    "Low stock after flash sale",
                    &format!("{name} has {} units left in the main pool", update.stock),
                    Some("low_stock"),
                    Some(update.id),
                    None,
                )
                .await;
            }
            Ok(_) => {}
        }
    }

    tracing::info!(%campaign_id, products = plan.snapshots.len(), "flash sale campaign generated");
    Ok(Some(campaign_id))
}

/// Starts the periodic sweeps: activation/expiry on a short interval and
/// the auto-generation check hourly by default. Both loop forever, logging
/// failures and continuing.
pub fn spawn_all(state: AppState) {
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(
            sweep_state.config.activation_sweep_secs,
        ));
        loop {
            tick.tick().await;
            if let Err(err) = activation_sweep(&sweep_state.db, Utc::now()).await {
                tracing::error!(%err, "flash sale activation sweep failed");
            }
        }
    });

    tokio::spawn(async move {
        let mut tick =
            tokio::time::interval(Duration::from_secs(state.config.generator_sweep_secs));
        let mut rng = StdRng::from_entropy();
        loop {
            tick.tick().await;
            if let Err(err) = auto_generate(&state.db, Utc::now(), &mut rng).await {
                tracing::error!(%err, "flash sale auto-generation failed");
            }
        }
    });
}

/// One-shot deferred expiry for a freshly created campaign. Racing with the
/// sweep is safe: whichever runs second sees no row and no-ops.
pub fn schedule_expiry(state: AppState, id: Uuid, end_time: i64) {
    tokio::spawn(async move {
        let wait = (end_time - Utc::now().timestamp()).max(0) as u64;
        tokio::time::sleep(Duration::from_secs(wait)).await;
        if let Err(err) = delete_campaign(&state.db, id).await {
            tracing::warn!(%err, campaign_id = %id, "deferred campaign expiry failed");
        }
    });
}
