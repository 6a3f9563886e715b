//! Fire-and-forget notification sink. Insert failures are logged and never
//! propagate to the caller, so a stock mutation is not rolled back because
//! its notification could not be written.

use sqlx::PgPool;
use uuid::Uuid;

#[allow(clippy::too_many_arguments)]
pub async fn create_notification(
    db: &PgPool,
    user_id: Option<Uuid>,
    user_role: &str,
    title: &str,
    message: &str,
    kind: Option<&str>,
    ref_id: Option<Uuid>,
    ref_data: Option<serde_json::Value>,
) {
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, user_role, title, message, type, ref_id, ref_data) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(user_id)
    .bind(user_role)
    .bind(title)
    .bind(message)
    .bind(kind)
    .bind(ref_id)
    .bind(ref_data)
    .execute(db)
    .await;

    if let Err(err) = result {
        tracing::warn!(%err, title, "notification insert failed");
    }
}
