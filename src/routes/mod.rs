use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod delivery;
pub mod flash_sale;
pub mod inventory;
pub mod zones;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Welcome to Bazarigo Server!" }))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "bazarigo"})) }),
        )
        .route("/deliveries", get(delivery::quote))
        .route("/zones", get(zones::list).post(zones::create))
        .route(
            "/postal-zones",
            get(zones::list_postal).post(zones::create_postal),
        )
        .route(
            "/flash-sale",
            get(flash_sale::list).post(flash_sale::create),
        )
        .route("/flash-sale/active", get(flash_sale::active))
        .route("/flash-sale/:id", axum::routing::delete(flash_sale::remove))
        .route(
            "/flash-sale/toggle-auto",
            get(flash_sale::auto_status).put(flash_sale::toggle_auto),
        )
        .route(
            "/inventory",
            get(inventory::list).patch(inventory::adjust),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
