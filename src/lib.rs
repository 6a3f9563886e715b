//! Bazarigo Marketplace Backend
//!
//! REST-over-SQL backend for a multi-vendor marketplace. The two load-bearing
//! subsystems are delivery quoting (postal-zone resolution, haversine zone
//! classification, tariff-based fee computation) and the flash-sale
//! lifecycle (time-windowed campaigns, stock splitting between the live
//! catalog and campaign snapshots, and an autonomous campaign generator).
//!
//! ## Layout
//! - [`domain`]: pure logic, no I/O, unit-tested in place
//! - [`routes`]: axum handlers running parameterized sqlx queries
//! - [`jobs`]: campaign sweeps and the auto-generator, shared between the
//!   HTTP read path and the background schedule

pub mod config;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod notify;
pub mod routes;

use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Config,
}
