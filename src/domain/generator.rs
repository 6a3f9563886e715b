//! Flash-sale auto-generation: candidate selection and randomized stock
//! splitting between the live catalog and a new campaign snapshot.
//!
//! All randomness comes through the caller's `Rng` so the planner is
//! deterministic under a seeded generator.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use super::catalog::{sale_price, ProductRow};
use super::flash_sale::{SaleProduct, SaleVariant};

pub const MAX_SALE_PRODUCTS: usize = 100;
pub const CANDIDATE_MIN_STOCK: i32 = 30;
pub const CANDIDATE_MIN_RATING: f64 = 4.5;
pub const CAMPAIGN_DURATION_HOURS: i64 = 24;

/// Highly rated or newly listed, with enough stock to carve a flash pool.
pub fn is_candidate(p: &ProductRow) -> bool {
    (p.rating > CANDIDATE_MIN_RATING || p.is_new) && p.stock > CANDIDATE_MIN_STOCK
}

/// Write-back for one product's reduced main pool.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub id: Uuid,
    pub stock: i32,
    pub sale_price: i64,
    pub discount: i64,
    pub extras: serde_json::Value,
}

#[derive(Debug)]
pub struct SalePlan {
    pub start_time: i64,
    pub end_time: i64,
    pub snapshots: Vec<SaleProduct>,
    pub updates: Vec<ProductUpdate>,
}

/// Flash-pool draw for one variant: small slice from small stocks, larger
/// slice from deep stocks. Clamped so the remaining live stock can never go
/// negative.
fn draw_variant_pool(rng: &mut impl Rng, stock: i32) -> i32 {
    let drawn = if stock <= 50 {
        rng.gen_range(2..=5)
    } else {
        rng.gen_range(40..=45)
    };
    drawn.min(stock)
}

/// Same idea for a variantless product, with its own bounds.
fn draw_product_pool(rng: &mut impl Rng, stock: i32) -> i32 {
    let drawn = if stock <= 50 {
        rng.gen_range(3..=5)
    } else {
        rng.gen_range(45..=50)
    };
    drawn.min(stock)
}

/// Builds a 24-hour campaign from the candidate pool, or `None` when no
/// product qualifies. Candidates are shuffled and capped at
/// [`MAX_SALE_PRODUCTS`]; each gets a uniform discount in `[10, 30]`.
///
/// For every selected product the pre-sale stock is split into two disjoint
/// pools: the snapshot keeps the flash pool, the update carries the reduced
/// main pool, and their sum equals the stock going in.
pub fn plan_campaign(
    products: &[ProductRow],
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Option<SalePlan> {
    let mut candidates: Vec<&ProductRow> = products.iter().filter(|p| is_candidate(p)).collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.shuffle(rng);
    candidates.truncate(MAX_SALE_PRODUCTS);

    let mut snapshots = Vec::with_capacity(candidates.len());
    let mut updates = Vec::with_capacity(candidates.len());

    for product in candidates {
        let discount = rng.gen_range(10..=30) as i64;
        let mut extras = product.extras();

        let (flash_total, live_total, flash_variants) = if extras.has_variants() {
            let mut flash_variants = Vec::with_capacity(extras.variants.len());
            for variant in &mut extras.variants {
                let pool = draw_variant_pool(rng, variant.stock);
                variant.stock -= pool;
                let regular = if variant.regular_price > 0 {
                    variant.regular_price
                } else {
                    product.regular_price
                };
                variant.sale_price = sale_price(regular, discount);
                flash_variants.push(SaleVariant {
                    name: variant.name.clone(),
                    stock: pool,
                    sale_price: variant.sale_price,
                });
            }
            let flash_total: i32 = flash_variants.iter().map(|v| v.stock).sum();
            (flash_total, extras.variant_stock_sum(), flash_variants)
        } else {
            let pool = draw_product_pool(rng, product.stock);
            (pool, product.stock - pool, Vec::new())
        };

        let discounted = sale_price(product.regular_price, discount);
        snapshots.push(SaleProduct {
            id: product.id,
            product_name: product.product_name.clone(),
            regular_price: product.regular_price,
            sale_price: discounted,
            discount,
            stock: flash_total,
            is_flash_sale: true,
            variants: flash_variants,
        });
        updates.push(ProductUpdate {
            id: product.id,
            stock: live_total,
            sale_price: discounted,
            discount,
            extras: serde_json::to_value(&extras).unwrap_or_else(|_| product.extras.clone()),
        });
    }

    Some(SalePlan {
        start_time: now.timestamp(),
        end_time: (now + Duration::hours(CAMPAIGN_DURATION_HOURS)).timestamp(),
        snapshots,
        updates,
    })
}
