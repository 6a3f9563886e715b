//! Delivery charge computation from zone tariffs.

use serde::Serialize;

use super::geo::Zone;

/// Threshold used when a tariff has no free-delivery minimum configured,
/// high enough that the override never fires.
pub const FREE_DELIVERY_FALLBACK: i64 = 999_999;

pub const PER_KG_CHARGE: f64 = 10.0;
pub const COD_MIN_CHARGE: f64 = 10.0;
pub const COD_RATE: f64 = 0.01;

/// One row of the `zones` tariff table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ZoneTariff {
    pub name: String,
    pub delivery_time: String,
    pub delivery_charge: i64,
    pub free_delivery_min_amount: Option<i64>,
}

/// Computes the final delivery charge for a classified zone.
///
/// The order amount gets a 1% buffer before the free-delivery comparison so
/// an order exactly at the threshold still ships free. Otherwise the charge
/// is the greater of the flat per-zone rate and the tariff's base charge
/// plus weight and cash-on-delivery terms, truncated toward zero. A zero
/// weight falls back to 1 kg so a missing weight never erases that term.
///
/// Callers must reject non-positive weight/amount before calling; this
/// function assumes validated input.
pub fn compute_fee(
    zone: Zone,
    tariff: Option<&ZoneTariff>,
    weight_kg: f64,
    order_amount: f64,
    is_cod: bool,
) -> (String, i64) {
    let label = tariff.map(|t| t.delivery_time.clone()).unwrap_or_default();
    let threshold = tariff
        .and_then(|t| t.free_delivery_min_amount)
        .unwrap_or(FREE_DELIVERY_FALLBACK) as f64;
    if order_amount * 1.01 >= threshold {
        return (label, 0);
    }

    let base = tariff.map(|t| t.delivery_charge).unwrap_or(0) as f64;
    let weight = if weight_kg == 0.0 { 1.0 } else { weight_kg };
    let cod_term = if is_cod {
        (order_amount * COD_RATE).max(COD_MIN_CHARGE)
    } else {
        0.0
    };
    let computed = base + weight.max(0.0) * PER_KG_CHARGE + cod_term;
    let charge = computed.max(zone.flat_charge() as f64).trunc() as i64;
    (label, charge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tariff(charge: i64, free_min: Option<i64>) -> ZoneTariff {
        ZoneTariff {
            name: "Inside Area".into(),
            delivery_time: "1-2 days".into(),
            delivery_charge: charge,
            free_delivery_min_amount: free_min,
        }
    }

    #[test]
    fn computed_beats_flat() {
        // 50 + 5*10 = 100 > flat 70
        let t = tariff(50, None);
        let (label, charge) = compute_fee(Zone::InsideArea, Some(&t), 5.0, 500.0, false);
        assert_eq!(label, "1-2 days");
        assert_eq!(charge, 100);
    }

    #[test]
    fn cod_adds_minimum_ten() {
        // 1% of 500 is 5, below the 10 floor
        let t = tariff(50, None);
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 5.0, 500.0, true);
        assert_eq!(charge, 110);
    }

    #[test]
    fn cod_percentage_above_floor() {
        // 1% of 5000 is 50
        let t = tariff(50, Some(100_000));
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 5.0, 5000.0, true);
        assert_eq!(charge, 150);
    }

    #[test]
    fn flat_is_the_floor() {
        // 200 flat for remote beats 50 + 1*10
        let t = tariff(50, None);
        let (_, charge) = compute_fee(Zone::RemoteArea, Some(&t), 1.0, 300.0, false);
        assert_eq!(charge, 200);
    }

    #[test]
    fn free_shipping_at_exact_threshold() {
        let t = tariff(50, Some(1000));
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 2.0, 1000.0, false);
        assert_eq!(charge, 0);
    }

    #[test]
    fn free_shipping_buffer_covers_near_miss() {
        // 995 * 1.01 = 1004.95 >= 1000
        let t = tariff(50, Some(1000));
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 2.0, 995.0, false);
        assert_eq!(charge, 0);
    }

    #[test]
    fn below_buffered_threshold_still_charges() {
        let t = tariff(50, Some(1000));
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 2.0, 900.0, false);
        assert_eq!(charge, 70);
    }

    #[test]
    fn missing_tariff_defaults_to_flat() {
        let (label, charge) = compute_fee(Zone::OutsideArea, None, 2.0, 500.0, false);
        assert_eq!(label, "");
        assert_eq!(charge, 120);
    }

    #[test]
    fn zero_weight_falls_back_to_one_kg() {
        let t = tariff(100, None);
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 0.0, 500.0, false);
        assert_eq!(charge, 110);
    }

    #[test]
    fn charge_is_truncated_toward_zero() {
        // 50 + 2.55*10 = 75.5, truncated to 75
        let t = tariff(50, None);
        let (_, charge) = compute_fee(Zone::InsideArea, Some(&t), 2.55, 333.0, false);
        assert_eq!(charge, 75);
    }

    #[test]
    fn charge_is_never_negative() {
        for zone in [Zone::InsideArea, Zone::NearArea, Zone::OutsideArea, Zone::RemoteArea] {
            let (_, charge) = compute_fee(zone, None, 0.5, 1.0, true);
            assert!(charge >= 0);
        }
    }
}
