//! Flash-sale campaigns: time-windowed stock/discount snapshots held apart
//! from the live catalog.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    #[serde(rename = "isactive")]
    pub is_active: bool,
    pub start_time: i64,
    pub end_time: i64,
    pub sale_products: serde_json::Value,
}

/// A product copied into a campaign at creation time. Owned by the campaign;
/// never aliases the live catalog row afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleProduct {
    pub id: Uuid,
    pub product_name: String,
    pub regular_price: i64,
    pub sale_price: i64,
    pub discount: i64,
    pub stock: i32,
    pub is_flash_sale: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<SaleVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleVariant {
    pub name: String,
    pub stock: i32,
    pub sale_price: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scheduled,
    Active,
    Expired,
}

/// Campaign phase at `now` (epoch seconds). Active on `[start, end)`.
pub fn phase(start_time: i64, end_time: i64, now: i64) -> Phase {
    if now >= end_time {
        Phase::Expired
    } else if now >= start_time {
        Phase::Active
    } else {
        Phase::Scheduled
    }
}

impl CampaignRow {
    /// Decodes the snapshot list, tolerating malformed JSON as empty.
    pub fn products(&self) -> Vec<SaleProduct> {
        serde_json::from_value(self.sale_products.clone()).unwrap_or_default()
    }

    /// Rewrites every snapshot's own flash flag to match the campaign state.
    pub fn with_snapshot_flags(&self, active: bool) -> serde_json::Value {
        let mut products = self.products();
        for p in &mut products {
            p.is_flash_sale = active;
        }
        serde_json::to_value(products).unwrap_or_else(|_| serde_json::json!([]))
    }
}

/// Picks the campaign surfaced to clients: the first one active at `now`,
/// in ascending `start_time` order. Campaigns after it stay individually
/// flagged but are not returned.
pub fn pick_active(campaigns: &[CampaignRow], now: i64) -> Option<&CampaignRow> {
    campaigns
        .iter()
        .find(|c| phase(c.start_time, c.end_time, now) == Phase::Active)
}

/// What the activation sweep should do with one campaign at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Window passed: delete the campaign and reset its products' flags.
    Delete,
    /// Stored flag disagrees with the window: persist and propagate.
    Flip { active: bool },
    /// Stored flag already matches the window.
    Keep,
}

pub fn sweep_action(campaign: &CampaignRow, now: i64) -> SweepAction {
    match phase(campaign.start_time, campaign.end_time, now) {
        Phase::Expired => SweepAction::Delete,
        p => {
            let active = p == Phase::Active;
            if active != campaign.is_active {
                SweepAction::Flip { active }
            } else {
                SweepAction::Keep
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn campaign(start: i64, end: i64) -> CampaignRow {
        CampaignRow {
            id: Uuid::new_v4(),
            is_active: false,
            start_time: start,
            end_time: end,
            sale_products: serde_json::json!([]),
        }
    }

    #[test]
    fn phase_window_is_half_open() {
        assert_eq!(phase(100, 200, 99), Phase::Scheduled);
        assert_eq!(phase(100, 200, 100), Phase::Active);
        assert_eq!(phase(100, 200, 199), Phase::Active);
        assert_eq!(phase(100, 200, 200), Phase::Expired);
        assert_eq!(phase(100, 200, 500), Phase::Expired);
    }

    #[test]
    fn pick_active_first_by_start_time() {
        let a = campaign(100, 300);
        let b = campaign(150, 300);
        let campaigns = vec![a.clone(), b];
        let picked = pick_active(&campaigns, 200).unwrap();
        assert_eq!(picked.id, a.id);
    }

    #[test]
    fn pick_active_skips_expired_and_scheduled() {
        let expired = campaign(0, 50);
        let scheduled = campaign(500, 600);
        let live = campaign(100, 400);
        let campaigns = vec![expired, scheduled, live.clone()];
        assert_eq!(pick_active(&campaigns, 200).unwrap().id, live.id);
        assert!(pick_active(&campaigns, 50).is_none());
    }

    #[test]
    fn snapshot_flag_rewrite() {
        let mut c = campaign(0, 100);
        c.sale_products = serde_json::json!([{
            "id": Uuid::new_v4(),
            "product_name": "p",
            "regular_price": 100,
            "sale_price": 80,
            "discount": 20,
            "stock": 5,
            "is_flash_sale": false
        }]);
        let flagged = c.with_snapshot_flags(true);
        assert_eq!(flagged[0]["is_flash_sale"], true);
    }

    #[test]
    fn malformed_snapshots_decode_as_empty() {
        let mut c = campaign(0, 100);
        c.sale_products = serde_json::json!({"not": "a list"});
        assert!(c.products().is_empty());
    }

    fn snapshot(id: Uuid, flagged: bool) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "product_name": "p",
            "regular_price": 100,
            "sale_price": 80,
            "discount": 20,
            "stock": 5,
            "is_flash_sale": flagged
        })
    }

    // Applies sweep decisions to an in-memory store: campaigns plus the
    // catalog's is_flash_sale flags. Returns how many campaigns changed.
    fn run_sweep(
        campaigns: &mut Vec<CampaignRow>,
        flags: &mut BTreeMap<Uuid, bool>,
        now: i64,
    ) -> usize {
        let mut changed = 0;
        campaigns.retain_mut(|c| match sweep_action(c, now) {
            SweepAction::Delete => {
                for p in c.products() {
                    if let Some(f) = flags.get_mut(&p.id) {
                        *f = false;
                    }
                }
                changed += 1;
                false
            }
            SweepAction::Flip { active } => {
                for p in c.products() {
                    if let Some(f) = flags.get_mut(&p.id) {
                        *f = active;
                    }
                }
                c.sale_products = c.with_snapshot_flags(active);
                c.is_active = active;
                changed += 1;
                true
            }
            SweepAction::Keep => true,
        });
        changed
    }

    #[test]
    fn sweep_action_transitions() {
        let mut c = campaign(100, 200);
        assert_eq!(sweep_action(&c, 50), SweepAction::Keep);
        assert_eq!(sweep_action(&c, 150), SweepAction::Flip { active: true });
        c.is_active = true;
        assert_eq!(sweep_action(&c, 150), SweepAction::Keep);
        assert_eq!(sweep_action(&c, 250), SweepAction::Delete);
        c.is_active = false;
        assert_eq!(sweep_action(&c, 250), SweepAction::Delete);
        // a scheduled campaign stored active gets switched back off
        c.is_active = true;
        assert_eq!(sweep_action(&c, 50), SweepAction::Flip { active: false });
    }

    #[test]
    fn expiry_sweep_rerun_changes_nothing() {
        let kept = Uuid::new_v4();
        // snapshot pointing at a product no longer in the catalog
        let gone = Uuid::new_v4();
        let mut c = campaign(0, 100);
        c.is_active = true;
        c.sale_products = serde_json::json!([snapshot(kept, true), snapshot(gone, true)]);
        let mut campaigns = vec![c];
        let mut flags = BTreeMap::from([(kept, true)]);

        assert_eq!(run_sweep(&mut campaigns, &mut flags, 150), 1);
        assert!(campaigns.is_empty());
        assert!(!flags[&kept]);

        let before = flags.clone();
        assert_eq!(run_sweep(&mut campaigns, &mut flags, 150), 0);
        assert_eq!(flags, before);
    }

    #[test]
    fn activation_sweep_rerun_is_stable() {
        let pid = Uuid::new_v4();
        let mut c = campaign(100, 200);
        c.sale_products = serde_json::json!([snapshot(pid, false)]);
        let mut campaigns = vec![c];
        let mut flags = BTreeMap::from([(pid, false)]);

        assert_eq!(run_sweep(&mut campaigns, &mut flags, 150), 1);
        assert!(campaigns[0].is_active);
        assert!(flags[&pid]);
        assert_eq!(campaigns[0].sale_products[0]["is_flash_sale"], true);

        assert_eq!(run_sweep(&mut campaigns, &mut flags, 150), 0);
        assert!(campaigns[0].is_active);
    }
}
