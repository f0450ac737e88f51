//! Combat statistics computed from a committed loadout.
//!
//! Every statistic is a read-only view: build it over a `&Loadout` between
//! edits, never while a command is half applied.

mod burst;
mod destruction;
mod dps;
mod heat;
mod range;

pub use burst::{BurstDamageOverTime, DoubleFireBurstSignal, IntegratedImpulseTrain, IntegratedSignal};
pub use destruction::{ComponentDestructionSimulator, ItemDestruction};
pub use dps::{AlphaStrike, MaxDps, SustainedDps};
pub use heat::{heat_budget_ratios, HeatDissipation, HeatModel};
pub use range::RangeProfile;

use crate::attribute::Modifier;
use crate::catalog::Item;
use crate::loadout::Loadout;
use serde::Serialize;
use std::sync::Arc;

/// Identical offensive weapons counted together.
#[derive(Debug, Clone)]
pub struct WeaponGroup {
    pub item: Arc<Item>,
    pub count: u32,
}

/// Offensive weapons of a loadout grouped by item, in equip order of first appearance.
pub fn weapon_groups(loadout: &Loadout) -> Vec<WeaponGroup> {
    let mut groups: Vec<WeaponGroup> = Vec::new();
    for (_, item) in loadout.items_all() {
        if !item.is_offensive_weapon() {
            continue;
        }
        match groups.iter_mut().find(|g| g.item.id == item.id) {
            Some(g) => g.count += 1,
            None => groups.push(WeaponGroup {
                item: Arc::clone(item),
                count: 1,
            }),
        }
    }
    groups
}

/// A statistic that varies with distance to the target.
pub trait RangeMetric {
    fn at(&self, range: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangePoint {
    pub range: f64,
    pub value: f64,
}

/// Sorted, de-duplicated union of every weapon's range breakpoints (always includes 0).
///
/// Every metric built from range effectiveness is linear between two
/// consecutive entries, so sampling here is exact.
pub fn range_breakpoints(loadout: &Loadout, modifiers: &[Modifier]) -> Vec<f64> {
    let mut points = vec![0.0];
    for group in weapon_groups(loadout) {
        if let Some(w) = group.item.weapon() {
            points.extend(w.range.breakpoints(modifiers));
        }
    }
    points.retain(|p| p.is_finite() && *p >= 0.0);
    points.sort_by(|a, b| a.total_cmp(b));
    points.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    points
}

/// Evaluates `metric` at each range, merging in extra sample ranges.
pub fn dps_series(metric: &dyn RangeMetric, breakpoints: &[f64], extra: &[f64]) -> Vec<RangePoint> {
    let mut ranges: Vec<f64> = breakpoints.iter().chain(extra.iter()).copied().collect();
    ranges.sort_by(|a, b| a.total_cmp(b));
    ranges.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    ranges
        .into_iter()
        .map(|range| RangePoint {
            range,
            value: metric.at(range),
        })
        .collect()
}

/// Top speed in km/h: `rating × speed factor / tonnage`. Zero without an engine.
pub fn top_speed(loadout: &Loadout, modifiers: &[Modifier]) -> f64 {
    let Some(rating) = loadout.engine_rating() else {
        return 0.0;
    };
    let chassis = loadout.chassis();
    rating as f64 * chassis.speed_factor.value(modifiers) / chassis.mass
}
