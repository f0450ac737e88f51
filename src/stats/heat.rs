//! Heat: how much heat per second a loadout sheds, and how that budget is shared between weapons.

use super::{weapon_groups, WeaponGroup};
use crate::attribute::Modifier;
use crate::loadout::Loadout;

/// Source of a loadout's sustainable heat budget.
pub trait HeatModel {
    /// Heat per second the mech can shed indefinitely.
    fn dissipation(&self) -> f64;
}

/// Standard model: every heat sink, equipped or built into the engine, sheds the
/// heat sink upgrade's dissipation.
pub struct HeatDissipation<'a> {
    loadout: &'a Loadout,
    modifiers: &'a [Modifier],
}

impl<'a> HeatDissipation<'a> {
    pub fn new(loadout: &'a Loadout, modifiers: &'a [Modifier]) -> Self {
        Self { loadout, modifiers }
    }

    pub fn heat_sinks(&self) -> u32 {
        let internal = self
            .loadout
            .engine()
            .and_then(|e| e.engine())
            .map(|e| e.internal_heat_sinks)
            .unwrap_or(0);
        self.loadout.heat_sinks_count() + internal
    }
}

impl HeatModel for HeatDissipation<'_> {
    fn dissipation(&self) -> f64 {
        let per_sink = self
            .loadout
            .upgrades()
            .heat_sink
            .heat_sink
            .heat_sink()
            .map(|h| h.dissipation.value(self.modifiers))
            .unwrap_or(0.0);
        per_sink * self.heat_sinks() as f64
    }
}

/// Fraction of the time each weapon group can fire within `dissipation`.
///
/// Groups are served by damage per heat, best first: each gets ratio 1 while
/// the budget lasts, one gets the partial remainder, the rest get 0. Heat-free
/// weapons always fire.
pub fn heat_budget_ratios(
    loadout: &Loadout,
    modifiers: &[Modifier],
    dissipation: f64,
) -> Vec<(WeaponGroup, f64)> {
    let mut groups: Vec<(WeaponGroup, f64, f64)> = weapon_groups(loadout)
        .into_iter()
        .filter_map(|g| {
            let w = g.item.weapon()?;
            let heat = w.heat.value(modifiers);
            let efficiency = if heat > 0.0 {
                w.damage.value(modifiers) / heat
            } else {
                f64::INFINITY
            };
            let heat_rate = w.heat_per_second(modifiers) * g.count as f64;
            Some((g, efficiency, heat_rate))
        })
        .collect();
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut budget = dissipation.max(0.0);
    groups
        .into_iter()
        .map(|(g, _, heat_rate)| {
            let ratio = if heat_rate <= 0.0 {
                1.0
            } else if budget >= heat_rate {
                budget -= heat_rate;
                1.0
            } else {
                let partial = budget / heat_rate;
                budget = 0.0;
                partial
            };
            (g, ratio)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::catalog::{test_catalog, Location};

    #[test]
    fn engine_heat_sinks_count() {
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let h = HeatDissipation::new(&l, &[]);
        assert_eq!(h.heat_sinks(), 10);
        assert!((h.dissipation() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pilot_skill_raises_dissipation() {
        let c = test_catalog();
        let l = loadout_with(
            &c,
            "HBK-4P",
            &[
                (Location::CenterTorso, "STD ENGINE 250"),
                (Location::LeftTorso, "HEAT SINK"),
                (Location::LeftTorso, "HEAT SINK"),
            ],
        );
        let cool = vec![c.lookup_modifier("COOL RUN").unwrap()];
        let h = HeatDissipation::new(&l, &cool);
        assert_eq!(h.heat_sinks(), 12);
        assert!((h.dissipation() - 1.2 * 1.075).abs() < 1e-9);
    }

    #[test]
    fn budget_goes_to_best_damage_per_heat() {
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let ratios = heat_budget_ratios(&l, &[], 1.0);
        assert_eq!(ratios[0].0.item.name, "LRM 10");
        // LRM 10 needs 4 / 3.75 heat per second.
        assert!((ratios[0].1 - 0.9375).abs() < 1e-9);
        assert_eq!(ratios[1].1, 0.0);

        let plenty = heat_budget_ratios(&l, &[], 100.0);
        assert!(plenty.iter().all(|(_, r)| *r == 1.0));
    }
}
