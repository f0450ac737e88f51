//! Damage metrics over range: alpha strike, maximum and sustained damage per second.

use super::{heat_budget_ratios, weapon_groups, HeatModel, RangeMetric, WeaponGroup};
use crate::attribute::Modifier;
use crate::loadout::Loadout;

/// Damage of firing every offensive weapon once.
pub struct AlphaStrike {
    groups: Vec<WeaponGroup>,
    modifiers: Vec<Modifier>,
}

impl AlphaStrike {
    pub fn new(loadout: &Loadout, modifiers: &[Modifier]) -> Self {
        Self {
            groups: weapon_groups(loadout),
            modifiers: modifiers.to_vec(),
        }
    }
}

impl RangeMetric for AlphaStrike {
    fn at(&self, range: f64) -> f64 {
        self.groups
            .iter()
            .filter_map(|g| {
                let w = g.item.weapon()?;
                Some(
                    w.damage.value(&self.modifiers)
                        * w.range.effectiveness(range, &self.modifiers)
                        * g.count as f64,
                )
            })
            .sum()
    }
}

/// Damage per second with every weapon firing on cooldown, ignoring heat.
pub struct MaxDps {
    groups: Vec<WeaponGroup>,
    modifiers: Vec<Modifier>,
}

impl MaxDps {
    pub fn new(loadout: &Loadout, modifiers: &[Modifier]) -> Self {
        Self {
            groups: weapon_groups(loadout),
            modifiers: modifiers.to_vec(),
        }
    }
}

impl RangeMetric for MaxDps {
    fn at(&self, range: f64) -> f64 {
        self.groups
            .iter()
            .filter_map(|g| {
                let w = g.item.weapon()?;
                Some(
                    w.damage_per_second(&self.modifiers)
                        * w.range.effectiveness(range, &self.modifiers)
                        * g.count as f64,
                )
            })
            .sum()
    }
}

/// Damage per second the loadout can keep up without overheating.
pub struct SustainedDps {
    ratios: Vec<(WeaponGroup, f64)>,
    modifiers: Vec<Modifier>,
}

impl SustainedDps {
    pub fn new(loadout: &Loadout, modifiers: &[Modifier], heat: &dyn HeatModel) -> Self {
        Self {
            ratios: heat_budget_ratios(loadout, modifiers, heat.dissipation()),
            modifiers: modifiers.to_vec(),
        }
    }

    /// Fraction of the time each weapon group gets to fire.
    pub fn ratios(&self) -> &[(WeaponGroup, f64)] {
        &self.ratios
    }
}

impl RangeMetric for SustainedDps {
    fn at(&self, range: f64) -> f64 {
        self.ratios
            .iter()
            .filter_map(|(g, ratio)| {
                let w = g.item.weapon()?;
                Some(
                    w.damage_per_second(&self.modifiers)
                        * w.range.effectiveness(range, &self.modifiers)
                        * g.count as f64
                        * ratio,
                )
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::HeatDissipation;
    use super::*;
    use crate::catalog::test_catalog;

    #[test]
    fn alpha_follows_effectiveness() {
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let alpha = AlphaStrike::new(&l, &[]);
        // LRMs do nothing point blank.
        assert!((alpha.at(0.0) - 10.0).abs() < 1e-9);
        assert!((alpha.at(200.0) - 21.0).abs() < 1e-9);
        assert!((alpha.at(405.0) - (5.0 + 11.0)).abs() < 1e-9);
        assert_eq!(alpha.at(2000.0), 0.0);
    }

    #[test]
    fn max_dps_sums_groups() {
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let max = MaxDps::new(&l, &[]);
        assert!((max.at(200.0) - (2.5 + 11.0 / 3.75)).abs() < 1e-9);
    }

    #[test]
    fn sustained_limited_by_heat() {
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let heat = HeatDissipation::new(&l, &[]);
        let sustained = SustainedDps::new(&l, &[], &heat);
        assert!((sustained.at(200.0) - 2.75).abs() < 1e-9);
        assert!(sustained.at(200.0) <= MaxDps::new(&l, &[]).at(200.0));
    }

    #[test]
    fn custom_heat_model() {
        struct Frozen;
        impl HeatModel for Frozen {
            fn dissipation(&self) -> f64 {
                1000.0
            }
        }
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let sustained = SustainedDps::new(&l, &[], &Frozen);
        assert!((sustained.at(200.0) - MaxDps::new(&l, &[]).at(200.0)).abs() < 1e-12);
    }
}
