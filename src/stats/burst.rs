//! Burst damage: expected damage dealt from time zero up to `t`.

use super::{weapon_groups, WeaponGroup};
use crate::attribute::Modifier;
use crate::catalog::WeaponStats;
use crate::loadout::Loadout;

/// A damage signal integrated from time zero.
///
/// Implementations return 0 for negative times and never decrease as `t` grows.
pub trait IntegratedSignal {
    fn integrate_from_zero_to(&self, t: f64) -> f64;
}

/// Equal impulses every `period` seconds, the first at time zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratedImpulseTrain {
    pub period: f64,
    pub amplitude: f64,
}

impl IntegratedSignal for IntegratedImpulseTrain {
    fn integrate_from_zero_to(&self, t: f64) -> f64 {
        if t < 0.0 || self.period <= 0.0 {
            return 0.0;
        }
        self.amplitude * ((t / self.period).floor() + 1.0)
    }
}

/// A weapon that fires two shots per cycle unless it jams, in which case it fires
/// one and then stays silent for `jam_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleFireBurstSignal {
    pub cycle_time: f64,
    pub jam_probability: f64,
    pub jam_time: f64,
    pub damage: f64,
}

impl DoubleFireBurstSignal {
    pub fn new(weapon: &WeaponStats, modifiers: &[Modifier]) -> Option<Self> {
        let double_fire = weapon.double_fire.as_ref()?;
        Some(Self {
            cycle_time: weapon.period(modifiers),
            jam_probability: double_fire.jam_probability.value(modifiers).clamp(0.0, 1.0),
            jam_time: double_fire.jam_time.value(modifiers).max(0.0),
            damage: weapon.damage.value(modifiers),
        })
    }

    /// Expected shots fired in `[0, t]`.
    ///
    /// `shots(t) = p (1 + shots(t - jam - cycle)) + (1 - p) (2 + shots(t - cycle))`,
    /// zero for `t < 0`. The remaining time only depends on how many jammed (`j`)
    /// and clean (`k`) cycles came before, so the recursion is tabulated over
    /// `(j, k)` from the far end back to `(0, 0)`. Row `j` only reads rows `j`
    /// and `j + 1`, so two rows are kept.
    pub fn expected_shots(&self, t: f64) -> f64 {
        if t < 0.0 || self.cycle_time <= 0.0 {
            return 0.0;
        }
        let p = self.jam_probability;
        let jammed = self.jam_time + self.cycle_time;
        let j_max = (t / jammed).floor() as usize + 1;
        let k_max = (t / self.cycle_time).floor() as usize + 1;
        let mut next = vec![0.0f64; k_max + 2];
        let mut row = vec![0.0f64; k_max + 2];
        for j in (0..=j_max).rev() {
            for k in (0..=k_max).rev() {
                let remaining = t - j as f64 * jammed - k as f64 * self.cycle_time;
                row[k] = if remaining < 0.0 {
                    0.0
                } else {
                    p * (1.0 + next[k]) + (1.0 - p) * (2.0 + row[k + 1])
                };
            }
            std::mem::swap(&mut row, &mut next);
        }
        next[0]
    }
}

impl IntegratedSignal for DoubleFireBurstSignal {
    fn integrate_from_zero_to(&self, t: f64) -> f64 {
        self.damage * self.expected_shots(t)
    }
}

/// Expected damage at a range within the first `t` seconds of shooting.
pub struct BurstDamageOverTime {
    groups: Vec<WeaponGroup>,
    modifiers: Vec<Modifier>,
}

impl BurstDamageOverTime {
    pub fn new(loadout: &Loadout, modifiers: &[Modifier]) -> Self {
        Self {
            groups: weapon_groups(loadout),
            modifiers: modifiers.to_vec(),
        }
    }

    fn signal(&self, weapon: &WeaponStats) -> Box<dyn IntegratedSignal> {
        match DoubleFireBurstSignal::new(weapon, &self.modifiers) {
            Some(double_fire) => Box::new(double_fire),
            None => Box::new(IntegratedImpulseTrain {
                period: weapon.period(&self.modifiers),
                amplitude: weapon.damage.value(&self.modifiers),
            }),
        }
    }

    pub fn calculate(&self, range: f64, t: f64) -> f64 {
        self.groups
            .iter()
            .filter_map(|g| {
                let w = g.item.weapon()?;
                let effectiveness = w.range.effectiveness(range, &self.modifiers);
                Some(self.signal(w).integrate_from_zero_to(t) * effectiveness * g.count as f64)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::catalog::test_catalog;
    use proptest::prelude::*;

    fn uac5() -> DoubleFireBurstSignal {
        DoubleFireBurstSignal {
            cycle_time: 1.66,
            jam_probability: 0.15,
            jam_time: 5.0,
            damage: 5.0,
        }
    }

    #[test]
    fn impulse_train_counts_shots() {
        let s = IntegratedImpulseTrain {
            period: 4.0,
            amplitude: 5.0,
        };
        assert_eq!(s.integrate_from_zero_to(-0.1), 0.0);
        assert_eq!(s.integrate_from_zero_to(0.0), 5.0);
        assert_eq!(s.integrate_from_zero_to(3.99), 5.0);
        assert_eq!(s.integrate_from_zero_to(4.0), 10.0);
    }

    #[test]
    fn double_fire_first_cycles() {
        let s = uac5();
        assert_eq!(s.expected_shots(-1.0), 0.0);
        assert!((s.expected_shots(0.0) - 1.85).abs() < 1e-12);
        // One more clean cycle fits; a jam does not.
        assert!((s.expected_shots(1.66) - (0.15 + 0.85 * (2.0 + 1.85))).abs() < 1e-9);
        assert!((s.integrate_from_zero_to(0.0) - 9.25).abs() < 1e-12);
    }

    #[test]
    fn long_windows_stay_cheap() {
        let s = uac5();
        let shots = s.expected_shots(3600.0);
        // Between always jamming and never jamming.
        assert!(shots >= (3600.0 / 6.66f64).floor());
        assert!(shots <= 2.0 * ((3600.0 / 1.66f64).floor() + 1.0));
    }

    #[test]
    fn never_jamming_is_twice_the_impulse_train() {
        let s = DoubleFireBurstSignal {
            jam_probability: 0.0,
            ..uac5()
        };
        let train = IntegratedImpulseTrain {
            period: 1.66,
            amplitude: 5.0,
        };
        for t in [0.0, 1.0, 3.5, 9.9] {
            assert!((s.integrate_from_zero_to(t) - 2.0 * train.integrate_from_zero_to(t)).abs() < 1e-9);
        }
    }

    #[test]
    fn burst_over_loadout() {
        let c = test_catalog();
        let l = laser_hunchie(&c);
        let burst = BurstDamageOverTime::new(&l, &[]);
        assert!((burst.calculate(100.0, 0.0) - (10.0 + 11.0 * (100.0 / 180.0))).abs() < 1e-9);
        assert!((burst.calculate(200.0, 4.0) - (20.0 + 22.0)).abs() < 1e-9);
        assert_eq!(burst.calculate(200.0, -1.0), 0.0);

        let omni = loadout_with(&c, "TBR-PRIME", &[]);
        assert_eq!(BurstDamageOverTime::new(&omni, &[]).calculate(100.0, 10.0), 0.0);
    }

    proptest! {
        #[test]
        fn double_fire_non_decreasing(
            p in 0.0f64..1.0,
            jam in 0.0f64..8.0,
            cycle in 0.2f64..5.0,
            t in 0.0f64..30.0,
            dt in 0.0f64..5.0,
        ) {
            let s = DoubleFireBurstSignal { cycle_time: cycle, jam_probability: p, jam_time: jam, damage: 1.0 };
            let a = s.integrate_from_zero_to(t);
            let b = s.integrate_from_zero_to(t + dt);
            prop_assert!(a >= 0.0);
            prop_assert!(b + 1e-9 >= a);
        }
    }
}
