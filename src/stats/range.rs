//! Range effectiveness: a weapon's damage multiplier as a function of distance.

use crate::attribute::{Attribute, Modifier};
use serde::{Deserialize, Serialize};

/// Piecewise-linear falloff. Zero effect up to `zero`, ramping to full effect at `min`,
/// full effect through `long`, falling to zero effect at `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeProfile {
    pub zero: Attribute,
    pub min: Attribute,
    pub long: Attribute,
    pub max: Attribute,
}

impl RangeProfile {
    /// Build a profile whose long/max ranges are selected by `selectors` with specifier `range`.
    pub fn new(zero: f64, min: f64, long: f64, max: f64, selectors: &[String]) -> Self {
        Self {
            zero: Attribute::new(zero, selectors.to_vec(), Some("minrange")),
            min: Attribute::new(min, selectors.to_vec(), Some("minrange")),
            long: Attribute::new(long, selectors.to_vec(), Some("range")),
            max: Attribute::new(max, selectors.to_vec(), Some("range")),
        }
    }

    /// Breakpoint distances `[zero, min, long, max]` under `modifiers`.
    pub fn breakpoints(&self, modifiers: &[Modifier]) -> [f64; 4] {
        let zero = self.zero.value(modifiers);
        let min = self.min.value(modifiers).max(zero);
        let long = self.long.value(modifiers).max(min);
        let max = self.max.value(modifiers).max(long);
        [zero, min, long, max]
    }

    /// Damage multiplier at `range`, always within `[0, 1]`.
    pub fn effectiveness(&self, range: f64, modifiers: &[Modifier]) -> f64 {
        let [zero, min, long, max] = self.breakpoints(modifiers);
        let e = if range < zero {
            0.0
        } else if range < min {
            (range - zero) / (min - zero)
        } else if range <= long {
            1.0
        } else if range < max {
            1.0 - (range - long) / (max - long)
        } else {
            0.0
        };
        e.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Operation;

    fn lrm() -> RangeProfile {
        RangeProfile::new(0.0, 180.0, 1000.0, 1000.0, &["missile".to_string()])
    }

    fn laser() -> RangeProfile {
        RangeProfile::new(0.0, 0.0, 270.0, 540.0, &["energy".to_string()])
    }

    #[test]
    fn breakpoint_values_exact() {
        let p = laser();
        assert_eq!(p.effectiveness(0.0, &[]), 1.0);
        assert_eq!(p.effectiveness(270.0, &[]), 1.0);
        assert_eq!(p.effectiveness(540.0, &[]), 0.0);
        assert!((p.effectiveness(405.0, &[]) - 0.5).abs() < 1e-12);

        let m = lrm();
        assert_eq!(m.effectiveness(0.0, &[]), 0.0);
        assert!((m.effectiveness(90.0, &[]) - 0.5).abs() < 1e-12);
        assert_eq!(m.effectiveness(180.0, &[]), 1.0);
        assert_eq!(m.effectiveness(1000.0, &[]), 1.0);
        assert_eq!(m.effectiveness(1000.1, &[]), 0.0);
    }

    #[test]
    fn effectiveness_bounded() {
        for p in [laser(), lrm()] {
            let mut r = 0.0;
            while r < 2000.0 {
                let e = p.effectiveness(r, &[]);
                assert!((0.0..=1.0).contains(&e), "range {} gave {}", r, e);
                r += 7.5;
            }
        }
    }

    #[test]
    fn range_quirk_stretches_long_and_max() {
        let p = laser();
        let mods = vec![Modifier::new(
            "energy range",
            &["energy"],
            Some("range"),
            Operation::Multiplicative,
            0.1,
        )];
        let [_, _, long, max] = p.breakpoints(&mods);
        assert!((long - 297.0).abs() < 1e-9);
        assert!((max - 594.0).abs() < 1e-9);
        assert_eq!(p.effectiveness(297.0, &mods), 1.0);
    }
}
