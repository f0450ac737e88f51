//! Advisory loadout warnings: severity, explanation, technical note.
//!
//! These never block an edit. A loadout that is legal can still be a poor
//! one, or over capacity after an upgrade swap, and the user should hear about it.

use crate::catalog::Location;
use crate::loadout::Loadout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warn,
    Crit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadoutWarning {
    pub code: String,
    pub severity: WarningSeverity,
    /// Short explanation for users.
    pub summary: String,
    /// Technical note with the numbers behind it.
    pub technical: String,
    pub locations: Vec<Location>,
}

impl LoadoutWarning {
    pub fn dynamic_slot_overflow(loadout: &Loadout, unallocated_armor: u32, unallocated_structure: u32) -> Self {
        Self {
            code: "DYNAMIC_SLOT_OVERFLOW".to_string(),
            severity: WarningSeverity::Crit,
            summary: format!(
                "{}: not enough free slots for the floating armor/structure slots.",
                loadout.name()
            ),
            technical: format!(
                "unallocated armor={} structure={} (armor upgrade {}, structure upgrade {})",
                unallocated_armor,
                unallocated_structure,
                loadout.upgrades().armor.name,
                loadout.upgrades().structure.name
            ),
            locations: Vec::new(),
        }
    }

    pub fn no_engine(loadout: &Loadout) -> Self {
        Self {
            code: "NO_ENGINE".to_string(),
            severity: WarningSeverity::Crit,
            summary: format!("{}: no engine equipped, the mech cannot move.", loadout.name()),
            technical: format!(
                "{} accepts engine ratings {}..={}",
                loadout.chassis().name,
                loadout.chassis().engine_min,
                loadout.chassis().engine_max
            ),
            locations: vec![Location::CenterTorso],
        }
    }

    pub fn unused_tonnage(loadout: &Loadout, free_mass: f64) -> Self {
        Self {
            code: "UNUSED_TONNAGE".to_string(),
            severity: WarningSeverity::Info,
            summary: format!("{}: {:.1} t of tonnage left unused.", loadout.name(), free_mass),
            technical: format!(
                "mass={:.2} max={:.2}",
                loadout.mass(),
                loadout.chassis().mass
            ),
            locations: Vec::new(),
        }
    }

    pub fn engine_heat_sink_slots_free(loadout: &Loadout, free_engine_slots: u32, outside: Vec<Location>) -> Self {
        Self {
            code: "ENGINE_HEAT_SINK_SLOTS_FREE".to_string(),
            severity: WarningSeverity::Warn,
            summary: format!(
                "{}: heat sinks use critical slots while the engine still has room for {}.",
                loadout.name(),
                free_engine_slots
            ),
            technical: format!(
                "engine heat sink slots free={} heat sinks outside the engine in {:?}",
                free_engine_slots, outside
            ),
            locations: outside,
        }
    }

    pub fn unarmored(loadout: &Loadout, locations: Vec<Location>) -> Self {
        Self {
            code: "UNARMORED".to_string(),
            severity: WarningSeverity::Warn,
            summary: format!("{}: {} location(s) carry no armor.", loadout.name(), locations.len()),
            technical: format!("armor total={} max={}", loadout.armor_total(), loadout.armor_max_total()),
            locations,
        }
    }
}

/// Tonnage below which unused mass is not worth reporting.
const UNUSED_TONNAGE_THRESHOLD: f64 = 0.5;

/// All warnings for a committed loadout.
pub fn check(loadout: &Loadout) -> Vec<LoadoutWarning> {
    let mut out = Vec::new();

    let distribution = loadout.slot_distribution();
    if distribution.overflow() > 0 {
        out.push(LoadoutWarning::dynamic_slot_overflow(
            loadout,
            distribution.unallocated_armor,
            distribution.unallocated_structure,
        ));
    }

    if loadout.engine().is_none() {
        out.push(LoadoutWarning::no_engine(loadout));
    }

    let free_mass = loadout.free_mass();
    if free_mass >= UNUSED_TONNAGE_THRESHOLD {
        out.push(LoadoutWarning::unused_tonnage(loadout, free_mass));
    }

    let ct = loadout.component(Location::CenterTorso);
    let free_engine_slots = ct
        .engine_heat_sink_capacity()
        .saturating_sub(ct.engine_heat_sinks());
    if free_engine_slots > 0 {
        let outside: Vec<Location> = loadout
            .components()
            .iter()
            .filter(|c| c.location() != Location::CenterTorso)
            .filter(|c| c.items_equipped().iter().any(|i| i.is_heat_sink()))
            .map(|c| c.location())
            .collect();
        if !outside.is_empty() {
            out.push(LoadoutWarning::engine_heat_sink_slots_free(
                loadout,
                free_engine_slots,
                outside,
            ));
        }
    }

    let unarmored: Vec<Location> = loadout
        .components()
        .iter()
        .filter(|c| c.armor_total() == 0)
        .map(|c| c.location())
        .collect();
    if !unarmored.is_empty() {
        out.push(LoadoutWarning::unarmored(loadout, unarmored));
    }

    for w in &out {
        tracing::debug!("{} {:?}: {}", w.code, w.severity, w.summary);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_catalog;
    use crate::command::{Command, CommandStack, LoadoutOp, LoadoutRecipe};
    use crate::stats::testing::loadout_with;

    fn codes(warnings: &[LoadoutWarning]) -> Vec<&str> {
        warnings.iter().map(|w| w.code.as_str()).collect()
    }

    #[test]
    fn empty_loadout_warnings() {
        let c = test_catalog();
        let l = Loadout::from_catalog(&c, "HBK-4P", "empty").unwrap();
        let w = check(&l);
        assert_eq!(codes(&w), ["NO_ENGINE", "UNUSED_TONNAGE", "UNARMORED"]);
        assert_eq!(w[2].locations.len(), 8);
    }

    #[test]
    fn heat_sinks_outside_a_roomy_engine() {
        let c = test_catalog();
        let l = loadout_with(
            &c,
            "HBK-4P",
            &[
                (Location::LeftTorso, "HEAT SINK"),
                (Location::CenterTorso, "STD ENGINE 300"),
            ],
        );
        let w = check(&l);
        let hs = w
            .iter()
            .find(|w| w.code == "ENGINE_HEAT_SINK_SLOTS_FREE")
            .unwrap();
        assert_eq!(hs.locations, vec![Location::LeftTorso]);
        assert_eq!(hs.severity, WarningSeverity::Warn);
    }

    #[test]
    fn overflow_reported_when_free_slots_run_out() {
        let c = test_catalog();
        let mut l = Loadout::from_catalog(&c, "HBK-4P", "crammed").unwrap();
        l.set_structure_upgrade(c.lookup_structure("ENDO-STEEL STRUCTURE").unwrap());
        l.set_armor_upgrade(c.lookup_armor("FERRO-FIBROUS ARMOR").unwrap());
        let ac20 = c.lookup_item("AC/20").unwrap();
        for loc in [Location::RightTorso, Location::LeftTorso, Location::LeftArm] {
            l.component_mut(loc).add_item(ac20.clone());
        }
        let w = check(&l);
        let overflow = w.iter().find(|w| w.code == "DYNAMIC_SLOT_OVERFLOW").unwrap();
        assert_eq!(overflow.severity, WarningSeverity::Crit);
        assert!(overflow.technical.contains("structure=1"));
    }

    #[test]
    fn fully_armored_omni_is_clean() {
        let c = test_catalog();
        let mut stack = CommandStack::new(loadout_with(&c, "TBR-PRIME", &[]), 8);
        stack
            .push_and_apply(Command::op(LoadoutOp::set_armor_upgrade(
                c.lookup_armor("FERRO-FIBROUS ARMOR").unwrap(),
            )))
            .unwrap();
        stack
            .push_and_apply(Command::composite(LoadoutRecipe::MaxArmor { front_back_ratio: 3.0 }))
            .unwrap();
        let w = check(stack.target());
        assert!(codes(&w).iter().all(|c| *c != "DYNAMIC_SLOT_OVERFLOW" && *c != "UNARMORED"));
    }
}
