//! Upgrade types: armor, internal structure, heat sinks and missile guidance.

use super::item::Item;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ArmorUpgrade {
    pub name: String,
    pub armor_per_ton: f64,
    /// Floating slots that must be found somewhere on the mech.
    pub dynamic_slots: u32,
}

impl ArmorUpgrade {
    pub fn armor_mass(&self, armor: u32) -> f64 {
        armor as f64 / self.armor_per_ton
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureUpgrade {
    pub name: String,
    /// Fraction of the chassis tonnage taken by internal structure.
    pub mass_fraction: f64,
    pub dynamic_slots: u32,
}

impl StructureUpgrade {
    /// Structure mass, rounded to the nearest half ton as the game does.
    pub fn structure_mass(&self, chassis_mass: f64) -> f64 {
        (chassis_mass * self.mass_fraction * 2.0).round() / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatSinkUpgrade {
    pub name: String,
    /// The only heat sink item this upgrade allows.
    pub heat_sink: Arc<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceUpgrade {
    pub name: String,
    /// Extra tonnage per missile launcher.
    pub tons_per_launcher: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum UpgradeDef {
    Armor {
        name: String,
        armor_per_ton: f64,
        #[serde(default)]
        dynamic_slots: u32,
    },
    Structure {
        name: String,
        mass_fraction: f64,
        #[serde(default)]
        dynamic_slots: u32,
    },
    HeatSink {
        name: String,
        heat_sink: String,
    },
    Guidance {
        name: String,
        #[serde(default)]
        tons_per_launcher: f64,
    },
}
