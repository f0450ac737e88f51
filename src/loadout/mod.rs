//! A configured mech: eight components, upgrade selection and pilot modifiers.
//!
//! Mutators are crate-private; everything outside the crate edits a loadout
//! through [`crate::command`] so each change is undoable and all-or-nothing.

mod component;
mod distributor;
mod garage;
mod record;

pub use component::ConfiguredComponent;
pub use distributor::{DynamicSlotDistributor, SlotDistribution};
pub use garage::{Garage, GarageError};
pub use record::{ComponentRecord, LoadoutRecord, RecordError, UpgradesRecord};

use crate::attribute::Modifier;
use crate::catalog::{
    ArmorSide, ArmorUpgrade, Catalog, CatalogError, Chassis, GuidanceUpgrade, HardPointType,
    HeatSinkUpgrade, Item, ItemKind, Location, StructureUpgrade,
};
use serde::Serialize;
use std::sync::Arc;
use strum::Display;

/// Slack for floating point noise in tonnage sums.
pub(crate) const MASS_TOLERANCE: f64 = 1e-9;

/// Outcome of an equip or toggle legality check. Refusals are values, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum EquipResult {
    #[strum(to_string = "success")]
    Success,
    #[strum(to_string = "the location does not support this item")]
    NotSupported,
    #[strum(to_string = "no free hardpoint of that type")]
    NoFreeHardPoints,
    #[strum(to_string = "not enough free slots")]
    NotEnoughSlots,
    #[strum(to_string = "the component already has C.A.S.E.")]
    ComponentAlreadyHasCase,
    #[strum(to_string = "the item cannot be toggled")]
    NotToggleable,
    #[strum(to_string = "a large-bore weapon is equipped in this arm")]
    LargeBoreWeaponPresent,
    #[strum(to_string = "the lower arm actuator must be on while the hand actuator is")]
    LaaBeforeHa,
    #[strum(to_string = "too heavy")]
    TooHeavy,
    #[strum(to_string = "an engine is already equipped")]
    EngineAlreadyEquipped,
    #[strum(to_string = "jump jet capacity reached")]
    JumpJetCapacityReached,
    #[strum(to_string = "incompatible with the selected upgrades")]
    IncompatibleUpgrades,
}

impl EquipResult {
    pub fn is_success(self) -> bool {
        self == EquipResult::Success
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadoutError {
    #[error("cannot equip {item} on {location}: {result}")]
    Equip {
        item: String,
        location: Location,
        result: EquipResult,
    },
    #[error("cannot toggle {item} on {location}: {result}")]
    Toggle {
        item: String,
        location: Location,
        result: EquipResult,
    },
    #[error("{item} is not equipped on {location}")]
    ItemNotPresent { item: String, location: Location },
    #[error("{location} has no {side} armor")]
    InvalidArmorSide { location: Location, side: ArmorSide },
    #[error("{value} armor on {location} ({side}) exceeds the maximum of {max}")]
    ArmorOutOfRange {
        location: Location,
        side: ArmorSide,
        value: u32,
        max: u32,
    },
    #[error("loadout would weigh {mass:.2} t, over the {max:.2} t limit")]
    TooHeavy { mass: f64, max: f64 },
    #[error("{upgrade} needs {needed} free slots, only {free} available")]
    NotEnoughSlotsForUpgrade {
        upgrade: String,
        needed: u32,
        free: u32,
    },
    #[error("cannot switch to {upgrade}: {reason}")]
    UpgradeConflict { upgrade: String, reason: String },
    #[error("removing {item} from {location} would leave its heat sinks without slots")]
    EngineHeatSinksStranded { item: String, location: Location },
    #[error("loadout name must not be empty")]
    EmptyName,
}

/// The four upgrade selections of a loadout.
#[derive(Debug, Clone, PartialEq)]
pub struct Upgrades {
    pub armor: Arc<ArmorUpgrade>,
    pub structure: Arc<StructureUpgrade>,
    pub heat_sink: Arc<HeatSinkUpgrade>,
    pub guidance: Arc<GuidanceUpgrade>,
}

impl Upgrades {
    /// The chassis' stock upgrades.
    pub fn defaults_for(chassis: &Chassis, catalog: &Catalog) -> Result<Self, CatalogError> {
        Ok(Self {
            armor: catalog.lookup_armor(&chassis.default_armor)?,
            structure: catalog.lookup_structure(&chassis.default_structure)?,
            heat_sink: catalog.lookup_heat_sink_upgrade(&chassis.default_heat_sink)?,
            guidance: catalog.lookup_guidance(&chassis.default_guidance)?,
        })
    }

    pub fn dynamic_slots(&self) -> u32 {
        self.armor.dynamic_slots + self.structure.dynamic_slots
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loadout {
    name: String,
    chassis: Arc<Chassis>,
    components: Vec<ConfiguredComponent>,
    upgrades: Upgrades,
    pilot_modifiers: Vec<Modifier>,
}

impl Loadout {
    pub fn new(name: impl Into<String>, chassis: Arc<Chassis>, upgrades: Upgrades) -> Self {
        let components = Location::ALL
            .iter()
            .map(|loc| ConfiguredComponent::new(Arc::clone(&chassis), *loc))
            .collect();
        Self {
            name: name.into(),
            chassis,
            components,
            upgrades,
            pilot_modifiers: Vec::new(),
        }
    }

    /// Empty loadout of `chassis` with its stock upgrades.
    pub fn from_catalog(catalog: &Catalog, chassis: &str, name: &str) -> Result<Self, CatalogError> {
        let chassis = catalog.lookup_chassis(chassis)?;
        let upgrades = Upgrades::defaults_for(&chassis, catalog)?;
        Ok(Self::new(name, chassis, upgrades))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chassis(&self) -> &Arc<Chassis> {
        &self.chassis
    }

    pub fn component(&self, location: Location) -> &ConfiguredComponent {
        &self.components[location.index()]
    }

    pub fn components(&self) -> &[ConfiguredComponent] {
        &self.components
    }

    pub fn upgrades(&self) -> &Upgrades {
        &self.upgrades
    }

    pub fn pilot_modifiers(&self) -> &[Modifier] {
        &self.pilot_modifiers
    }

    /// Chassis quirks followed by pilot modifiers; what every statistic evaluates against.
    pub fn modifiers(&self) -> Vec<Modifier> {
        self.chassis
            .quirks
            .iter()
            .chain(self.pilot_modifiers.iter())
            .cloned()
            .collect()
    }

    /// Every present item with its location, fixed items included.
    pub fn items_all(&self) -> impl Iterator<Item = (Location, &Arc<Item>)> {
        self.components
            .iter()
            .flat_map(|c| c.items_all().map(move |i| (c.location(), i)))
    }

    pub fn items_equipped(&self) -> impl Iterator<Item = (Location, &Arc<Item>)> {
        self.components
            .iter()
            .flat_map(|c| c.items_equipped().iter().map(move |i| (c.location(), i)))
    }

    pub fn engine(&self) -> Option<&Arc<Item>> {
        self.component(Location::CenterTorso).engine()
    }

    pub fn engine_rating(&self) -> Option<u32> {
        self.engine().and_then(|e| e.engine()).map(|e| e.rating)
    }

    pub fn heat_sinks_count(&self) -> u32 {
        self.items_equipped().filter(|(_, i)| i.is_heat_sink()).count() as u32
    }

    pub fn jump_jets_count(&self) -> u32 {
        self.items_equipped()
            .filter(|(_, i)| matches!(i.kind, ItemKind::JumpJet))
            .count() as u32
    }

    /// Weapons that need the guidance upgrade's extra tonnage.
    pub fn missile_launchers_count(&self) -> u32 {
        self.items_equipped()
            .filter(|(_, i)| i.weapon().is_some() && i.hardpoint == HardPointType::Missile)
            .count() as u32
    }

    pub fn armor_total(&self) -> u32 {
        self.components.iter().map(|c| c.armor_total()).sum()
    }

    pub fn armor_max_total(&self) -> u32 {
        self.components.iter().map(|c| c.internal().armor_max()).sum()
    }

    pub fn armor_mass(&self) -> f64 {
        self.upgrades.armor.armor_mass(self.armor_total())
    }

    pub fn structure_mass(&self) -> f64 {
        self.upgrades.structure.structure_mass(self.chassis.mass)
    }

    /// Extra tonnage one copy of `item` costs on top of its own mass.
    pub fn extra_mass_for(&self, item: &Item) -> f64 {
        if item.weapon().is_some() && item.hardpoint == HardPointType::Missile {
            self.upgrades.guidance.tons_per_launcher
        } else {
            0.0
        }
    }

    pub fn items_mass(&self) -> f64 {
        self.items_all()
            .map(|(_, i)| i.mass + self.extra_mass_for(i))
            .sum()
    }

    pub fn mass(&self) -> f64 {
        self.structure_mass() + self.armor_mass() + self.items_mass()
    }

    pub fn free_mass(&self) -> f64 {
        self.chassis.mass - self.mass()
    }

    pub fn slots_total(&self) -> u32 {
        self.components.iter().map(|c| c.slots_total()).sum()
    }

    pub fn slots_used(&self) -> u32 {
        self.components.iter().map(|c| c.slots_used()).sum()
    }

    /// Free slots left after the floating armor/structure slots are charged.
    pub fn slots_free(&self) -> u32 {
        let free: u32 = self.components.iter().map(|c| c.slots_free()).sum();
        free.saturating_sub(self.upgrades.dynamic_slots())
    }

    pub fn slot_distribution(&self) -> SlotDistribution {
        DynamicSlotDistributor::for_loadout(self).distribute_over(self)
    }

    /// Legality of equipping `item` at `location`: loadout-wide rules first, then the component's.
    pub fn can_equip(&self, location: Location, item: &Item) -> EquipResult {
        let global = self.can_equip_global(location, item);
        if !global.is_success() {
            return global;
        }
        self.component(location).can_equip(item)
    }

    fn can_equip_global(&self, location: Location, item: &Item) -> EquipResult {
        if item.is_heat_sink() && item.id != self.upgrades.heat_sink.heat_sink.id {
            return EquipResult::IncompatibleUpgrades;
        }
        if item.mass + self.extra_mass_for(item) > self.free_mass() + MASS_TOLERANCE {
            return EquipResult::TooHeavy;
        }
        if let Some(engine) = item.engine() {
            if self.engine().is_some() {
                return EquipResult::EngineAlreadyEquipped;
            }
            if !self.chassis.supports_engine(engine.rating) {
                return EquipResult::NotSupported;
            }
        }
        if matches!(item.kind, ItemKind::JumpJet)
            && self.jump_jets_count() >= self.chassis.jump_jets_max
        {
            return EquipResult::JumpJetCapacityReached;
        }
        let component = self.component(location);
        if !component.absorbs(item) {
            let mut free = self.slots_free();
            if item.is_large_bore() {
                free += component
                    .large_bore_actuators_on()
                    .iter()
                    .map(|a| a.slots)
                    .sum::<u32>();
            }
            if item.slots > free {
                return EquipResult::NotEnoughSlots;
            }
        }
        EquipResult::Success
    }

    pub(crate) fn component_mut(&mut self, location: Location) -> &mut ConfiguredComponent {
        &mut self.components[location.index()]
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_armor_upgrade(&mut self, upgrade: Arc<ArmorUpgrade>) {
        self.upgrades.armor = upgrade;
    }

    pub(crate) fn set_structure_upgrade(&mut self, upgrade: Arc<StructureUpgrade>) {
        self.upgrades.structure = upgrade;
    }

    pub(crate) fn set_heat_sink_upgrade(&mut self, upgrade: Arc<HeatSinkUpgrade>) {
        self.upgrades.heat_sink = upgrade;
    }

    pub(crate) fn set_guidance_upgrade(&mut self, upgrade: Arc<GuidanceUpgrade>) {
        self.upgrades.guidance = upgrade;
    }

    pub(crate) fn set_pilot_modifiers(&mut self, modifiers: Vec<Modifier>) {
        self.pilot_modifiers = modifiers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_catalog;

    fn hbk() -> (Catalog, Loadout) {
        let c = test_catalog();
        let l = Loadout::from_catalog(&c, "HBK-4P", "Hunchie").unwrap();
        (c, l)
    }

    #[test]
    fn empty_loadout_mass_is_structure_only() {
        let (_, l) = hbk();
        assert_eq!(l.mass(), 5.0);
        assert_eq!(l.free_mass(), 45.0);
        assert_eq!(l.slots_free(), 55);
        assert_eq!(l.armor_max_total(), 338);
        assert!(l.engine().is_none());
    }

    #[test]
    fn global_checks_run_before_component_checks() {
        let (c, mut l) = hbk();
        let engine = c.lookup_item("STD ENGINE 300").unwrap();
        assert_eq!(l.can_equip(Location::LeftTorso, &engine), EquipResult::NotSupported);
        assert_eq!(l.can_equip(Location::CenterTorso, &engine), EquipResult::Success);
        l.component_mut(Location::CenterTorso).add_item(engine);
        let other = c.lookup_item("STD ENGINE 200").unwrap();
        assert_eq!(
            l.can_equip(Location::CenterTorso, &other),
            EquipResult::EngineAlreadyEquipped
        );
    }

    #[test]
    fn wrong_heat_sink_type_is_incompatible() {
        let (c, l) = hbk();
        let dhs = c.lookup_item("DOUBLE HEAT SINK").unwrap();
        assert_eq!(
            l.can_equip(Location::RightTorso, &dhs),
            EquipResult::IncompatibleUpgrades
        );
    }

    #[test]
    fn heavy_items_are_refused() {
        let (c, mut l) = hbk();
        let ac20 = c.lookup_item("AC/20").unwrap();
        let engine = c.lookup_item("STD ENGINE 300").unwrap();
        l.component_mut(Location::CenterTorso).add_item(engine);
        l.component_mut(Location::LeftTorso)
            .set_armor(ArmorSide::Front, 48, true)
            .unwrap();
        // 5 structure + 19 engine + 1.5 armor leaves 24.5 t.
        assert_eq!(l.can_equip(Location::RightTorso, &ac20), EquipResult::NoFreeHardPoints);
        assert_eq!(l.can_equip(Location::LeftTorso, &ac20), EquipResult::Success);
        l.component_mut(Location::LeftTorso).add_item(Arc::clone(&ac20));
        let ll = c.lookup_item("LARGE LASER").unwrap();
        l.component_mut(Location::RightTorso).add_item(Arc::clone(&ll));
        l.component_mut(Location::RightTorso).add_item(ll);
        assert_eq!(l.free_mass(), 0.5);
        let ml = c.lookup_item("MEDIUM LASER").unwrap();
        assert_eq!(l.can_equip(Location::Head, &ml), EquipResult::TooHeavy);
    }

    #[test]
    fn jump_jets_limited_by_chassis() {
        let (c, l) = hbk();
        let jj = c.lookup_item("JUMP JET - CLASS V").unwrap();
        assert_eq!(
            l.can_equip(Location::RightLeg, &jj),
            EquipResult::JumpJetCapacityReached
        );
    }

    #[test]
    fn guidance_adds_tonnage_per_launcher() {
        let (c, mut l) = hbk();
        let lrm = c.lookup_item("LRM 10").unwrap();
        l.component_mut(Location::RightTorso).add_item(Arc::clone(&lrm));
        let before = l.mass();
        l.set_guidance_upgrade(c.lookup_guidance("ARTEMIS IV").unwrap());
        assert_eq!(l.mass() - before, 1.0);
        assert_eq!(l.missile_launchers_count(), 1);
    }

    #[test]
    fn dynamic_slots_reduce_global_free_slots() {
        let (c, mut l) = hbk();
        l.set_structure_upgrade(c.lookup_structure("ENDO-STEEL STRUCTURE").unwrap());
        assert_eq!(l.slots_free(), 41);
        assert_eq!(l.mass(), 2.5);
        let dist = l.slot_distribution();
        // RA has 8 free slots and is first in line.
        assert_eq!(dist.structure[Location::RightArm.index()], 8);
        assert_eq!(dist.structure[Location::RightTorso.index()], 6);
        assert_eq!(dist.overflow(), 0);
    }

    #[test]
    fn equality_ignores_equip_order() {
        let (c, mut a) = hbk();
        let mut b = a.clone();
        let ml = c.lookup_item("MEDIUM LASER").unwrap();
        let ll = c.lookup_item("LARGE LASER").unwrap();
        a.component_mut(Location::RightTorso).add_item(Arc::clone(&ml));
        a.component_mut(Location::RightTorso).add_item(Arc::clone(&ll));
        b.component_mut(Location::RightTorso).add_item(ll);
        assert_ne!(a, b);
        b.component_mut(Location::RightTorso).add_item(ml);
        assert_eq!(a, b);
    }

    #[test]
    fn modifiers_are_quirks_then_pilot() {
        let (c, mut l) = hbk();
        l.set_pilot_modifiers(vec![c.lookup_modifier("COOL RUN").unwrap()]);
        let names: Vec<_> = l.modifiers().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, ["ENERGY RANGE 10", "RT STRUCTURE 10", "COOL RUN"]);
    }
}
