//! One body location of a loadout: equipped items, armor and equip legality.

use super::{EquipResult, LoadoutError};
use crate::catalog::{
    ArmorSide, Chassis, HardPointType, InternalComponent, Item, ItemKind, Location,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ConfiguredComponent {
    chassis: Arc<Chassis>,
    location: Location,
    /// User-equipped items in equip order; order decides which heat sinks the engine absorbs.
    items: Vec<Arc<Item>>,
    /// Front (or only) armor at 0, back armor at 1.
    armor: [u32; 2],
    manual_armor: bool,
    /// IDs of toggleable fixed items currently switched off.
    toggled_off: Vec<u32>,
}

impl ConfiguredComponent {
    pub fn new(chassis: Arc<Chassis>, location: Location) -> Self {
        Self {
            chassis,
            location,
            items: Vec::new(),
            armor: [0, 0],
            manual_armor: false,
            toggled_off: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn internal(&self) -> &InternalComponent {
        self.chassis.component(self.location)
    }

    pub fn items_equipped(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Chassis-fixed items that are present (toggled-off actuators excluded).
    pub fn items_fixed(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.internal()
            .fixed
            .iter()
            .filter(|i| !self.toggled_off.contains(&i.id))
    }

    pub fn items_all(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items_fixed().chain(self.items.iter())
    }

    /// Items occupying critical slots: present fixed items plus equipped items,
    /// minus heat sinks absorbed by the engine.
    pub fn items_in_slots(&self) -> Vec<Arc<Item>> {
        let mut absorb = self.engine_heat_sink_capacity();
        let mut out: Vec<Arc<Item>> = self.items_fixed().cloned().collect();
        for item in &self.items {
            if item.is_heat_sink() && absorb > 0 {
                absorb -= 1;
                continue;
            }
            out.push(Arc::clone(item));
        }
        out
    }

    pub fn engine(&self) -> Option<&Arc<Item>> {
        self.items_all().find(|i| i.engine().is_some())
    }

    pub fn engine_heat_sink_capacity(&self) -> u32 {
        self.engine()
            .and_then(|e| e.engine())
            .map(|e| e.heat_sink_slots)
            .unwrap_or(0)
    }

    /// Heat sinks currently mounted inside the engine.
    pub fn engine_heat_sinks(&self) -> u32 {
        let count = self.items.iter().filter(|i| i.is_heat_sink()).count() as u32;
        count.min(self.engine_heat_sink_capacity())
    }

    /// True when `item` is a heat sink the engine would take without using a slot.
    pub fn absorbs(&self, item: &Item) -> bool {
        item.is_heat_sink() && self.engine_heat_sinks() < self.engine_heat_sink_capacity()
    }

    /// Whether `item` fits in the slots free right now, with no actuator credit.
    pub fn fits_now(&self, item: &Item) -> bool {
        self.absorbs(item) || self.slots_free() >= item.slots
    }

    pub fn slots_total(&self) -> u32 {
        self.internal().slots
    }

    pub fn slots_used(&self) -> u32 {
        self.items_in_slots().iter().map(|i| i.slots).sum()
    }

    /// Free slots before any floating armor/structure slots are charged.
    pub fn slots_free(&self) -> u32 {
        self.slots_total().saturating_sub(self.slots_used())
    }

    pub fn hardpoints_used(&self, ty: HardPointType) -> u32 {
        self.items.iter().filter(|i| i.hardpoint == ty).count() as u32
    }

    pub fn hardpoints_free(&self, ty: HardPointType) -> u32 {
        self.internal()
            .hardpoint_count(ty)
            .saturating_sub(self.hardpoints_used(ty))
    }

    pub fn has_manual_armor(&self) -> bool {
        self.manual_armor
    }

    fn side_index(&self, side: ArmorSide) -> Result<usize, LoadoutError> {
        match (self.location.has_rear_armor(), side) {
            (false, ArmorSide::Only) => Ok(0),
            (true, ArmorSide::Front) => Ok(0),
            (true, ArmorSide::Back) => Ok(1),
            _ => Err(LoadoutError::InvalidArmorSide {
                location: self.location,
                side,
            }),
        }
    }

    /// Sides that carry armor on this location.
    pub fn armor_sides(&self) -> &'static [ArmorSide] {
        if self.location.has_rear_armor() {
            &[ArmorSide::Front, ArmorSide::Back]
        } else {
            &[ArmorSide::Only]
        }
    }

    /// Armor on `side`. On torsos `Only` means front plus back; sides a location
    /// does not have read as zero.
    pub fn armor(&self, side: ArmorSide) -> u32 {
        match self.side_index(side) {
            Ok(idx) => self.armor[idx],
            Err(_) if side == ArmorSide::Only => self.armor_total(),
            Err(_) => 0,
        }
    }

    pub fn armor_total(&self) -> u32 {
        self.armor[0] + self.armor[1]
    }

    /// Largest value `side` may be set to given the armor on the other side.
    pub fn armor_max(&self, side: ArmorSide) -> u32 {
        let max = self.internal().armor_max();
        match side {
            ArmorSide::Only => max,
            ArmorSide::Front => max.saturating_sub(self.armor(ArmorSide::Back)),
            ArmorSide::Back => max.saturating_sub(self.armor(ArmorSide::Front)),
        }
    }

    pub fn toggle_state(&self, item: &Item) -> Option<bool> {
        if !self.internal().is_toggleable(item) {
            return None;
        }
        Some(!self.toggled_off.contains(&item.id))
    }

    fn has_large_bore_weapon(&self) -> bool {
        self.items.iter().any(|i| i.is_large_bore())
    }

    /// Toggleable actuators that are on and would be switched off to fit a large-bore weapon.
    pub fn large_bore_actuators_on(&self) -> Vec<Arc<Item>> {
        self.internal()
            .toggleable
            .iter()
            .filter(|t| !self.toggled_off.contains(&t.id))
            .cloned()
            .collect()
    }

    /// Component-local legality of equipping `item`.
    pub fn can_equip(&self, item: &Item) -> EquipResult {
        let internal = self.internal();
        if !internal.is_allowed(item)
            || (self.chassis.omni && matches!(item.kind, ItemKind::Engine(_)))
        {
            return EquipResult::NotSupported;
        }
        if item.hardpoint != HardPointType::None && self.hardpoints_free(item.hardpoint) == 0 {
            return EquipResult::NoFreeHardPoints;
        }
        if self.absorbs(item) {
            return EquipResult::Success;
        }
        if matches!(item.kind, ItemKind::Case)
            && self.items.iter().any(|i| matches!(i.kind, ItemKind::Case))
        {
            return EquipResult::ComponentAlreadyHasCase;
        }
        let mut free = self.slots_free();
        if item.is_large_bore() {
            free += self
                .large_bore_actuators_on()
                .iter()
                .map(|a| a.slots)
                .sum::<u32>();
        }
        if free < item.slots {
            return EquipResult::NotEnoughSlots;
        }
        EquipResult::Success
    }

    pub fn can_toggle_on(&self, item: &Item) -> EquipResult {
        let toggleable = &self.internal().toggleable;
        let Some(pos) = toggleable.iter().position(|t| t.id == item.id) else {
            return EquipResult::NotToggleable;
        };
        if toggleable[..pos]
            .iter()
            .any(|t| self.toggled_off.contains(&t.id))
        {
            return EquipResult::LaaBeforeHa;
        }
        if self.toggle_state(item) == Some(true) {
            return EquipResult::Success;
        }
        if self.has_large_bore_weapon() {
            return EquipResult::LargeBoreWeaponPresent;
        }
        if self.slots_free() < item.slots {
            return EquipResult::NotEnoughSlots;
        }
        EquipResult::Success
    }

    pub fn can_toggle_off(&self, item: &Item) -> EquipResult {
        let toggleable = &self.internal().toggleable;
        let Some(pos) = toggleable.iter().position(|t| t.id == item.id) else {
            return EquipResult::NotToggleable;
        };
        if toggleable[pos + 1..]
            .iter()
            .any(|t| !self.toggled_off.contains(&t.id))
        {
            return EquipResult::LaaBeforeHa;
        }
        EquipResult::Success
    }

    pub(crate) fn add_item(&mut self, item: Arc<Item>) {
        self.items.push(item);
    }

    pub(crate) fn insert_item(&mut self, index: usize, item: Arc<Item>) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Removes the last equipped instance of `item`, returning its index.
    pub(crate) fn remove_item(&mut self, item: &Item) -> Result<usize, LoadoutError> {
        let idx = self
            .items
            .iter()
            .rposition(|i| i.id == item.id)
            .ok_or_else(|| LoadoutError::ItemNotPresent {
                item: item.name.clone(),
                location: self.location,
            })?;
        self.items.remove(idx);
        Ok(idx)
    }

    pub(crate) fn set_armor(
        &mut self,
        side: ArmorSide,
        amount: u32,
        manual: bool,
    ) -> Result<(), LoadoutError> {
        let idx = self.side_index(side)?;
        let max = self.armor_max(side);
        if amount > max {
            return Err(LoadoutError::ArmorOutOfRange {
                location: self.location,
                side,
                value: amount,
                max,
            });
        }
        self.armor[idx] = amount;
        self.manual_armor = manual;
        Ok(())
    }

    pub(crate) fn set_toggle(&mut self, item: &Item, on: bool) -> Result<(), LoadoutError> {
        if !self.internal().is_toggleable(item) {
            return Err(LoadoutError::Toggle {
                item: item.name.clone(),
                location: self.location,
                result: EquipResult::NotToggleable,
            });
        }
        self.toggled_off.retain(|id| *id != item.id);
        if !on {
            self.toggled_off.push(item.id);
        }
        Ok(())
    }
}

impl PartialEq for ConfiguredComponent {
    /// Equipped items compare as a multiset; equip order does not matter.
    fn eq(&self, other: &Self) -> bool {
        if self.location != other.location
            || self.armor != other.armor
            || self.manual_armor != other.manual_armor
            || self.items.len() != other.items.len()
            || self.chassis.name != other.chassis.name
        {
            return false;
        }
        let mut a: Vec<u32> = self.items.iter().map(|i| i.id).collect();
        let mut b: Vec<u32> = other.items.iter().map(|i| i.id).collect();
        a.sort_unstable();
        b.sort_unstable();
        let mut ta = self.toggled_off.clone();
        let mut tb = other.toggled_off.clone();
        ta.sort_unstable();
        tb.sort_unstable();
        a == b && ta == tb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_catalog, Catalog};

    fn component(catalog: &Catalog, chassis: &str, loc: Location) -> ConfiguredComponent {
        ConfiguredComponent::new(catalog.lookup_chassis(chassis).unwrap(), loc)
    }

    #[test]
    fn fresh_component_counts_fixed_slots() {
        let c = test_catalog();
        let ra = component(&c, "HBK-4P", Location::RightArm);
        assert_eq!(ra.slots_used(), 4);
        assert_eq!(ra.slots_free(), 8);
        let ct = component(&c, "HBK-4P", Location::CenterTorso);
        assert_eq!(ct.slots_free(), 8);
    }

    #[test]
    fn hardpoints_run_out() {
        let c = test_catalog();
        let ml = c.lookup_item("MEDIUM LASER").unwrap();
        let mut ra = component(&c, "HBK-4P", Location::RightArm);
        assert_eq!(ra.can_equip(&ml), EquipResult::Success);
        ra.add_item(Arc::clone(&ml));
        ra.add_item(Arc::clone(&ml));
        assert_eq!(ra.can_equip(&ml), EquipResult::NoFreeHardPoints);
        let lrm = c.lookup_item("LRM 10").unwrap();
        assert_eq!(ra.can_equip(&lrm), EquipResult::NoFreeHardPoints);
    }

    #[test]
    fn engine_only_in_center_torso() {
        let c = test_catalog();
        let engine = c.lookup_item("STD ENGINE 200").unwrap();
        assert_eq!(
            component(&c, "HBK-4P", Location::LeftTorso).can_equip(&engine),
            EquipResult::NotSupported
        );
        assert_eq!(
            component(&c, "HBK-4P", Location::CenterTorso).can_equip(&engine),
            EquipResult::Success
        );
        let internal = c.lookup_item("GYRO").unwrap();
        assert_eq!(
            component(&c, "HBK-4P", Location::CenterTorso).can_equip(&internal),
            EquipResult::NotSupported
        );
    }

    #[test]
    fn second_case_rejected() {
        let c = test_catalog();
        let case = c.lookup_item("C.A.S.E.").unwrap();
        let mut lt = component(&c, "HBK-4P", Location::LeftTorso);
        assert_eq!(lt.can_equip(&case), EquipResult::Success);
        lt.add_item(Arc::clone(&case));
        assert_eq!(lt.can_equip(&case), EquipResult::ComponentAlreadyHasCase);
    }

    #[test]
    fn engine_absorbs_heat_sinks_positionally() {
        let c = test_catalog();
        let engine = c.lookup_item("STD ENGINE 300").unwrap();
        let hs = c.lookup_item("HEAT SINK").unwrap();
        let mut ct = component(&c, "HBK-4P", Location::CenterTorso);
        ct.add_item(engine);
        assert_eq!(ct.slots_free(), 2);
        ct.add_item(Arc::clone(&hs));
        ct.add_item(Arc::clone(&hs));
        assert_eq!(ct.engine_heat_sinks(), 2);
        assert_eq!(ct.slots_free(), 2);
        ct.add_item(Arc::clone(&hs));
        assert_eq!(ct.slots_free(), 1);

        ct.remove_item(&hs).unwrap();
        assert_eq!(ct.slots_free(), 2);
        assert_eq!(ct.engine_heat_sinks(), 2);
    }

    #[test]
    fn heat_sink_fits_in_engine_when_slots_full() {
        let c = test_catalog();
        let engine = c.lookup_item("STD ENGINE 300").unwrap();
        let dhs = c.lookup_item("DOUBLE HEAT SINK").unwrap();
        let mut ct = component(&c, "HBK-4P", Location::CenterTorso);
        ct.add_item(engine);
        assert_eq!(ct.slots_free(), 2);
        assert_eq!(ct.can_equip(&dhs), EquipResult::Success);
        ct.add_item(Arc::clone(&dhs));
        ct.add_item(Arc::clone(&dhs));
        assert_eq!(ct.can_equip(&dhs), EquipResult::NotEnoughSlots);
    }

    #[test]
    fn add_then_remove_restores_component() {
        let c = test_catalog();
        let ll = c.lookup_item("LARGE LASER").unwrap();
        let mut rt = component(&c, "HBK-4P", Location::RightTorso);
        rt.add_item(c.lookup_item("MEDIUM LASER").unwrap());
        let before = rt.clone();
        assert_eq!(rt.can_equip(&ll), EquipResult::Success);
        rt.add_item(Arc::clone(&ll));
        rt.remove_item(&ll).unwrap();
        assert_eq!(rt, before);
        assert_eq!(rt.slots_used(), before.slots_used());
    }

    #[test]
    fn removing_missing_item_is_an_error() {
        let c = test_catalog();
        let ml = c.lookup_item("MEDIUM LASER").unwrap();
        let mut rt = component(&c, "HBK-4P", Location::RightTorso);
        assert!(matches!(
            rt.remove_item(&ml),
            Err(LoadoutError::ItemNotPresent { .. })
        ));
    }

    #[test]
    fn torso_armor_shares_capacity() {
        let c = test_catalog();
        let mut ct = component(&c, "HBK-4P", Location::CenterTorso);
        assert_eq!(ct.armor_max(ArmorSide::Front), 64);
        ct.set_armor(ArmorSide::Front, 50, true).unwrap();
        assert_eq!(ct.armor_max(ArmorSide::Back), 14);
        assert!(matches!(
            ct.set_armor(ArmorSide::Back, 15, true),
            Err(LoadoutError::ArmorOutOfRange { .. })
        ));
        assert!(matches!(
            ct.set_armor(ArmorSide::Only, 10, true),
            Err(LoadoutError::InvalidArmorSide { .. })
        ));
        assert_eq!(ct.armor(ArmorSide::Only), 50);
    }

    #[test]
    fn omni_large_bore_counts_actuator_slots() {
        let c = test_catalog();
        let ac20 = c.lookup_item("AC/20").unwrap();
        let la = component(&c, "TBR-PRIME", Location::LeftArm);
        // 8 free slots plus the two toggleable actuators.
        assert_eq!(la.slots_free(), 8);
        assert_eq!(la.can_equip(&ac20), EquipResult::Success);

        let hbk_la = component(&c, "HBK-4P", Location::LeftArm);
        assert_eq!(hbk_la.can_equip(&ac20), EquipResult::NoFreeHardPoints);
    }

    #[test]
    fn omni_engine_is_fixed() {
        let c = test_catalog();
        let ct = component(&c, "TBR-PRIME", Location::CenterTorso);
        assert!(ct.engine().is_some());
        let engine = c.lookup_item("STD ENGINE 300").unwrap();
        assert_eq!(ct.can_equip(&engine), EquipResult::NotSupported);
    }

    #[test]
    fn toggle_rules() {
        let c = test_catalog();
        let laa = c.lookup_item("LOWER ARM ACTUATOR").unwrap();
        let ha = c.lookup_item("HAND ACTUATOR").unwrap();
        let shoulder = c.lookup_item("SHOULDER").unwrap();
        let mut la = component(&c, "TBR-PRIME", Location::LeftArm);

        assert_eq!(la.can_toggle_on(&shoulder), EquipResult::NotToggleable);
        assert_eq!(la.can_toggle_off(&laa), EquipResult::LaaBeforeHa);
        assert_eq!(la.can_toggle_off(&ha), EquipResult::Success);

        la.set_toggle(&ha, false).unwrap();
        la.set_toggle(&laa, false).unwrap();
        assert_eq!(la.slots_free(), 10);
        assert_eq!(la.can_toggle_on(&ha), EquipResult::LaaBeforeHa);
        assert_eq!(la.can_toggle_on(&laa), EquipResult::Success);

        la.add_item(c.lookup_item("AC/20").unwrap());
        assert_eq!(la.can_toggle_on(&laa), EquipResult::LargeBoreWeaponPresent);
    }
}
