//! Leaf operations and composite recipes on a single loadout.

use super::{Command, CommandError, Message, MessageBuffer, Transactional};
use crate::attribute::Modifier;
use crate::catalog::{
    ArmorSide, ArmorUpgrade, GuidanceUpgrade, HeatSinkUpgrade, Item, Location, StructureUpgrade,
};
use crate::loadout::{EquipResult, Loadout, LoadoutError, MASS_TOLERANCE};
use std::fmt;
use std::sync::Arc;

/// Leaf mutations. Fields named `previous`/`removed_at` are filled in on apply and consumed on undo.
#[derive(Debug, Clone)]
pub enum LoadoutOp {
    AddItem {
        location: Location,
        item: Arc<Item>,
    },
    RemoveItem {
        location: Location,
        item: Arc<Item>,
        removed_at: Option<usize>,
    },
    SetArmor {
        location: Location,
        side: ArmorSide,
        amount: u32,
        manual: bool,
        previous: Option<(u32, bool)>,
    },
    ToggleItem {
        location: Location,
        item: Arc<Item>,
        on: bool,
        previous: Option<bool>,
    },
    SetArmorUpgrade {
        upgrade: Arc<ArmorUpgrade>,
        previous: Option<Arc<ArmorUpgrade>>,
    },
    SetStructureUpgrade {
        upgrade: Arc<StructureUpgrade>,
        previous: Option<Arc<StructureUpgrade>>,
    },
    SetHeatSinkUpgrade {
        upgrade: Arc<HeatSinkUpgrade>,
        previous: Option<Arc<HeatSinkUpgrade>>,
    },
    SetGuidanceUpgrade {
        upgrade: Arc<GuidanceUpgrade>,
        previous: Option<Arc<GuidanceUpgrade>>,
    },
    Rename {
        name: String,
        previous: Option<String>,
    },
    SetModifiers {
        modifiers: Vec<Modifier>,
        previous: Option<Vec<Modifier>>,
    },
}

impl LoadoutOp {
    pub fn add_item(location: Location, item: Arc<Item>) -> Self {
        LoadoutOp::AddItem { location, item }
    }

    pub fn remove_item(location: Location, item: Arc<Item>) -> Self {
        LoadoutOp::RemoveItem {
            location,
            item,
            removed_at: None,
        }
    }

    pub fn set_armor(location: Location, side: ArmorSide, amount: u32, manual: bool) -> Self {
        LoadoutOp::SetArmor {
            location,
            side,
            amount,
            manual,
            previous: None,
        }
    }

    pub fn toggle_item(location: Location, item: Arc<Item>, on: bool) -> Self {
        LoadoutOp::ToggleItem {
            location,
            item,
            on,
            previous: None,
        }
    }

    pub fn set_armor_upgrade(upgrade: Arc<ArmorUpgrade>) -> Self {
        LoadoutOp::SetArmorUpgrade {
            upgrade,
            previous: None,
        }
    }

    pub fn set_structure_upgrade(upgrade: Arc<StructureUpgrade>) -> Self {
        LoadoutOp::SetStructureUpgrade {
            upgrade,
            previous: None,
        }
    }

    pub fn set_heat_sink_upgrade(upgrade: Arc<HeatSinkUpgrade>) -> Self {
        LoadoutOp::SetHeatSinkUpgrade {
            upgrade,
            previous: None,
        }
    }

    pub fn set_guidance_upgrade(upgrade: Arc<GuidanceUpgrade>) -> Self {
        LoadoutOp::SetGuidanceUpgrade {
            upgrade,
            previous: None,
        }
    }

    pub fn rename(name: impl Into<String>) -> Self {
        LoadoutOp::Rename {
            name: name.into(),
            previous: None,
        }
    }

    pub fn set_modifiers(modifiers: Vec<Modifier>) -> Self {
        LoadoutOp::SetModifiers {
            modifiers,
            previous: None,
        }
    }
}

impl fmt::Display for LoadoutOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadoutOp::AddItem { location, item } => write!(f, "add {} to {}", item.name, location),
            LoadoutOp::RemoveItem { location, item, .. } => {
                write!(f, "remove {} from {}", item.name, location)
            }
            LoadoutOp::SetArmor {
                location,
                side,
                amount,
                ..
            } => write!(f, "set {} {} armor to {}", location, side, amount),
            LoadoutOp::ToggleItem {
                location, item, on, ..
            } => write!(
                f,
                "toggle {} {} on {}",
                item.name,
                if *on { "on" } else { "off" },
                location
            ),
            LoadoutOp::SetArmorUpgrade { upgrade, .. } => write!(f, "switch to {}", upgrade.name),
            LoadoutOp::SetStructureUpgrade { upgrade, .. } => {
                write!(f, "switch to {}", upgrade.name)
            }
            LoadoutOp::SetHeatSinkUpgrade { upgrade, .. } => {
                write!(f, "switch to {}", upgrade.name)
            }
            LoadoutOp::SetGuidanceUpgrade { upgrade, .. } => {
                write!(f, "switch to {}", upgrade.name)
            }
            LoadoutOp::Rename { name, .. } => write!(f, "rename to {}", name),
            LoadoutOp::SetModifiers { modifiers, .. } => {
                write!(f, "set {} pilot modifier(s)", modifiers.len())
            }
        }
    }
}

/// Composite edits, expanded into leaf ops against the loadout they are first applied to.
#[derive(Debug, Clone)]
pub enum LoadoutRecipe {
    /// Adds an item, first switching off omni arm actuators when a large-bore weapon needs it.
    Equip { location: Location, item: Arc<Item> },
    /// Removes an item; removing an engine also removes the heat sinks it held.
    Unequip { location: Location, item: Arc<Item> },
    /// Removes every equipped item and all armor.
    Strip,
    StripArmor,
    /// Sets every location to maximum armor, splitting torsos `front_back_ratio : 1`.
    MaxArmor { front_back_ratio: f64 },
    /// Sets armor on a location and its mirror.
    SetArmorSymmetric {
        location: Location,
        side: ArmorSide,
        amount: u32,
        manual: bool,
    },
    /// Swaps the heat sink type, re-adding as many of the new heat sinks as fit.
    SetHeatSinkType { upgrade: Arc<HeatSinkUpgrade> },
    /// Arbitrary ops applied as one transaction.
    Batch {
        description: String,
        ops: Vec<LoadoutOp>,
    },
}

impl fmt::Display for LoadoutRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadoutRecipe::Equip { location, item } => write!(f, "equip {} on {}", item.name, location),
            LoadoutRecipe::Unequip { location, item } => {
                write!(f, "unequip {} from {}", item.name, location)
            }
            LoadoutRecipe::Strip => write!(f, "strip loadout"),
            LoadoutRecipe::StripArmor => write!(f, "strip armor"),
            LoadoutRecipe::MaxArmor { front_back_ratio } => {
                write!(f, "max armor ({}:1)", front_back_ratio)
            }
            LoadoutRecipe::SetArmorSymmetric {
                location,
                side,
                amount,
                ..
            } => write!(
                f,
                "set {}/{} {} armor to {}",
                location,
                location.mirror(),
                side,
                amount
            ),
            LoadoutRecipe::SetHeatSinkType { upgrade } => write!(f, "switch to {}", upgrade.name),
            LoadoutRecipe::Batch { description, .. } => f.write_str(description),
        }
    }
}

fn equip_error(location: Location, item: &Item, result: EquipResult) -> LoadoutError {
    LoadoutError::Equip {
        item: item.name.clone(),
        location,
        result,
    }
}

fn check_mass(loadout: &Loadout, delta: f64) -> Result<(), LoadoutError> {
    let mass = loadout.mass() + delta;
    let max = loadout.chassis().mass;
    if delta > 0.0 && mass > max + MASS_TOLERANCE {
        return Err(LoadoutError::TooHeavy { mass, max });
    }
    Ok(())
}

fn check_dynamic_slots(loadout: &Loadout, upgrade: &str, needed: u32) -> Result<(), LoadoutError> {
    let free: u32 = loadout.components().iter().map(|c| c.slots_free()).sum();
    if needed > free {
        return Err(LoadoutError::NotEnoughSlotsForUpgrade {
            upgrade: upgrade.to_string(),
            needed,
            free,
        });
    }
    Ok(())
}

fn not_applied(op: &LoadoutOp) -> CommandError {
    CommandError::NotApplied(op.to_string())
}

fn apply(loadout: &mut Loadout, op: &mut LoadoutOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
    match op {
        LoadoutOp::AddItem { location, item } => {
            let result = loadout.can_equip(*location, item);
            if !result.is_success() {
                return Err(equip_error(*location, item, result).into());
            }
            // Omni actuators are only switched off by the Equip recipe.
            let component = loadout.component(*location);
            if !component.fits_now(item)
                || (!component.absorbs(item) && loadout.slots_free() < item.slots)
            {
                return Err(equip_error(*location, item, EquipResult::NotEnoughSlots).into());
            }
            loadout.component_mut(*location).add_item(Arc::clone(item));
            out.post(Message::ItemAdded {
                location: *location,
                item: item.name.clone(),
            });
        }
        LoadoutOp::RemoveItem {
            location,
            item,
            removed_at,
        } => {
            let current = loadout.component(*location);
            let mut trial = current.clone();
            trial.remove_item(item)?;
            let grown = trial.slots_used().saturating_sub(current.slots_used());
            if trial.slots_used() > trial.slots_total() || grown > loadout.slots_free() {
                return Err(LoadoutError::EngineHeatSinksStranded {
                    item: item.name.clone(),
                    location: *location,
                }
                .into());
            }
            *removed_at = Some(loadout.component_mut(*location).remove_item(item)?);
            out.post(Message::ItemRemoved {
                location: *location,
                item: item.name.clone(),
            });
        }
        LoadoutOp::SetArmor {
            location,
            side,
            amount,
            manual,
            previous,
        } => {
            let component = loadout.component(*location);
            if !component.armor_sides().contains(side) {
                return Err(LoadoutError::InvalidArmorSide {
                    location: *location,
                    side: *side,
                }
                .into());
            }
            let old = component.armor(*side);
            let old_manual = component.has_manual_armor();
            let armor = &loadout.upgrades().armor;
            let delta = armor.armor_mass(*amount) - armor.armor_mass(old);
            check_mass(loadout, delta)?;
            loadout
                .component_mut(*location)
                .set_armor(*side, *amount, *manual)?;
            *previous = Some((old, old_manual));
            out.post(Message::ArmorChanged {
                location: *location,
                side: *side,
                manual: *manual,
            });
        }
        LoadoutOp::ToggleItem {
            location,
            item,
            on,
            previous,
        } => {
            let component = loadout.component(*location);
            let toggle_error = |result| LoadoutError::Toggle {
                item: item.name.clone(),
                location: *location,
                result,
            };
            let Some(current) = component.toggle_state(item) else {
                return Err(toggle_error(EquipResult::NotToggleable).into());
            };
            let result = if *on {
                component.can_toggle_on(item)
            } else {
                component.can_toggle_off(item)
            };
            if !result.is_success() {
                return Err(toggle_error(result).into());
            }
            if *on && !current && loadout.slots_free() < item.slots {
                return Err(toggle_error(EquipResult::NotEnoughSlots).into());
            }
            loadout.component_mut(*location).set_toggle(item, *on)?;
            *previous = Some(current);
            out.post(Message::ItemToggled {
                location: *location,
                item: item.name.clone(),
                on: *on,
            });
        }
        LoadoutOp::SetArmorUpgrade { upgrade, previous } => {
            let current = Arc::clone(&loadout.upgrades().armor);
            let total = loadout.armor_total();
            check_mass(loadout, upgrade.armor_mass(total) - current.armor_mass(total))?;
            let needed = upgrade.dynamic_slots + loadout.upgrades().structure.dynamic_slots;
            check_dynamic_slots(loadout, &upgrade.name, needed)?;
            loadout.set_armor_upgrade(Arc::clone(upgrade));
            *previous = Some(current);
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
        }
        LoadoutOp::SetStructureUpgrade { upgrade, previous } => {
            let current = Arc::clone(&loadout.upgrades().structure);
            let tons = loadout.chassis().mass;
            check_mass(loadout, upgrade.structure_mass(tons) - current.structure_mass(tons))?;
            let needed = upgrade.dynamic_slots + loadout.upgrades().armor.dynamic_slots;
            check_dynamic_slots(loadout, &upgrade.name, needed)?;
            loadout.set_structure_upgrade(Arc::clone(upgrade));
            *previous = Some(current);
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
        }
        LoadoutOp::SetHeatSinkUpgrade { upgrade, previous } => {
            if let Some((_, hs)) = loadout
                .items_equipped()
                .find(|(_, i)| i.is_heat_sink() && i.id != upgrade.heat_sink.id)
            {
                return Err(LoadoutError::UpgradeConflict {
                    upgrade: upgrade.name.clone(),
                    reason: format!("{} is still equipped", hs.name),
                }
                .into());
            }
            let current = Arc::clone(&loadout.upgrades().heat_sink);
            loadout.set_heat_sink_upgrade(Arc::clone(upgrade));
            *previous = Some(current);
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
        }
        LoadoutOp::SetGuidanceUpgrade { upgrade, previous } => {
            let current = Arc::clone(&loadout.upgrades().guidance);
            let launchers = loadout.missile_launchers_count() as f64;
            check_mass(
                loadout,
                launchers * (upgrade.tons_per_launcher - current.tons_per_launcher),
            )?;
            loadout.set_guidance_upgrade(Arc::clone(upgrade));
            *previous = Some(current);
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
        }
        LoadoutOp::Rename { name, previous } => {
            if name.trim().is_empty() {
                return Err(LoadoutError::EmptyName.into());
            }
            *previous = Some(loadout.name().to_string());
            loadout.set_name(name.clone());
            out.post(Message::LoadoutRenamed { name: name.clone() });
        }
        LoadoutOp::SetModifiers {
            modifiers,
            previous,
        } => {
            *previous = Some(loadout.pilot_modifiers().to_vec());
            loadout.set_pilot_modifiers(modifiers.clone());
            out.post(Message::ModifiersChanged);
        }
    }
    Ok(())
}

fn undo(loadout: &mut Loadout, op: &mut LoadoutOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
    let missing = not_applied(op);
    match op {
        LoadoutOp::AddItem { location, item } => {
            loadout.component_mut(*location).remove_item(item)?;
            out.post(Message::ItemRemoved {
                location: *location,
                item: item.name.clone(),
            });
        }
        LoadoutOp::RemoveItem {
            location,
            item,
            removed_at,
        } => {
            let index = removed_at.take().ok_or(missing)?;
            loadout
                .component_mut(*location)
                .insert_item(index, Arc::clone(item));
            out.post(Message::ItemAdded {
                location: *location,
                item: item.name.clone(),
            });
        }
        LoadoutOp::SetArmor {
            location,
            side,
            previous,
            ..
        } => {
            let (amount, manual) = previous.take().ok_or(missing)?;
            loadout
                .component_mut(*location)
                .set_armor(*side, amount, manual)?;
            out.post(Message::ArmorChanged {
                location: *location,
                side: *side,
                manual,
            });
        }
        LoadoutOp::ToggleItem {
            location,
            item,
            previous,
            ..
        } => {
            let on = previous.take().ok_or(missing)?;
            loadout.component_mut(*location).set_toggle(item, on)?;
            out.post(Message::ItemToggled {
                location: *location,
                item: item.name.clone(),
                on,
            });
        }
        LoadoutOp::SetArmorUpgrade { previous, .. } => {
            let upgrade = previous.take().ok_or(missing)?;
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
            loadout.set_armor_upgrade(upgrade);
        }
        LoadoutOp::SetStructureUpgrade { previous, .. } => {
            let upgrade = previous.take().ok_or(missing)?;
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
            loadout.set_structure_upgrade(upgrade);
        }
        LoadoutOp::SetHeatSinkUpgrade { previous, .. } => {
            let upgrade = previous.take().ok_or(missing)?;
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
            loadout.set_heat_sink_upgrade(upgrade);
        }
        LoadoutOp::SetGuidanceUpgrade { previous, .. } => {
            let upgrade = previous.take().ok_or(missing)?;
            out.post(Message::UpgradeChanged {
                upgrade: upgrade.name.clone(),
            });
            loadout.set_guidance_upgrade(upgrade);
        }
        LoadoutOp::Rename { previous, .. } => {
            let name = previous.take().ok_or(missing)?;
            out.post(Message::LoadoutRenamed { name: name.clone() });
            loadout.set_name(name);
        }
        LoadoutOp::SetModifiers { previous, .. } => {
            let modifiers = previous.take().ok_or(missing)?;
            loadout.set_pilot_modifiers(modifiers);
            out.post(Message::ModifiersChanged);
        }
    }
    Ok(())
}

impl Loadout {
    fn build_equip(&self, location: Location, item: &Arc<Item>) -> Vec<LoadoutOp> {
        let mut ops = Vec::new();
        if self.chassis().omni && item.is_large_bore() {
            // Hand before lower arm.
            for actuator in self.component(location).large_bore_actuators_on().iter().rev() {
                ops.push(LoadoutOp::toggle_item(location, Arc::clone(actuator), false));
            }
        }
        ops.push(LoadoutOp::add_item(location, Arc::clone(item)));
        ops
    }

    fn build_unequip(&self, location: Location, item: &Arc<Item>) -> Vec<LoadoutOp> {
        let component = self.component(location);
        let mut ops = Vec::new();
        if item.engine().is_some() {
            let count = component.engine_heat_sinks() as usize;
            let sinks = component
                .items_equipped()
                .iter()
                .rev()
                .filter(|i| i.is_heat_sink())
                .take(count);
            for hs in sinks {
                ops.push(LoadoutOp::remove_item(location, Arc::clone(hs)));
            }
        }
        ops.push(LoadoutOp::remove_item(location, Arc::clone(item)));
        ops
    }

    fn build_strip_armor(&self) -> Vec<LoadoutOp> {
        let mut ops = Vec::new();
        for component in self.components() {
            for side in component.armor_sides() {
                if component.armor(*side) > 0 {
                    ops.push(LoadoutOp::set_armor(component.location(), *side, 0, false));
                }
            }
        }
        ops
    }

    fn build_strip(&self) -> Vec<LoadoutOp> {
        let mut ops = Vec::new();
        for component in self.components() {
            let loc = component.location();
            let (engines, others): (Vec<_>, Vec<_>) = component
                .items_equipped()
                .iter()
                .rev()
                .partition(|i| i.engine().is_some());
            for item in others.into_iter().chain(engines) {
                ops.push(LoadoutOp::remove_item(loc, Arc::clone(item)));
            }
        }
        ops.extend(self.build_strip_armor());
        ops
    }

    fn build_max_armor(&self, front_back_ratio: f64) -> Vec<LoadoutOp> {
        let mut ops = Vec::new();
        for component in self.components() {
            let loc = component.location();
            let max = component.internal().armor_max();
            if loc.has_rear_armor() {
                let front = if front_back_ratio.is_finite() && front_back_ratio > 0.0 {
                    ((max as f64) * front_back_ratio / (front_back_ratio + 1.0)).round() as u32
                } else {
                    max
                };
                let front = front.min(max);
                ops.push(LoadoutOp::set_armor(loc, ArmorSide::Back, 0, false));
                ops.push(LoadoutOp::set_armor(loc, ArmorSide::Front, front, false));
                ops.push(LoadoutOp::set_armor(loc, ArmorSide::Back, max - front, false));
            } else {
                ops.push(LoadoutOp::set_armor(loc, ArmorSide::Only, max, false));
            }
        }
        ops
    }

    fn build_heat_sink_type(
        &self,
        upgrade: &Arc<HeatSinkUpgrade>,
    ) -> Result<Vec<LoadoutOp>, CommandError> {
        let mut scratch = self.clone();
        let mut sink = MessageBuffer::new();
        let mut ops = Vec::new();
        let mut trial = |scratch: &mut Loadout, op: LoadoutOp, ops: &mut Vec<LoadoutOp>| {
            let mut probe = op.clone();
            apply(scratch, &mut probe, &mut sink).map(|_| ops.push(op))
        };

        let mut removed = Vec::new();
        for component in self.components() {
            let sinks: Vec<_> = component
                .items_equipped()
                .iter()
                .rev()
                .filter(|i| i.is_heat_sink())
                .cloned()
                .collect();
            if !sinks.is_empty() {
                removed.push((component.location(), sinks.len()));
            }
            for hs in sinks {
                trial(&mut scratch, LoadoutOp::remove_item(component.location(), hs), &mut ops)?;
            }
        }
        trial(
            &mut scratch,
            LoadoutOp::set_heat_sink_upgrade(Arc::clone(upgrade)),
            &mut ops,
        )?;

        let new_sink = &upgrade.heat_sink;
        for (location, count) in removed {
            for _ in 0..count {
                if !scratch.can_equip(location, new_sink).is_success() {
                    break;
                }
                trial(
                    &mut scratch,
                    LoadoutOp::add_item(location, Arc::clone(new_sink)),
                    &mut ops,
                )?;
            }
        }
        Ok(ops)
    }
}

impl Transactional for Loadout {
    type Op = LoadoutOp;
    type Recipe = LoadoutRecipe;

    fn apply_op(&mut self, op: &mut LoadoutOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
        apply(self, op, out)
    }

    fn undo_op(&mut self, op: &mut LoadoutOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
        undo(self, op, out)
    }

    fn build(&self, recipe: &LoadoutRecipe) -> Result<Vec<Command<Self>>, CommandError> {
        let ops = match recipe {
            LoadoutRecipe::Equip { location, item } => self.build_equip(*location, item),
            LoadoutRecipe::Unequip { location, item } => self.build_unequip(*location, item),
            LoadoutRecipe::Strip => self.build_strip(),
            LoadoutRecipe::StripArmor => self.build_strip_armor(),
            LoadoutRecipe::MaxArmor { front_back_ratio } => self.build_max_armor(*front_back_ratio),
            LoadoutRecipe::SetArmorSymmetric {
                location,
                side,
                amount,
                manual,
            } => {
                let mut ops = vec![LoadoutOp::set_armor(*location, *side, *amount, *manual)];
                if location.mirror() != *location {
                    ops.push(LoadoutOp::set_armor(location.mirror(), *side, *amount, *manual));
                }
                ops
            }
            LoadoutRecipe::SetHeatSinkType { upgrade } => self.build_heat_sink_type(upgrade)?,
            LoadoutRecipe::Batch { ops, .. } => ops.clone(),
        };
        Ok(ops.into_iter().map(Command::op).collect())
    }

    fn op_coalesces(op: &LoadoutOp, previous: &LoadoutOp) -> bool {
        match (op, previous) {
            (
                LoadoutOp::SetArmor {
                    location,
                    side,
                    manual,
                    ..
                },
                LoadoutOp::SetArmor {
                    location: prev_location,
                    side: prev_side,
                    manual: prev_manual,
                    ..
                },
            ) => location == prev_location && side == prev_side && manual == prev_manual,
            _ => false,
        }
    }

    fn recipe_coalesces(recipe: &LoadoutRecipe, previous: &LoadoutRecipe) -> bool {
        match (recipe, previous) {
            (
                LoadoutRecipe::SetArmorSymmetric {
                    location,
                    side,
                    manual,
                    ..
                },
                LoadoutRecipe::SetArmorSymmetric {
                    location: prev_location,
                    side: prev_side,
                    manual: prev_manual,
                    ..
                },
            ) => {
                (location == prev_location || location.mirror() == *prev_location)
                    && side == prev_side
                    && manual == prev_manual
            }
            _ => false,
        }
    }
}
