//! Placement of floating (dynamic) armor and structure slots.
//!
//! Free slots of all components are laid end to end in [`Location::RIGHT_TO_LEFT`]
//! order. Dynamic armor slots fill that sequence first, dynamic structure slots
//! continue where armor stopped. Slots that do not fit anywhere are simply left
//! unallocated; callers report that as a warning.

use super::Loadout;
use crate::catalog::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicSlotDistributor {
    armor_slots: u32,
    structure_slots: u32,
}

/// Dynamic slots placed on each location, indexed by [`Location::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotDistribution {
    pub armor: [u32; 8],
    pub structure: [u32; 8],
    pub unallocated_armor: u32,
    pub unallocated_structure: u32,
}

impl SlotDistribution {
    pub fn total(&self, location: Location) -> u32 {
        self.armor[location.index()] + self.structure[location.index()]
    }

    pub fn overflow(&self) -> u32 {
        self.unallocated_armor + self.unallocated_structure
    }
}

fn overlap(a: (u32, u32), b: (u32, u32)) -> u32 {
    let lo = a.0.max(b.0);
    let hi = a.1.min(b.1);
    hi.saturating_sub(lo)
}

impl DynamicSlotDistributor {
    pub fn new(armor_slots: u32, structure_slots: u32) -> Self {
        Self {
            armor_slots,
            structure_slots,
        }
    }

    pub fn for_loadout(loadout: &Loadout) -> Self {
        let upgrades = loadout.upgrades();
        Self::new(upgrades.armor.dynamic_slots, upgrades.structure.dynamic_slots)
    }

    /// Distributes against the free slots reported by `free_slots` for each location.
    pub fn distribute(&self, free_slots: impl Fn(Location) -> u32) -> SlotDistribution {
        let armor_pool = (0, self.armor_slots);
        let structure_pool = (self.armor_slots, self.armor_slots + self.structure_slots);
        let mut out = SlotDistribution::default();
        let mut filled = 0u32;
        for loc in Location::RIGHT_TO_LEFT {
            let span = (filled, filled + free_slots(loc));
            out.armor[loc.index()] = overlap(span, armor_pool);
            out.structure[loc.index()] = overlap(span, structure_pool);
            filled = span.1;
        }
        let armor_placed: u32 = out.armor.iter().sum();
        let structure_placed: u32 = out.structure.iter().sum();
        out.unallocated_armor = self.armor_slots - armor_placed;
        out.unallocated_structure = self.structure_slots - structure_placed;
        out
    }

    pub fn distribute_over(&self, loadout: &Loadout) -> SlotDistribution {
        self.distribute(|loc| loadout.component(loc).slots_free())
    }

    pub fn dynamic_armor_slots(&self, loadout: &Loadout, location: Location) -> u32 {
        self.distribute_over(loadout).armor[location.index()]
    }

    pub fn dynamic_structure_slots(&self, loadout: &Loadout, location: Location) -> u32 {
        self.distribute_over(loadout).structure[location.index()]
    }
}
