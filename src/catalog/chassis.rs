//! Chassis and body locations: fixed slot layout, hardpoints and structure of each component.

use super::item::{Item, ItemKind};
use crate::attribute::{Attribute, Modifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString};

/// The eight body locations of a mech.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum Location {
    #[serde(rename = "HD")]
    #[strum(serialize = "HD")]
    Head,
    #[serde(rename = "RA")]
    #[strum(serialize = "RA")]
    RightArm,
    #[serde(rename = "RT")]
    #[strum(serialize = "RT")]
    RightTorso,
    #[serde(rename = "CT")]
    #[strum(serialize = "CT")]
    CenterTorso,
    #[serde(rename = "LT")]
    #[strum(serialize = "LT")]
    LeftTorso,
    #[serde(rename = "LA")]
    #[strum(serialize = "LA")]
    LeftArm,
    #[serde(rename = "RL")]
    #[strum(serialize = "RL")]
    RightLeg,
    #[serde(rename = "LL")]
    #[strum(serialize = "LL")]
    LeftLeg,
}

impl Location {
    pub const ALL: [Location; 8] = [
        Location::Head,
        Location::RightArm,
        Location::RightTorso,
        Location::CenterTorso,
        Location::LeftTorso,
        Location::LeftArm,
        Location::RightLeg,
        Location::LeftLeg,
    ];

    /// Order in which floating armor/structure slots are handed out.
    pub const RIGHT_TO_LEFT: [Location; 8] = [
        Location::RightArm,
        Location::RightTorso,
        Location::RightLeg,
        Location::Head,
        Location::CenterTorso,
        Location::LeftTorso,
        Location::LeftLeg,
        Location::LeftArm,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The location on the other side of the mech; head and center torso mirror to themselves.
    pub fn mirror(self) -> Location {
        match self {
            Location::RightArm => Location::LeftArm,
            Location::LeftArm => Location::RightArm,
            Location::RightTorso => Location::LeftTorso,
            Location::LeftTorso => Location::RightTorso,
            Location::RightLeg => Location::LeftLeg,
            Location::LeftLeg => Location::RightLeg,
            other => other,
        }
    }

    /// Torsos carry separate front and back armor.
    pub fn has_rear_armor(self) -> bool {
        matches!(
            self,
            Location::LeftTorso | Location::CenterTorso | Location::RightTorso
        )
    }

    pub fn is_arm(self) -> bool {
        matches!(self, Location::LeftArm | Location::RightArm)
    }
}

/// Which face of a component an armor value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArmorSide {
    Only,
    Front,
    Back,
}

/// Weapon category a hardpoint accepts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HardPointType {
    #[default]
    None,
    Energy,
    Ballistic,
    Missile,
    Ams,
    Ecm,
}

/// Fixed, chassis-defined part of one location.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalComponent {
    pub location: Location,
    pub slots: u32,
    pub hit_points: Attribute,
    pub hardpoints: Vec<HardPointType>,
    pub fixed: Vec<Arc<Item>>,
    pub toggleable: Vec<Arc<Item>>,
}

impl InternalComponent {
    pub const HEAD_ARMOR_MAX: u32 = 18;

    pub fn hardpoint_count(&self, ty: HardPointType) -> u32 {
        self.hardpoints.iter().filter(|h| **h == ty).count() as u32
    }

    pub fn armor_max(&self) -> u32 {
        if self.location == Location::Head {
            Self::HEAD_ARMOR_MAX
        } else {
            (self.hit_points.base() * 2.0).round() as u32
        }
    }

    pub fn is_toggleable(&self, item: &Item) -> bool {
        self.toggleable.iter().any(|t| t.id == item.id)
    }

    /// Whether this location can ever hold `item`, regardless of what is already equipped.
    pub fn is_allowed(&self, item: &Item) -> bool {
        match item.kind {
            ItemKind::Internal => false,
            ItemKind::Engine(_) => self.location == Location::CenterTorso,
            ItemKind::JumpJet => !matches!(
                self.location,
                Location::Head | Location::LeftArm | Location::RightArm
            ),
            ItemKind::Case => self.location != Location::Head,
            _ => true,
        }
    }
}

/// A mech chassis (variant): tonnage, engine limits, quirks and the eight internal components.
#[derive(Debug, Clone, PartialEq)]
pub struct Chassis {
    pub name: String,
    pub mass: f64,
    pub speed_factor: Attribute,
    pub engine_min: u32,
    pub engine_max: u32,
    pub jump_jets_max: u32,
    pub omni: bool,
    pub quirks: Vec<Modifier>,
    pub default_armor: String,
    pub default_structure: String,
    pub default_heat_sink: String,
    pub default_guidance: String,
    pub(crate) components: Vec<InternalComponent>,
}

impl Chassis {
    pub fn component(&self, location: Location) -> &InternalComponent {
        &self.components[location.index()]
    }

    pub fn components(&self) -> &[InternalComponent] {
        &self.components
    }

    pub fn supports_engine(&self, rating: u32) -> bool {
        (self.engine_min..=self.engine_max).contains(&rating)
    }

    /// Engine fixed into the chassis (omnimechs), if any.
    pub fn fixed_engine(&self) -> Option<&Arc<Item>> {
        self.component(Location::CenterTorso)
            .fixed
            .iter()
            .find(|i| i.engine().is_some())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ComponentDef {
    pub location: Location,
    pub slots: u32,
    pub hit_points: f64,
    #[serde(default)]
    pub hardpoints: Vec<HardPointType>,
    #[serde(default)]
    pub fixed: Vec<String>,
    #[serde(default)]
    pub toggleable: Vec<String>,
}

fn default_speed_factor() -> f64 {
    16.2
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ChassisDef {
    pub name: String,
    pub mass: f64,
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,
    pub engine_min: u32,
    pub engine_max: u32,
    #[serde(default)]
    pub jump_jets_max: u32,
    #[serde(default)]
    pub omni: bool,
    #[serde(default)]
    pub quirks: Vec<String>,
    pub armor: String,
    pub structure: String,
    pub heat_sink: String,
    pub guidance: String,
    #[serde(rename = "component")]
    pub components: Vec<ComponentDef>,
}
