//! Serializable form of a loadout, used for loadout files and the garage store.
//!
//! A record names everything by catalog name. Turning it back into a
//! [`Loadout`] replays it through the command layer, so a record that breaks
//! any loadout rule is refused as a whole.

use super::{Loadout, Upgrades};
use crate::catalog::{ArmorSide, Catalog, CatalogError, Location};
use crate::command::{Command, CommandError, CommandStack, LoadoutOp, LoadoutRecipe};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("loadout parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("component {0} listed twice")]
    DuplicateLocation(Location),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradesRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_sink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentRecord {
    pub location: Location,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    /// Front armor on torsos, the only armor elsewhere.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub armor: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub armor_back: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toggled_off: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadoutRecord {
    pub name: String,
    pub chassis: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pilot_modifiers: Vec<String>,
    #[serde(default)]
    pub upgrades: UpgradesRecord,
    #[serde(default, rename = "component", skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentRecord>,
}

impl LoadoutRecord {
    pub fn from_loadout(loadout: &Loadout) -> Self {
        let upgrades = loadout.upgrades();
        let components = loadout
            .components()
            .iter()
            .filter_map(|c| {
                let toggled_off: Vec<String> = c
                    .internal()
                    .toggleable
                    .iter()
                    .filter(|t| c.toggle_state(t) == Some(false))
                    .map(|t| t.name.clone())
                    .collect();
                let (armor, armor_back) = if c.location().has_rear_armor() {
                    (c.armor(ArmorSide::Front), c.armor(ArmorSide::Back))
                } else {
                    (c.armor(ArmorSide::Only), 0)
                };
                let record = ComponentRecord {
                    location: c.location(),
                    items: c.items_equipped().iter().map(|i| i.name.clone()).collect(),
                    armor,
                    armor_back,
                    toggled_off,
                };
                let empty = record.items.is_empty()
                    && record.toggled_off.is_empty()
                    && armor == 0
                    && armor_back == 0;
                (!empty).then_some(record)
            })
            .collect();
        Self {
            name: loadout.name().to_string(),
            chassis: loadout.chassis().name.clone(),
            pilot_modifiers: loadout
                .pilot_modifiers()
                .iter()
                .map(|m| m.name().to_string())
                .collect(),
            upgrades: UpgradesRecord {
                armor: Some(upgrades.armor.name.clone()),
                structure: Some(upgrades.structure.name.clone()),
                heat_sink: Some(upgrades.heat_sink.name.clone()),
                guidance: Some(upgrades.guidance.name.clone()),
            },
            components,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RecordError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path).map_err(|source| RecordError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolves every name and returns the edits that turn an empty loadout into this record.
    fn ops(&self, catalog: &Catalog, empty: &Loadout) -> Result<Vec<LoadoutOp>, RecordError> {
        let mut ops = Vec::new();
        let up = &self.upgrades;
        if let Some(name) = &up.heat_sink {
            ops.push(LoadoutOp::set_heat_sink_upgrade(
                catalog.lookup_heat_sink_upgrade(name)?,
            ));
        }
        if let Some(name) = &up.structure {
            ops.push(LoadoutOp::set_structure_upgrade(catalog.lookup_structure(name)?));
        }
        if let Some(name) = &up.armor {
            ops.push(LoadoutOp::set_armor_upgrade(catalog.lookup_armor(name)?));
        }
        if let Some(name) = &up.guidance {
            ops.push(LoadoutOp::set_guidance_upgrade(catalog.lookup_guidance(name)?));
        }
        if !self.pilot_modifiers.is_empty() {
            let modifiers = self
                .pilot_modifiers
                .iter()
                .map(|m| catalog.lookup_modifier(m))
                .collect::<Result<Vec<_>, _>>()?;
            ops.push(LoadoutOp::set_modifiers(modifiers));
        }

        let mut seen = Vec::new();
        for c in &self.components {
            if seen.contains(&c.location) {
                return Err(RecordError::DuplicateLocation(c.location));
            }
            seen.push(c.location);
        }

        // Actuators go first: a large-bore weapon only fits once they are off.
        for c in &self.components {
            let toggleable = &empty.component(c.location).internal().toggleable;
            let mut off = c
                .toggled_off
                .iter()
                .map(|n| catalog.lookup_item(n))
                .collect::<Result<Vec<_>, _>>()?;
            off.sort_by_key(|item| {
                std::cmp::Reverse(toggleable.iter().position(|t| t.id == item.id))
            });
            for item in off {
                ops.push(LoadoutOp::toggle_item(c.location, item, false));
            }
        }
        for c in &self.components {
            for name in &c.items {
                ops.push(LoadoutOp::add_item(c.location, catalog.lookup_item(name)?));
            }
        }
        for c in &self.components {
            if c.location.has_rear_armor() {
                ops.push(LoadoutOp::set_armor(c.location, ArmorSide::Front, c.armor, true));
                ops.push(LoadoutOp::set_armor(c.location, ArmorSide::Back, c.armor_back, true));
            } else {
                ops.push(LoadoutOp::set_armor(c.location, ArmorSide::Only, c.armor, true));
            }
        }
        Ok(ops)
    }

    /// Builds the loadout inside a fresh command stack. The whole record is one history entry.
    pub fn assemble(
        &self,
        catalog: &Catalog,
        undo_depth: usize,
    ) -> Result<CommandStack<Loadout>, RecordError> {
        let chassis = catalog.lookup_chassis(&self.chassis)?;
        let upgrades = Upgrades::defaults_for(&chassis, catalog)?;
        let mut empty = Loadout::new(self.name.clone(), chassis, upgrades);
        if self.name.trim().is_empty() {
            empty.set_name(self.chassis.clone());
        }
        let ops = self.ops(catalog, &empty)?;
        let mut stack = CommandStack::new(empty, undo_depth);
        stack.push_and_apply(Command::composite(LoadoutRecipe::Batch {
            description: format!("load {}", self.name),
            ops,
        }))?;
        tracing::debug!(
            "assembled {} ({} with {} component record(s))",
            self.name,
            self.chassis,
            self.components.len()
        );
        Ok(stack)
    }

    pub fn build(&self, catalog: &Catalog) -> Result<Loadout, RecordError> {
        Ok(self.assemble(catalog, 1)?.into_target())
    }
}
