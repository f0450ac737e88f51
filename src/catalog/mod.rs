//! Read-only equipment and chassis database, loaded once from TOML and looked up by name or ID.

mod chassis;
mod item;
mod upgrade;

pub use chassis::{ArmorSide, Chassis, HardPointType, InternalComponent, Location};
pub use item::{DoubleFire, EngineStats, HeatSinkStats, Item, ItemKind, WeaponStats};
pub use upgrade::{ArmorUpgrade, GuidanceUpgrade, HeatSinkUpgrade, StructureUpgrade};

use crate::attribute::{Attribute, Modifier};
use crate::util::normalize_id;
use chassis::ChassisDef;
use item::ItemDef;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use upgrade::UpgradeDef;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("duplicate {kind}: {key}")]
    Duplicate { kind: &'static str, key: String },
    #[error("invalid definition of {name}: {reason}")]
    Invalid { name: String, reason: String },
    #[error("catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    fn not_found(kind: &'static str, key: &str) -> Self {
        CatalogError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDef {
    #[serde(default, rename = "item")]
    items: Vec<ItemDef>,
    #[serde(default, rename = "upgrade")]
    upgrades: Vec<UpgradeDef>,
    #[serde(default, rename = "modifier")]
    modifiers: Vec<Modifier>,
    #[serde(default, rename = "chassis")]
    chassis: Vec<ChassisDef>,
}

/// Immutable lookup service for items, chassis, upgrades and named modifiers.
#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<Arc<Item>>,
    items_by_name: HashMap<String, usize>,
    items_by_id: HashMap<u32, usize>,
    chassis: HashMap<String, Arc<Chassis>>,
    armor: HashMap<String, Arc<ArmorUpgrade>>,
    structure: HashMap<String, Arc<StructureUpgrade>>,
    heat_sinks: HashMap<String, Arc<HeatSinkUpgrade>>,
    guidance: HashMap<String, Arc<GuidanceUpgrade>>,
    modifiers: HashMap<String, Modifier>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let def: CatalogDef = toml::from_str(content)?;
        let mut catalog = Catalog::default();

        for item_def in def.items {
            let item = item_def.into_item()?;
            let key = normalize_id(&item.name);
            if catalog.items_by_name.contains_key(&key) {
                return Err(CatalogError::Duplicate { kind: "item", key });
            }
            if catalog.items_by_id.contains_key(&item.id) {
                return Err(CatalogError::Duplicate {
                    kind: "item id",
                    key: item.id.to_string(),
                });
            }
            let idx = catalog.items.len();
            catalog.items_by_name.insert(key, idx);
            catalog.items_by_id.insert(item.id, idx);
            catalog.items.push(Arc::new(item));
        }

        for upgrade in def.upgrades {
            catalog.insert_upgrade(upgrade)?;
        }

        for modifier in def.modifiers {
            let key = normalize_id(modifier.name());
            if catalog.modifiers.insert(key.clone(), modifier).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "modifier",
                    key,
                });
            }
        }

        for chassis_def in def.chassis {
            let chassis = catalog.resolve_chassis(chassis_def)?;
            let key = normalize_id(&chassis.name);
            if catalog.chassis.insert(key.clone(), Arc::new(chassis)).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "chassis",
                    key,
                });
            }
        }

        tracing::debug!(
            items = catalog.items.len(),
            chassis = catalog.chassis.len(),
            modifiers = catalog.modifiers.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn insert_upgrade(&mut self, def: UpgradeDef) -> Result<(), CatalogError> {
        let (kind, key, duplicate) = match def {
            UpgradeDef::Armor {
                name,
                armor_per_ton,
                dynamic_slots,
            } => {
                if armor_per_ton <= 0.0 {
                    return Err(CatalogError::Invalid {
                        name,
                        reason: "armor_per_ton must be positive".to_string(),
                    });
                }
                let key = normalize_id(&name);
                let up = ArmorUpgrade {
                    name,
                    armor_per_ton,
                    dynamic_slots,
                };
                let dup = self.armor.insert(key.clone(), Arc::new(up)).is_some();
                ("armor upgrade", key, dup)
            }
            UpgradeDef::Structure {
                name,
                mass_fraction,
                dynamic_slots,
            } => {
                let key = normalize_id(&name);
                let up = StructureUpgrade {
                    name,
                    mass_fraction,
                    dynamic_slots,
                };
                let dup = self.structure.insert(key.clone(), Arc::new(up)).is_some();
                ("structure upgrade", key, dup)
            }
            UpgradeDef::HeatSink { name, heat_sink } => {
                let item = self.lookup_item(&heat_sink)?;
                if !item.is_heat_sink() {
                    return Err(CatalogError::Invalid {
                        name,
                        reason: format!("{} is not a heat sink", item.name),
                    });
                }
                let key = normalize_id(&name);
                let up = HeatSinkUpgrade {
                    name,
                    heat_sink: item,
                };
                let dup = self.heat_sinks.insert(key.clone(), Arc::new(up)).is_some();
                ("heat sink upgrade", key, dup)
            }
            UpgradeDef::Guidance {
                name,
                tons_per_launcher,
            } => {
                let key = normalize_id(&name);
                let up = GuidanceUpgrade {
                    name,
                    tons_per_launcher,
                };
                let dup = self.guidance.insert(key.clone(), Arc::new(up)).is_some();
                ("guidance upgrade", key, dup)
            }
        };
        if duplicate {
            return Err(CatalogError::Duplicate { kind, key });
        }
        Ok(())
    }

    fn resolve_chassis(&self, def: ChassisDef) -> Result<Chassis, CatalogError> {
        let mut slots: Vec<Option<InternalComponent>> = vec![None; Location::ALL.len()];
        for c in def.components {
            let resolve = |names: &[String]| -> Result<Vec<Arc<Item>>, CatalogError> {
                names.iter().map(|n| self.lookup_item(n)).collect()
            };
            let fixed = resolve(&c.fixed)?;
            let toggleable = resolve(&c.toggleable)?;
            if let Some(t) = toggleable.iter().find(|t| !fixed.iter().any(|f| f.id == t.id)) {
                return Err(CatalogError::Invalid {
                    name: def.name,
                    reason: format!("toggleable {} is not a fixed item of {}", t.name, c.location),
                });
            }
            let component = InternalComponent {
                location: c.location,
                slots: c.slots,
                hit_points: Attribute::new(
                    c.hit_points,
                    vec!["structure".to_string(), c.location.to_string().to_lowercase()],
                    Some("hitpoints"),
                ),
                hardpoints: c.hardpoints,
                fixed,
                toggleable,
            };
            let slot = &mut slots[c.location.index()];
            if slot.is_some() {
                return Err(CatalogError::Invalid {
                    name: def.name,
                    reason: format!("component {} defined twice", c.location),
                });
            }
            *slot = Some(component);
        }
        let mut components = Vec::with_capacity(slots.len());
        for (loc, slot) in Location::ALL.iter().zip(slots) {
            match slot {
                Some(c) => components.push(c),
                None => {
                    return Err(CatalogError::Invalid {
                        name: def.name,
                        reason: format!("missing component {}", loc),
                    })
                }
            }
        }

        let quirks = def
            .quirks
            .iter()
            .map(|q| self.lookup_modifier(q))
            .collect::<Result<Vec<_>, _>>()?;
        // Default upgrades must resolve now so a fresh loadout can never fail.
        self.lookup_armor(&def.armor)?;
        self.lookup_structure(&def.structure)?;
        self.lookup_heat_sink_upgrade(&def.heat_sink)?;
        self.lookup_guidance(&def.guidance)?;

        let selector = normalize_id(&def.name);
        Ok(Chassis {
            speed_factor: Attribute::new(
                def.speed_factor,
                vec!["chassis".to_string(), selector],
                Some("speed"),
            ),
            name: def.name,
            mass: def.mass,
            engine_min: def.engine_min,
            engine_max: def.engine_max,
            jump_jets_max: def.jump_jets_max,
            omni: def.omni,
            quirks,
            default_armor: def.armor,
            default_structure: def.structure,
            default_heat_sink: def.heat_sink,
            default_guidance: def.guidance,
            components,
        })
    }

    pub fn lookup_item(&self, name: &str) -> Result<Arc<Item>, CatalogError> {
        self.items_by_name
            .get(&normalize_id(name))
            .map(|idx| Arc::clone(&self.items[*idx]))
            .ok_or_else(|| CatalogError::not_found("item", name))
    }

    pub fn lookup_item_by_id(&self, id: u32) -> Result<Arc<Item>, CatalogError> {
        self.items_by_id
            .get(&id)
            .map(|idx| Arc::clone(&self.items[*idx]))
            .ok_or_else(|| CatalogError::not_found("item id", &id.to_string()))
    }

    pub fn lookup_chassis(&self, name: &str) -> Result<Arc<Chassis>, CatalogError> {
        self.chassis
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found("chassis", name))
    }

    /// Internal component of a chassis at a location.
    pub fn lookup_component(
        &self,
        chassis: &str,
        location: Location,
    ) -> Result<InternalComponent, CatalogError> {
        Ok(self.lookup_chassis(chassis)?.component(location).clone())
    }

    pub fn lookup_armor(&self, name: &str) -> Result<Arc<ArmorUpgrade>, CatalogError> {
        self.armor
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found("armor upgrade", name))
    }

    pub fn lookup_structure(&self, name: &str) -> Result<Arc<StructureUpgrade>, CatalogError> {
        self.structure
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found("structure upgrade", name))
    }

    pub fn lookup_heat_sink_upgrade(
        &self,
        name: &str,
    ) -> Result<Arc<HeatSinkUpgrade>, CatalogError> {
        self.heat_sinks
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found("heat sink upgrade", name))
    }

    pub fn lookup_guidance(&self, name: &str) -> Result<Arc<GuidanceUpgrade>, CatalogError> {
        self.guidance
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found("guidance upgrade", name))
    }

    pub fn lookup_modifier(&self, name: &str) -> Result<Modifier, CatalogError> {
        self.modifiers
            .get(&normalize_id(name))
            .cloned()
            .ok_or_else(|| CatalogError::not_found("modifier", name))
    }

    pub fn items(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.iter()
    }
}

#[cfg(test)]
pub(crate) fn test_catalog() -> Catalog {
    Catalog::from_toml_str(include_str!("../../fixtures/catalog.toml")).expect("fixture catalog")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let c = test_catalog();
        let a = c.lookup_item("medium laser").unwrap();
        let b = c.lookup_item("  MEDIUM LASER ").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(c.lookup_item_by_id(a.id).unwrap().name, a.name);
    }

    #[test]
    fn unknown_keys_are_not_found() {
        let c = test_catalog();
        assert!(matches!(
            c.lookup_item("PHOTON TORPEDO"),
            Err(CatalogError::NotFound { kind: "item", .. })
        ));
        assert!(c.lookup_chassis("ATLAS").is_err());
        assert!(c.lookup_modifier("nope").is_err());
    }

    #[test]
    fn chassis_components_indexed_by_location() {
        let c = test_catalog();
        let hbk = c.lookup_chassis("HBK-4P").unwrap();
        for loc in Location::ALL {
            assert_eq!(hbk.component(loc).location, loc);
        }
        assert_eq!(
            hbk.component(Location::RightTorso)
                .hardpoint_count(HardPointType::Energy),
            2
        );
        assert_eq!(hbk.component(Location::Head).armor_max(), 18);
    }

    #[test]
    fn omni_chassis_has_fixed_engine() {
        let c = test_catalog();
        let omni = c.lookup_chassis("TBR-PRIME").unwrap();
        assert!(omni.omni);
        assert!(omni.fixed_engine().is_some());
        let la = omni.component(Location::LeftArm);
        assert_eq!(la.toggleable.len(), 2);
    }

    #[test]
    fn duplicate_item_rejected() {
        let src = r#"
            [[item]]
            id = 1
            name = "A"
            [[item]]
            id = 2
            name = "a"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(src),
            Err(CatalogError::Duplicate { kind: "item", .. })
        ));
    }
}
