//! Immutable equipment definitions.

use super::chassis::HardPointType;
use super::CatalogError;
use crate::attribute::{Attribute, Modifier};
use crate::stats::RangeProfile;
use serde::Deserialize;

/// Double-fire (ultra autocannon style) behaviour: fires twice per cycle unless it jams.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleFire {
    pub jam_probability: Attribute,
    pub jam_time: Attribute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponStats {
    pub damage: Attribute,
    pub cooldown: Attribute,
    /// Beam/burn duration added to the cooldown to get the firing period.
    pub duration: Attribute,
    pub heat: Attribute,
    pub range: RangeProfile,
    /// Needs the lower arm and hand actuators removed on omnimech arms.
    pub large_bore: bool,
    pub double_fire: Option<DoubleFire>,
}

impl WeaponStats {
    /// Seconds between the start of two consecutive shots.
    pub fn period(&self, modifiers: &[Modifier]) -> f64 {
        self.cooldown.value(modifiers).max(0.0) + self.duration.value(modifiers).max(0.0)
    }

    pub fn damage_per_second(&self, modifiers: &[Modifier]) -> f64 {
        let period = self.period(modifiers);
        if period <= 0.0 {
            return 0.0;
        }
        self.damage.value(modifiers) / period
    }

    pub fn heat_per_second(&self, modifiers: &[Modifier]) -> f64 {
        let period = self.period(modifiers);
        if period <= 0.0 {
            return 0.0;
        }
        self.heat.value(modifiers) / period
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub rating: u32,
    /// Heat sinks that can be mounted inside the engine without using critical slots.
    pub heat_sink_slots: u32,
    /// Heat sinks built into the engine.
    pub internal_heat_sinks: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatSinkStats {
    pub dissipation: Attribute,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Generic,
    Weapon(WeaponStats),
    Engine(EngineStats),
    HeatSink(HeatSinkStats),
    JumpJet,
    Case,
    /// Actuators, gyro, cockpit and other chassis-fixed parts. Never user-equippable.
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub mass: f64,
    pub slots: u32,
    pub hardpoint: HardPointType,
    /// Critical damage the item absorbs before it is destroyed.
    pub health: f64,
    pub crittable: bool,
    pub tags: Vec<String>,
    pub kind: ItemKind,
}

impl Item {
    pub fn weapon(&self) -> Option<&WeaponStats> {
        match &self.kind {
            ItemKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn engine(&self) -> Option<&EngineStats> {
        match &self.kind {
            ItemKind::Engine(e) => Some(e),
            _ => None,
        }
    }

    pub fn heat_sink(&self) -> Option<&HeatSinkStats> {
        match &self.kind {
            ItemKind::HeatSink(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_heat_sink(&self) -> bool {
        self.heat_sink().is_some()
    }

    pub fn is_large_bore(&self) -> bool {
        self.weapon().map(|w| w.large_bore).unwrap_or(false)
    }

    /// Weapons that deal damage to enemy mechs (AMS only shoots missiles).
    pub fn is_offensive_weapon(&self) -> bool {
        self.weapon().is_some() && self.hardpoint != HardPointType::Ams
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RangeDef {
    #[serde(default)]
    pub zero: f64,
    #[serde(default)]
    pub min: f64,
    pub long: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DoubleFireDef {
    pub jam_probability: f64,
    pub jam_time: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WeaponDef {
    pub damage: f64,
    pub cooldown: f64,
    #[serde(default)]
    pub duration: f64,
    pub heat: f64,
    pub range: RangeDef,
    #[serde(default)]
    pub large_bore: bool,
    #[serde(default)]
    pub double_fire: Option<DoubleFireDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EngineDef {
    pub rating: u32,
    #[serde(default)]
    pub heat_sink_slots: u32,
    #[serde(default = "default_internal_heat_sinks")]
    pub internal_heat_sinks: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HeatSinkDef {
    pub dissipation: f64,
}

fn default_internal_heat_sinks() -> u32 {
    10
}

fn default_slots() -> u32 {
    1
}

fn default_health() -> f64 {
    10.0
}

fn default_crittable() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ItemDef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub mass: f64,
    #[serde(default = "default_slots")]
    pub slots: u32,
    #[serde(default)]
    pub hardpoint: HardPointType,
    #[serde(default = "default_health")]
    pub health: f64,
    #[serde(default = "default_crittable")]
    pub crittable: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub weapon: Option<WeaponDef>,
    #[serde(default)]
    pub engine: Option<EngineDef>,
    #[serde(default)]
    pub heat_sink: Option<HeatSinkDef>,
    #[serde(default)]
    pub jump_jet: bool,
    #[serde(default)]
    pub case: bool,
    #[serde(default)]
    pub internal: bool,
}

impl ItemDef {
    pub fn into_item(self) -> Result<Item, CatalogError> {
        let kinds = [
            self.weapon.is_some(),
            self.engine.is_some(),
            self.heat_sink.is_some(),
            self.jump_jet,
            self.case,
            self.internal,
        ];
        if kinds.iter().filter(|k| **k).count() > 1 {
            return Err(CatalogError::Invalid {
                name: self.name,
                reason: "an item can only have one kind".to_string(),
            });
        }
        if self.mass < 0.0 {
            return Err(CatalogError::Invalid {
                name: self.name,
                reason: format!("negative mass {}", self.mass),
            });
        }
        // Every attribute is selectable by the item's tags and its own name.
        let mut selectors = self.tags.clone();
        selectors.push(crate::util::normalize_id(&self.name));

        let kind = if let Some(w) = self.weapon {
            if w.weapon_period_invalid() {
                return Err(CatalogError::Invalid {
                    name: self.name,
                    reason: "weapon needs a positive cooldown or duration".to_string(),
                });
            }
            let attr = |v: f64, spec: &str| Attribute::new(v, selectors.clone(), Some(spec));
            ItemKind::Weapon(WeaponStats {
                damage: attr(w.damage, "damage"),
                cooldown: attr(w.cooldown, "cooldown"),
                duration: attr(w.duration, "duration"),
                heat: attr(w.heat, "heat"),
                range: RangeProfile::new(
                    w.range.zero,
                    w.range.min,
                    w.range.long,
                    w.range.max,
                    &selectors,
                ),
                large_bore: w.large_bore,
                double_fire: w.double_fire.map(|d| DoubleFire {
                    jam_probability: attr(d.jam_probability, "jamchance"),
                    jam_time: attr(d.jam_time, "jamduration"),
                }),
            })
        } else if let Some(e) = self.engine {
            ItemKind::Engine(EngineStats {
                rating: e.rating,
                heat_sink_slots: e.heat_sink_slots,
                internal_heat_sinks: e.internal_heat_sinks,
            })
        } else if let Some(h) = self.heat_sink {
            let mut hs_selectors = selectors.clone();
            hs_selectors.push("heatsink".to_string());
            ItemKind::HeatSink(HeatSinkStats {
                dissipation: Attribute::new(h.dissipation, hs_selectors, Some("heatdissipation")),
            })
        } else if self.jump_jet {
            ItemKind::JumpJet
        } else if self.case {
            ItemKind::Case
        } else if self.internal {
            ItemKind::Internal
        } else {
            ItemKind::Generic
        };

        Ok(Item {
            id: self.id,
            name: self.name,
            mass: self.mass,
            slots: self.slots,
            hardpoint: self.hardpoint,
            health: self.health,
            crittable: self.crittable,
            tags: self.tags,
            kind,
        })
    }
}

impl WeaponDef {
    fn weapon_period_invalid(&self) -> bool {
        self.cooldown + self.duration <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(toml_src: &str) -> ItemDef {
        toml::from_str(toml_src).expect("item def")
    }

    #[test]
    fn weapon_dps_uses_cooldown_plus_duration() {
        let item = def(r#"
            id = 1
            name = "MEDIUM LASER"
            mass = 1.0
            hardpoint = "energy"
            tags = ["energy", "laser"]
            [weapon]
            damage = 5.0
            cooldown = 3.0
            duration = 1.0
            heat = 4.0
            range = { long = 270.0, max = 540.0 }
        "#)
        .into_item()
        .unwrap();
        let w = item.weapon().unwrap();
        assert!((w.damage_per_second(&[]) - 1.25).abs() < 1e-12);
        assert!((w.heat_per_second(&[]) - 1.0).abs() < 1e-12);
        assert!(item.is_offensive_weapon());
    }

    #[test]
    fn two_kinds_rejected() {
        let r = def(r#"
            id = 2
            name = "BROKEN"
            jump_jet = true
            case = true
        "#)
        .into_item();
        assert!(matches!(r, Err(CatalogError::Invalid { .. })));
    }

    #[test]
    fn engine_defaults_ten_internal_heat_sinks() {
        let item = def(r#"
            id = 3
            name = "STD ENGINE 200"
            mass = 8.5
            slots = 6
            [engine]
            rating = 200
        "#)
        .into_item()
        .unwrap();
        let e = item.engine().unwrap();
        assert_eq!(e.internal_heat_sinks, 10);
        assert_eq!(e.heat_sink_slots, 0);
    }
}
