//! Loadout statistics report: built once from a committed loadout, printed as
//! text or written as JSON.

use crate::catalog::Location;
use crate::config::AnalysisConfig;
use crate::diagnostics::{self, LoadoutWarning};
use crate::loadout::Loadout;
use crate::stats::{
    dps_series, range_breakpoints, top_speed, AlphaStrike, BurstDamageOverTime,
    ComponentDestructionSimulator, HeatDissipation, HeatModel, ItemDestruction, MaxDps,
    RangePoint, SustainedDps,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub location: Location,
    pub items: Vec<String>,
    pub slots_used: u32,
    pub slots_total: u32,
    pub dynamic_armor_slots: u32,
    pub dynamic_structure_slots: u32,
    pub armor: u32,
    pub armor_max: u32,
    pub hit_points: f64,
    pub destruction: Vec<ItemDestruction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BurstPoint {
    pub range: f64,
    pub seconds: f64,
    pub damage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadoutReport {
    pub name: String,
    pub chassis: String,
    pub mass: f64,
    pub max_mass: f64,
    pub slots_used: u32,
    pub slots_free: u32,
    pub armor: u32,
    pub armor_max: u32,
    pub upgrades: Vec<String>,
    pub engine_rating: Option<u32>,
    pub top_speed: f64,
    pub heat_sinks: u32,
    pub dissipation: f64,
    pub alpha_strike: Vec<RangePoint>,
    pub max_dps: Vec<RangePoint>,
    pub sustained_dps: Vec<RangePoint>,
    pub burst: Vec<BurstPoint>,
    pub components: Vec<ComponentReport>,
    pub warnings: Vec<LoadoutWarning>,
}

impl LoadoutReport {
    pub fn build(loadout: &Loadout, config: &AnalysisConfig) -> Self {
        let modifiers = loadout.modifiers();
        let breakpoints = range_breakpoints(loadout, &modifiers);
        let heat = HeatDissipation::new(loadout, &modifiers);

        let alpha = AlphaStrike::new(loadout, &modifiers);
        let max = MaxDps::new(loadout, &modifiers);
        let sustained = SustainedDps::new(loadout, &modifiers, &heat);
        let alpha_strike = dps_series(&alpha, &breakpoints, &config.ranges);
        let max_dps = dps_series(&max, &breakpoints, &config.ranges);
        let sustained_dps = dps_series(&sustained, &breakpoints, &config.ranges);

        let burst_calc = BurstDamageOverTime::new(loadout, &modifiers);
        let burst = max_dps
            .iter()
            .map(|p| BurstPoint {
                range: p.range,
                seconds: config.burst_seconds,
                damage: burst_calc.calculate(p.range, config.burst_seconds),
            })
            .collect();

        let simulator = ComponentDestructionSimulator::new(config.destruction.clone());
        let distribution = loadout.slot_distribution();
        let components = loadout
            .components()
            .iter()
            .map(|c| ComponentReport {
                location: c.location(),
                items: c.items_equipped().iter().map(|i| i.name.clone()).collect(),
                slots_used: c.slots_used(),
                slots_total: c.slots_total(),
                dynamic_armor_slots: distribution.armor[c.location().index()],
                dynamic_structure_slots: distribution.structure[c.location().index()],
                armor: c.armor_total(),
                armor_max: c.internal().armor_max(),
                hit_points: c.internal().hit_points.value(&modifiers),
                destruction: simulator.simulate(c, &modifiers),
            })
            .collect();

        let upgrades = loadout.upgrades();
        Self {
            name: loadout.name().to_string(),
            chassis: loadout.chassis().name.clone(),
            mass: loadout.mass(),
            max_mass: loadout.chassis().mass,
            slots_used: loadout.slots_used(),
            slots_free: loadout.slots_free(),
            armor: loadout.armor_total(),
            armor_max: loadout.armor_max_total(),
            upgrades: vec![
                upgrades.armor.name.clone(),
                upgrades.structure.name.clone(),
                upgrades.heat_sink.name.clone(),
                upgrades.guidance.name.clone(),
            ],
            engine_rating: loadout.engine_rating(),
            top_speed: top_speed(loadout, &modifiers),
            heat_sinks: heat.heat_sinks(),
            dissipation: heat.dissipation(),
            alpha_strike,
            max_dps,
            sustained_dps,
            burst,
            components,
            warnings: diagnostics::check(loadout),
        }
    }

    /// Human-readable summary for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", self.name, self.chassis);
        let _ = writeln!(out, "  mass      {:.2} / {:.1} t", self.mass, self.max_mass);
        let _ = writeln!(out, "  slots     {} used, {} free", self.slots_used, self.slots_free);
        let _ = writeln!(out, "  armor     {} / {}", self.armor, self.armor_max);
        let _ = writeln!(out, "  upgrades  {}", self.upgrades.join(", "));
        match self.engine_rating {
            Some(r) => {
                let _ = writeln!(out, "  engine    {} ({:.1} km/h)", r, self.top_speed);
            }
            None => {
                let _ = writeln!(out, "  engine    none");
            }
        }
        let _ = writeln!(
            out,
            "  heat      {} heat sinks, {:.2} heat/s",
            self.heat_sinks, self.dissipation
        );
        let _ = writeln!(out, "  range     alpha    max dps  sust dps  burst");
        for (((a, m), s), b) in self
            .alpha_strike
            .iter()
            .zip(&self.max_dps)
            .zip(&self.sustained_dps)
            .zip(&self.burst)
        {
            let _ = writeln!(
                out,
                "  {:>7.0} {:>8.2} {:>9.2} {:>9.2} {:>7.1}",
                a.range, a.value, m.value, s.value, b.damage
            );
        }
        for c in &self.components {
            for d in &c.destruction {
                let _ = writeln!(
                    out,
                    "  crit      {} {} x{}: {:.1}% destroyed",
                    c.location,
                    d.item,
                    d.multiplicity,
                    d.probability * 100.0
                );
            }
        }
        for w in &self.warnings {
            let _ = writeln!(out, "  warning   [{:?}] {}", w.severity, w.summary);
        }
        out
    }
}

pub fn write_json_report(report: &LoadoutReport, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())?;
    Ok(())
}
