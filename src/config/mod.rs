//! Configuration loading and validation.

use serde::Deserialize;
use std::path::Path;

/// Maximum size in bytes for a catalog, loadout or config file.
pub const MAX_INPUT_FILE_BYTES: usize = 8 * 1024 * 1024;

/// Default number of undoable edits kept per loadout.
pub const DEFAULT_UNDO_DEPTH: usize = 128;

/// Damage of one ammunition explosion hitting a component.
pub const DEFAULT_ALPHA_DAMAGE: f64 = 10.0;

/// Branches of the destruction tree less likely than this are dropped.
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.0005;

/// Probability of exactly 1, 2 and 3 critical hits on a shot. The rest is a miss.
pub const CRIT_CHANCE: [f64; 3] = [0.25, 0.14, 0.03];

/// Fraction of alpha damage that also goes into internal structure. Disabled by default.
pub const DEFAULT_INTERNAL_SPLASH_FRACTION: f64 = 0.0;

/// Hard cap on simulated shots regardless of component health.
pub const DEFAULT_MAX_SHOTS: u32 = 64;

/// Window for burst damage figures.
pub const DEFAULT_BURST_SECONDS: f64 = 10.0;

/// Longest burst window accepted from a config file.
pub const MAX_BURST_SECONDS: f64 = 600.0;

/// Distances at which the DPS series is sampled when no breakpoint falls in between.
pub const DEFAULT_REPORT_RANGES: [f64; 4] = [0.0, 270.0, 540.0, 810.0];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestructionConfig {
    #[serde(default = "default_alpha_damage")]
    pub alpha_damage: f64,
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,
    #[serde(default = "default_crit_chance")]
    pub crit_chance: Vec<f64>,
    #[serde(default = "default_internal_splash_fraction")]
    pub internal_splash_fraction: f64,
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,
}

fn default_alpha_damage() -> f64 {
    DEFAULT_ALPHA_DAMAGE
}

fn default_prune_threshold() -> f64 {
    DEFAULT_PRUNE_THRESHOLD
}

fn default_crit_chance() -> Vec<f64> {
    CRIT_CHANCE.to_vec()
}

fn default_internal_splash_fraction() -> f64 {
    DEFAULT_INTERNAL_SPLASH_FRACTION
}

fn default_max_shots() -> u32 {
    DEFAULT_MAX_SHOTS
}

impl Default for DestructionConfig {
    fn default() -> Self {
        Self {
            alpha_damage: DEFAULT_ALPHA_DAMAGE,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            crit_chance: CRIT_CHANCE.to_vec(),
            internal_splash_fraction: DEFAULT_INTERNAL_SPLASH_FRACTION,
            max_shots: DEFAULT_MAX_SHOTS,
        }
    }
}

impl DestructionConfig {
    /// Probability that a shot lands no critical hit at all.
    pub fn p_miss(&self) -> f64 {
        (1.0 - self.crit_chance.iter().sum::<f64>()).max(0.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.alpha_damage.is_nan() || self.alpha_damage <= 0.0 {
            return Err(format!("alpha_damage must be positive, got {}", self.alpha_damage));
        }
        if !(0.0..1.0).contains(&self.prune_threshold) {
            return Err(format!(
                "prune_threshold must be in [0, 1), got {}",
                self.prune_threshold
            ));
        }
        if self.crit_chance.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err("crit_chance entries must be probabilities".to_string());
        }
        if self.crit_chance.iter().sum::<f64>() > 1.0 + 1e-9 {
            return Err("crit_chance sums to more than 1".to_string());
        }
        if self.internal_splash_fraction < 0.0 {
            return Err("internal_splash_fraction cannot be negative".to_string());
        }
        if self.max_shots == 0 {
            return Err("max_shots must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
    /// Window in seconds for burst damage.
    #[serde(default = "default_burst_seconds")]
    pub burst_seconds: f64,
    /// Extra distances to report besides the weapons' own breakpoints.
    #[serde(default = "default_report_ranges")]
    pub ranges: Vec<f64>,
    #[serde(default)]
    pub destruction: DestructionConfig,
}

fn default_undo_depth() -> usize {
    DEFAULT_UNDO_DEPTH
}

fn default_burst_seconds() -> f64 {
    DEFAULT_BURST_SECONDS
}

fn default_report_ranges() -> Vec<f64> {
    DEFAULT_REPORT_RANGES.to_vec()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
            burst_seconds: DEFAULT_BURST_SECONDS,
            ranges: DEFAULT_REPORT_RANGES.to_vec(),
            destruction: DestructionConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: AnalysisConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        crate::util::check_file_size(path, MAX_INPUT_FILE_BYTES)?;
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.undo_depth == 0 {
            return Err("undo_depth must be at least 1".to_string());
        }
        if self.burst_seconds.is_nan() || !(0.0..=MAX_BURST_SECONDS).contains(&self.burst_seconds) {
            return Err(format!(
                "burst_seconds must be in [0, {}], got {}",
                MAX_BURST_SECONDS, self.burst_seconds
            ));
        }
        if self.ranges.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err("ranges must be finite and non-negative".to_string());
        }
        self.destruction.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(c, AnalysisConfig::default());
        assert!((c.destruction.p_miss() - 0.58).abs() < 1e-12);
    }

    #[test]
    fn partial_destruction_table() {
        let c = AnalysisConfig::from_toml_str(
            r#"
            burst_seconds = 5.0
            [destruction]
            alpha_damage = 15.0
            internal_splash_fraction = 0.15
            "#,
        )
        .unwrap();
        assert_eq!(c.burst_seconds, 5.0);
        assert_eq!(c.destruction.alpha_damage, 15.0);
        assert_eq!(c.destruction.prune_threshold, DEFAULT_PRUNE_THRESHOLD);
        assert_eq!(c.destruction.crit_chance, CRIT_CHANCE.to_vec());
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(AnalysisConfig::from_toml_str("undo_depth = 0").is_err());
        assert!(AnalysisConfig::from_toml_str("[destruction]\nalpha_damage = 0.0").is_err());
        assert!(AnalysisConfig::from_toml_str("[destruction]\ncrit_chance = [0.7, 0.7]").is_err());
        assert!(AnalysisConfig::from_toml_str("unknown = 1").is_err());
        assert!(AnalysisConfig::from_toml_str("burst_seconds = 1e5").is_err());
        assert!(AnalysisConfig::from_toml_str("burst_seconds = 600.0").is_ok());
    }
}
