//! Probability that items in a component are destroyed by critical hits before
//! the component itself falls.
//!
//! The component is hit by `N` alpha strikes, `N` being how many it takes to
//! chew through its structure. Each strike misses the internals or lands 1..k
//! critical hits according to the crit chance table. A critical hit picks an
//! item weighted by the slots it occupies and damages it; an item whose health
//! runs out is destroyed and leaves the pool. The result is a weighted
//! branching tree. Branches less likely than the prune threshold are dropped,
//! so results are a slight under-estimate, not exact values.

use crate::attribute::Modifier;
use crate::catalog::Item;
use crate::config::DestructionConfig;
use crate::loadout::ConfiguredComponent;
use serde::Serialize;
use std::sync::Arc;

/// Chance that a given copy of an item is destroyed.
#[derive(Debug, Clone, Serialize)]
pub struct ItemDestruction {
    pub item: String,
    pub multiplicity: u32,
    pub probability: f64,
}

/// Copies of one distinct item sharing the same remaining health.
#[derive(Debug, Clone, PartialEq)]
struct Instances {
    item: usize,
    health: f64,
    count: u32,
}

#[derive(Debug, Clone)]
pub struct ComponentDestructionSimulator {
    config: DestructionConfig,
}

struct Walk<'a> {
    config: &'a DestructionConfig,
    slots: Vec<u32>,
    p_miss: f64,
    destroyed: Vec<f64>,
    branches: u64,
}

impl Walk<'_> {
    fn shoot(&mut self, state: &[Instances], probability: f64, shots_left: u32) {
        if shots_left == 0 || state.is_empty() || probability < self.config.prune_threshold {
            return;
        }
        self.branches += 1;
        if self.p_miss > 0.0 {
            self.shoot(state, probability * self.p_miss, shots_left - 1);
        }
        for (i, chance) in self.config.crit_chance.iter().enumerate() {
            if *chance > 0.0 {
                self.crit(state.to_vec(), probability * chance, i as u32 + 1, shots_left);
            }
        }
    }

    fn crit(&mut self, state: Vec<Instances>, probability: f64, rolls_left: u32, shots_left: u32) {
        if probability < self.config.prune_threshold {
            return;
        }
        let total: u32 = state.iter().map(|s| self.slots[s.item] * s.count).sum();
        if rolls_left == 0 || total == 0 {
            self.shoot(&state, probability, shots_left - 1);
            return;
        }
        self.branches += 1;
        for target in 0..state.len() {
            let weight = self.slots[state[target].item] * state[target].count;
            if weight == 0 {
                continue;
            }
            let p = probability * weight as f64 / total as f64;
            if p < self.config.prune_threshold {
                continue;
            }
            let mut next = state.clone();
            let item = next[target].item;
            let health = next[target].health - self.config.alpha_damage;
            next[target].count -= 1;
            if next[target].count == 0 {
                next.remove(target);
            }
            if health <= 0.0 {
                self.destroyed[item] += p;
            } else {
                match next.iter_mut().find(|s| s.item == item && s.health == health) {
                    Some(s) => s.count += 1,
                    None => next.push(Instances {
                        item,
                        health,
                        count: 1,
                    }),
                }
            }
            self.crit(next, p, rolls_left - 1, shots_left);
        }
    }
}

impl ComponentDestructionSimulator {
    pub fn new(config: DestructionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DestructionConfig {
        &self.config
    }

    /// Strikes needed to destroy `hit_points` of structure, capped by `max_shots`
    /// (so zero when `max_shots` is zero).
    pub fn shots_for(&self, hit_points: f64) -> u32 {
        if hit_points <= 0.0 {
            return 0;
        }
        let per_shot = self.config.alpha_damage * (1.0 + self.config.internal_splash_fraction);
        let shots = (hit_points / per_shot).ceil();
        (shots as u32).max(1).min(self.config.max_shots)
    }

    /// Simulates a component as currently configured. Heat sinks inside the
    /// engine and non-crittable items are never hit.
    pub fn simulate(
        &self,
        component: &ConfiguredComponent,
        modifiers: &[Modifier],
    ) -> Vec<ItemDestruction> {
        let hit_points = component.internal().hit_points.value(modifiers);
        self.simulate_items(&component.items_in_slots(), hit_points)
    }

    pub fn simulate_items(&self, items: &[Arc<Item>], hit_points: f64) -> Vec<ItemDestruction> {
        let mut distinct: Vec<Arc<Item>> = Vec::new();
        let mut state: Vec<Instances> = Vec::new();
        for item in items.iter().filter(|i| i.crittable) {
            match distinct.iter().position(|d| d.id == item.id) {
                Some(idx) => state[idx].count += 1,
                None => {
                    state.push(Instances {
                        item: distinct.len(),
                        health: item.health,
                        count: 1,
                    });
                    distinct.push(Arc::clone(item));
                }
            }
        }
        let multiplicity: Vec<u32> = state.iter().map(|s| s.count).collect();

        let shots = self.shots_for(hit_points);
        let mut walk = Walk {
            config: &self.config,
            slots: distinct.iter().map(|d| d.slots).collect(),
            p_miss: self.config.p_miss(),
            destroyed: vec![0.0; distinct.len()],
            branches: 0,
        };
        walk.shoot(&state, 1.0, shots);
        tracing::debug!(
            "destruction walk: {} item(s), {} shot(s), {} branch(es)",
            distinct.len(),
            shots,
            walk.branches
        );

        distinct
            .iter()
            .zip(multiplicity)
            .zip(walk.destroyed)
            .map(|((item, multiplicity), destroyed)| ItemDestruction {
                item: item.name.clone(),
                multiplicity,
                probability: (destroyed / multiplicity as f64).min(1.0),
            })
            .collect()
    }
}

impl Default for ComponentDestructionSimulator {
    fn default() -> Self {
        Self::new(DestructionConfig::default())
    }
}
