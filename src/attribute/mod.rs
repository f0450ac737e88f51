//! Attributes and modifiers: numeric stats adjusted by tag-selected quirks and pilot skills.

use serde::{Deserialize, Serialize};

/// How a modifier combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Added to the base value.
    Additive,
    /// Summed with the other multiplicative modifiers, then applied as `1 + sum`.
    Multiplicative,
}

/// What a modifier affects: any attribute sharing a selector and the same specifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierDescription {
    pub name: String,
    pub selectors: Vec<String>,
    #[serde(default)]
    pub specifier: Option<String>,
    pub operation: Operation,
}

impl ModifierDescription {
    pub fn affects(&self, attribute: &Attribute) -> bool {
        if self.specifier != attribute.specifier {
            return false;
        }
        self.selectors
            .iter()
            .any(|s| attribute.selectors.iter().any(|a| a.eq_ignore_ascii_case(s)))
    }
}

/// A concrete modifier (quirk, pilot skill, module) with its magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    #[serde(flatten)]
    pub description: ModifierDescription,
    pub value: f64,
}

impl Modifier {
    pub fn new(
        name: &str,
        selectors: &[&str],
        specifier: Option<&str>,
        operation: Operation,
        value: f64,
    ) -> Self {
        Self {
            description: ModifierDescription {
                name: name.to_string(),
                selectors: selectors.iter().map(|s| s.to_string()).collect(),
                specifier: specifier.map(str::to_string),
                operation,
            },
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }
}

/// A base value plus the tags modifiers select it by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    base: f64,
    selectors: Vec<String>,
    specifier: Option<String>,
}

impl Attribute {
    pub fn new(base: f64, selectors: Vec<String>, specifier: Option<&str>) -> Self {
        Self {
            base,
            selectors,
            specifier: specifier.map(str::to_string),
        }
    }

    /// An attribute no modifier can select.
    pub fn fixed(base: f64) -> Self {
        Self {
            base,
            selectors: Vec::new(),
            specifier: None,
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn specifier(&self) -> Option<&str> {
        self.specifier.as_deref()
    }

    /// Value after all matching modifiers: `(base + Σadd) × (1 + Σmul)`.
    pub fn value<'a, I>(&self, modifiers: I) -> f64
    where
        I: IntoIterator<Item = &'a Modifier>,
    {
        let mut additive = self.base;
        let mut multiplicative = 1.0;
        for m in modifiers {
            if !m.description.affects(self) {
                continue;
            }
            match m.description.operation {
                Operation::Additive => additive += m.value,
                Operation::Multiplicative => multiplicative += m.value,
            }
        }
        additive * multiplicative
    }
}
