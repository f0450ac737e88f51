//! A named collection of loadouts.

use super::Loadout;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GarageError {
    #[error("a loadout named {0:?} already exists")]
    DuplicateName(String),
    #[error("no loadout named {0:?}")]
    NotFound(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Garage {
    loadouts: Vec<Loadout>,
}

impl Garage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loadouts(&self) -> &[Loadout] {
        &self.loadouts
    }

    pub fn len(&self) -> usize {
        self.loadouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loadouts.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Loadout> {
        self.loadouts.iter().find(|l| l.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub(crate) fn insert(&mut self, index: usize, loadout: Loadout) -> Result<(), GarageError> {
        if self.contains(loadout.name()) {
            return Err(GarageError::DuplicateName(loadout.name().to_string()));
        }
        let index = index.min(self.loadouts.len());
        self.loadouts.insert(index, loadout);
        Ok(())
    }

    pub(crate) fn remove(&mut self, name: &str) -> Result<(usize, Loadout), GarageError> {
        let idx = self
            .loadouts
            .iter()
            .position(|l| l.name() == name)
            .ok_or_else(|| GarageError::NotFound(name.to_string()))?;
        Ok((idx, self.loadouts.remove(idx)))
    }

    pub(crate) fn rename(&mut self, from: &str, to: &str) -> Result<(), GarageError> {
        if from != to && self.contains(to) {
            return Err(GarageError::DuplicateName(to.to_string()));
        }
        let loadout = self
            .loadouts
            .iter_mut()
            .find(|l| l.name() == from)
            .ok_or_else(|| GarageError::NotFound(from.to_string()))?;
        loadout.set_name(to.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_catalog;

    #[test]
    fn names_are_unique() {
        let c = test_catalog();
        let mut g = Garage::new();
        g.insert(0, Loadout::from_catalog(&c, "HBK-4P", "A").unwrap())
            .unwrap();
        let dup = Loadout::from_catalog(&c, "TBR-PRIME", "A").unwrap();
        assert_eq!(g.insert(1, dup), Err(GarageError::DuplicateName("A".into())));
        g.insert(1, Loadout::from_catalog(&c, "TBR-PRIME", "B").unwrap())
            .unwrap();
        assert_eq!(g.rename("A", "B"), Err(GarageError::DuplicateName("B".into())));
        g.rename("A", "C").unwrap();
        assert!(g.contains("C"));
        let (idx, removed) = g.remove("C").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(removed.chassis().name, "HBK-4P");
        assert_eq!(g.remove("C").unwrap_err(), GarageError::NotFound("C".into()));
    }
}
