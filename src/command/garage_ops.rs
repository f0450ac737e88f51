//! Operations on the garage: adding, removing and renaming whole loadouts.

use super::{Command, CommandError, Message, MessageBuffer, Transactional};
use crate::loadout::{Garage, Loadout};
use std::fmt;

#[derive(Debug, Clone)]
pub enum GarageOp {
    AddLoadout(Box<Loadout>),
    RemoveLoadout {
        name: String,
        removed: Option<(usize, Box<Loadout>)>,
    },
    RenameLoadout {
        from: String,
        to: String,
    },
}

impl GarageOp {
    pub fn add(loadout: Loadout) -> Self {
        GarageOp::AddLoadout(Box::new(loadout))
    }

    pub fn remove(name: impl Into<String>) -> Self {
        GarageOp::RemoveLoadout {
            name: name.into(),
            removed: None,
        }
    }

    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        GarageOp::RenameLoadout {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for GarageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GarageOp::AddLoadout(l) => write!(f, "add loadout {}", l.name()),
            GarageOp::RemoveLoadout { name, .. } => write!(f, "remove loadout {}", name),
            GarageOp::RenameLoadout { from, to } => write!(f, "rename loadout {} to {}", from, to),
        }
    }
}

#[derive(Debug, Clone)]
pub enum GarageRecipe {
    /// Adds several loadouts; if any name clashes none are added.
    Import(Vec<Loadout>),
}

impl fmt::Display for GarageRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GarageRecipe::Import(loadouts) => write!(f, "import {} loadout(s)", loadouts.len()),
        }
    }
}

impl Transactional for Garage {
    type Op = GarageOp;
    type Recipe = GarageRecipe;

    fn apply_op(&mut self, op: &mut GarageOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
        match op {
            GarageOp::AddLoadout(loadout) => {
                self.insert(self.len(), (**loadout).clone())?;
                out.post(Message::LoadoutAdded {
                    name: loadout.name().to_string(),
                });
            }
            GarageOp::RemoveLoadout { name, removed } => {
                let (index, loadout) = self.remove(name)?;
                *removed = Some((index, Box::new(loadout)));
                out.post(Message::LoadoutRemoved { name: name.clone() });
            }
            GarageOp::RenameLoadout { from, to } => {
                self.rename(from, to)?;
                out.post(Message::LoadoutRenamed { name: to.clone() });
            }
        }
        Ok(())
    }

    fn undo_op(&mut self, op: &mut GarageOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
        match op {
            GarageOp::AddLoadout(loadout) => {
                self.remove(loadout.name())?;
                out.post(Message::LoadoutRemoved {
                    name: loadout.name().to_string(),
                });
            }
            GarageOp::RemoveLoadout { name, removed } => {
                let (index, loadout) = removed
                    .take()
                    .ok_or_else(|| CommandError::NotApplied(format!("remove loadout {}", name)))?;
                self.insert(index, *loadout)?;
                out.post(Message::LoadoutAdded { name: name.clone() });
            }
            GarageOp::RenameLoadout { from, to } => {
                self.rename(to, from)?;
                out.post(Message::LoadoutRenamed { name: from.clone() });
            }
        }
        Ok(())
    }

    fn build(&self, recipe: &GarageRecipe) -> Result<Vec<Command<Self>>, CommandError> {
        match recipe {
            GarageRecipe::Import(loadouts) => Ok(loadouts
                .iter()
                .cloned()
                .map(|l| Command::op(GarageOp::add(l)))
                .collect()),
        }
    }
}
