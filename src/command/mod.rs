//! Transactional editing: every mutation of a [`Loadout`](crate::loadout::Loadout)
//! or [`Garage`](crate::loadout::Garage) is a reversible command.
//!
//! A command is either a leaf operation applied directly to its target, or a
//! composite whose children are built lazily from a recipe on first apply.
//! Composites are all-or-nothing: a failing child rolls back the children
//! applied before it, and messages are only released once the whole composite
//! has gone through.

mod garage_ops;
mod loadout_ops;
mod message;
mod stack;

pub use garage_ops::{GarageOp, GarageRecipe};
pub use loadout_ops::{LoadoutOp, LoadoutRecipe};
pub use message::{Message, MessageBuffer, MessageReceiver, SubscriberId};
pub use stack::CommandStack;

use crate::loadout::{GarageError, LoadoutError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Loadout(#[from] LoadoutError),
    #[error(transparent)]
    Garage(#[from] GarageError),
    #[error("cannot undo {0}: it was never applied")]
    NotApplied(String),
    #[error("{0}")]
    Rejected(String),
}

/// A type that can be edited through commands.
///
/// `Op` is the closed set of leaf mutations, `Recipe` the closed set of
/// composite edits that expand into leaf mutations against the current state.
pub trait Transactional: Sized {
    type Op: fmt::Debug + fmt::Display;
    type Recipe: fmt::Debug + fmt::Display;

    fn apply_op(&mut self, op: &mut Self::Op, out: &mut MessageBuffer) -> Result<(), CommandError>;

    /// Reverts an op previously applied with [`Transactional::apply_op`].
    fn undo_op(&mut self, op: &mut Self::Op, out: &mut MessageBuffer) -> Result<(), CommandError>;

    /// Expands a recipe into child commands, in application order.
    fn build(&self, recipe: &Self::Recipe) -> Result<Vec<Command<Self>>, CommandError>;

    /// Whether `op` may replace `previous` in the history.
    fn op_coalesces(_op: &Self::Op, _previous: &Self::Op) -> bool {
        false
    }

    fn recipe_coalesces(_recipe: &Self::Recipe, _previous: &Self::Recipe) -> bool {
        false
    }
}

pub enum Command<T: Transactional> {
    Apply(T::Op),
    Composite(CompositeCommand<T>),
}

impl<T: Transactional> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Apply(op) => f.debug_tuple("Apply").field(op).finish(),
            Command::Composite(c) => f.debug_tuple("Composite").field(c).finish(),
        }
    }
}

impl<T: Transactional> fmt::Display for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Apply(op) => op.fmt(f),
            Command::Composite(c) => c.recipe.fmt(f),
        }
    }
}

impl<T: Transactional> Command<T> {
    pub fn op(op: T::Op) -> Self {
        Command::Apply(op)
    }

    pub fn composite(recipe: T::Recipe) -> Self {
        Command::Composite(CompositeCommand::new(recipe))
    }

    pub fn apply(&mut self, target: &mut T, out: &mut MessageBuffer) -> Result<(), CommandError> {
        match self {
            Command::Apply(op) => target.apply_op(op, out),
            Command::Composite(c) => c.apply(target, out),
        }
    }

    pub fn undo(&mut self, target: &mut T, out: &mut MessageBuffer) -> Result<(), CommandError> {
        match self {
            Command::Apply(op) => target.undo_op(op, out),
            Command::Composite(c) => c.undo(target, out),
        }
    }

    /// Whether this command may replace `previous` in the history. Never true for itself.
    pub fn can_coalesce(&self, previous: &Command<T>) -> bool {
        if std::ptr::eq(self, previous) {
            return false;
        }
        match (self, previous) {
            (Command::Apply(a), Command::Apply(b)) => T::op_coalesces(a, b),
            (Command::Composite(a), Command::Composite(b)) => {
                T::recipe_coalesces(&a.recipe, &b.recipe)
            }
            _ => false,
        }
    }
}

pub struct CompositeCommand<T: Transactional> {
    recipe: T::Recipe,
    children: Option<Vec<Command<T>>>,
}

impl<T: Transactional> fmt::Debug for CompositeCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeCommand")
            .field("recipe", &self.recipe)
            .field("children", &self.children)
            .finish()
    }
}

impl<T: Transactional> CompositeCommand<T> {
    pub fn new(recipe: T::Recipe) -> Self {
        Self {
            recipe,
            children: None,
        }
    }

    pub fn recipe(&self) -> &T::Recipe {
        &self.recipe
    }

    /// Child commands, once the composite has been applied.
    pub fn children(&self) -> Option<&[Command<T>]> {
        self.children.as_deref()
    }

    fn apply(&mut self, target: &mut T, out: &mut MessageBuffer) -> Result<(), CommandError> {
        if self.children.is_none() {
            let built = target.build(&self.recipe)?;
            tracing::trace!(recipe = %self.recipe, children = built.len(), "composite built");
            self.children = Some(built);
        }
        let children = self.children.get_or_insert_with(Vec::new);

        let mut buffer = MessageBuffer::new();
        for i in 0..children.len() {
            if let Err(err) = children[i].apply(target, &mut buffer) {
                tracing::warn!(
                    recipe = %self.recipe,
                    failed_child = i,
                    %err,
                    "composite apply failed, rolling back"
                );
                let mut discard = MessageBuffer::new();
                for child in children[..i].iter_mut().rev() {
                    if let Err(undo_err) = child.undo(target, &mut discard) {
                        tracing::error!(%undo_err, "rollback of composite child failed");
                    }
                }
                return Err(err);
            }
        }
        out.append(&mut buffer);
        Ok(())
    }

    fn undo(&mut self, target: &mut T, out: &mut MessageBuffer) -> Result<(), CommandError> {
        let Some(children) = self.children.as_mut() else {
            return Err(CommandError::NotApplied(self.recipe.to_string()));
        };

        let mut buffer = MessageBuffer::new();
        for i in (0..children.len()).rev() {
            if let Err(err) = children[i].undo(target, &mut buffer) {
                tracing::warn!(recipe = %self.recipe, failed_child = i, %err, "composite undo failed, reapplying");
                let mut discard = MessageBuffer::new();
                for child in children[i + 1..].iter_mut() {
                    if let Err(redo_err) = child.apply(target, &mut discard) {
                        tracing::error!(%redo_err, "reapply of composite child failed");
                    }
                }
                return Err(err);
            }
        }
        out.append(&mut buffer);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A tiny transactional target for exercising the command machinery on its own.

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Counter {
        pub value: i64,
        pub log: Vec<i64>,
    }

    #[derive(Debug, Clone)]
    pub enum CounterOp {
        Add(i64),
        /// Coalesces with an earlier `Slide`.
        Slide { to: i64, previous: Option<i64> },
        Fail,
        /// Coalesces like `Slide`, then fails.
        BrokenSlide,
    }

    impl fmt::Display for CounterOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    #[derive(Debug, Clone)]
    pub struct CounterRecipe(pub Vec<CounterOp>);

    impl fmt::Display for CounterRecipe {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} counter ops", self.0.len())
        }
    }

    impl Transactional for Counter {
        type Op = CounterOp;
        type Recipe = CounterRecipe;

        fn apply_op(&mut self, op: &mut CounterOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
            match op {
                CounterOp::Add(n) => self.value += *n,
                CounterOp::Slide { to, previous } => {
                    *previous = Some(self.value);
                    self.value = *to;
                }
                CounterOp::Fail | CounterOp::BrokenSlide => {
                    return Err(CommandError::Rejected("fail".into()))
                }
            }
            self.log.push(self.value);
            out.post(Message::ModifiersChanged);
            Ok(())
        }

        fn undo_op(&mut self, op: &mut CounterOp, out: &mut MessageBuffer) -> Result<(), CommandError> {
            match op {
                CounterOp::Add(n) => self.value -= *n,
                CounterOp::Slide { previous, .. } => {
                    self.value = previous
                        .take()
                        .ok_or_else(|| CommandError::NotApplied("slide".into()))?;
                }
                CounterOp::Fail | CounterOp::BrokenSlide => {
                    return Err(CommandError::Rejected("fail".into()))
                }
            }
            self.log.pop();
            out.post(Message::ModifiersChanged);
            Ok(())
        }

        fn build(&self, recipe: &CounterRecipe) -> Result<Vec<Command<Self>>, CommandError> {
            Ok(recipe.0.iter().cloned().map(Command::op).collect())
        }

        fn op_coalesces(op: &CounterOp, previous: &CounterOp) -> bool {
            matches!(
                (op, previous),
                (
                    CounterOp::Slide { .. } | CounterOp::BrokenSlide,
                    CounterOp::Slide { .. }
                )
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Counter, CounterOp, CounterRecipe};
    use super::*;

    #[test]
    fn composite_rolls_back_when_third_of_five_fails() {
        let mut counter = Counter::default();
        let before = counter.clone();
        let mut cmd = Command::composite(CounterRecipe(vec![
            CounterOp::Add(1),
            CounterOp::Add(2),
            CounterOp::Fail,
            CounterOp::Add(4),
            CounterOp::Add(5),
        ]));
        let mut out = MessageBuffer::new();
        assert!(cmd.apply(&mut counter, &mut out).is_err());
        assert_eq!(counter, before);
        assert!(!out.has_messages());
    }

    #[test]
    fn composite_flushes_messages_only_on_success() {
        let mut counter = Counter::default();
        let mut cmd = Command::composite(CounterRecipe(vec![CounterOp::Add(1), CounterOp::Add(2)]));
        let mut out = MessageBuffer::new();
        cmd.apply(&mut counter, &mut out).unwrap();
        assert_eq!(counter.value, 3);
        assert_eq!(out.len(), 2);
        cmd.undo(&mut counter, &mut out).unwrap();
        assert_eq!(counter.value, 0);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn composite_undo_before_apply_is_an_error() {
        let mut counter = Counter::default();
        let mut cmd = Command::composite(CounterRecipe(vec![CounterOp::Add(1)]));
        let mut out = MessageBuffer::new();
        assert!(matches!(
            cmd.undo(&mut counter, &mut out),
            Err(CommandError::NotApplied(_))
        ));
    }

    #[test]
    fn command_never_coalesces_with_itself() {
        let slide = Command::<Counter>::op(CounterOp::Slide {
            to: 1,
            previous: None,
        });
        assert!(!slide.can_coalesce(&slide));
        let other = Command::<Counter>::op(CounterOp::Slide {
            to: 2,
            previous: None,
        });
        assert!(other.can_coalesce(&slide));
        assert!(!Command::<Counter>::op(CounterOp::Add(1)).can_coalesce(&slide));
    }
}
