//! Change notifications posted by commands.

use crate::catalog::{ArmorSide, Location};
use std::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ItemAdded { location: Location, item: String },
    ItemRemoved { location: Location, item: String },
    ItemToggled { location: Location, item: String, on: bool },
    ArmorChanged { location: Location, side: ArmorSide, manual: bool },
    UpgradeChanged { upgrade: String },
    ModifiersChanged,
    LoadoutRenamed { name: String },
    LoadoutAdded { name: String },
    LoadoutRemoved { name: String },
}

/// Messages collected during a transaction, delivered only once it commits.
#[derive(Debug, Default)]
pub struct MessageBuffer {
    pending: Vec<Message>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, message: Message) {
        self.pending.push(message);
    }

    pub fn has_messages(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.pending
    }

    /// Moves all of `other`'s messages to the end of this buffer.
    pub fn append(&mut self, other: &mut MessageBuffer) {
        self.pending.append(&mut other.pending);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Message> {
        self.pending.drain(..)
    }
}

/// A delivery target for committed messages.
pub trait MessageReceiver {
    fn receive(&mut self, message: &Message);
}

impl MessageReceiver for mpsc::Sender<Message> {
    fn receive(&mut self, message: &Message) {
        if self.send(message.clone()).is_err() {
            tracing::debug!("message receiver disconnected");
        }
    }
}

/// Handle returned by [`CommandStack::attach`](super::CommandStack::attach), needed to detach again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(crate) u64);
