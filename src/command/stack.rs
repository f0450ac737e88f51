//! Bounded undo/redo history that owns the edited object and its subscribers.

use super::{Command, CommandError, MessageBuffer, MessageReceiver, SubscriberId, Transactional};
use std::collections::VecDeque;

/// History of applied commands with a cursor splitting done from undone entries.
///
/// Entries `[0, cursor)` are undoable, `[cursor, len)` redoable. Every public
/// method leaves the target unchanged when it returns an error.
pub struct CommandStack<T: Transactional> {
    target: T,
    actions: VecDeque<Command<T>>,
    depth: usize,
    cursor: usize,
    receivers: Vec<(SubscriberId, Box<dyn MessageReceiver>)>,
    next_subscriber: u64,
}

impl<T: Transactional> CommandStack<T> {
    pub fn new(target: T, depth: usize) -> Self {
        Self {
            target,
            actions: VecDeque::new(),
            depth,
            cursor: 0,
            receivers: Vec::new(),
            next_subscriber: 0,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of history entries, done and undone.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Index of the most recent undoable command.
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.actions.len()
    }

    pub fn next_undo(&self) -> Option<String> {
        self.current_index()
            .and_then(|i| self.actions.get(i))
            .map(|c| c.to_string())
    }

    pub fn next_redo(&self) -> Option<String> {
        self.actions.get(self.cursor).map(|c| c.to_string())
    }

    pub fn attach(&mut self, receiver: Box<dyn MessageReceiver>) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.receivers.push((id, receiver));
        id
    }

    /// Returns false when `id` was not attached.
    pub fn detach(&mut self, id: SubscriberId) -> bool {
        let before = self.receivers.len();
        self.receivers.retain(|(rid, _)| *rid != id);
        self.receivers.len() != before
    }

    fn deliver(&mut self, mut buffer: MessageBuffer) {
        for message in buffer.drain() {
            for (_, receiver) in self.receivers.iter_mut() {
                receiver.receive(&message);
            }
        }
    }

    /// Re-applies undone entries until the cursor is back at `cursor`.
    fn restore(&mut self, cursor: usize) {
        let mut discard = MessageBuffer::new();
        while self.cursor < cursor {
            if let Err(err) = self.actions[self.cursor].apply(&mut self.target, &mut discard) {
                tracing::error!("cannot restore {}: {}", self.actions[self.cursor], err);
                return;
            }
            self.cursor += 1;
        }
    }

    /// Applies `cmd` and records it, first undoing any history entries it coalesces with.
    pub fn push_and_apply(&mut self, mut cmd: Command<T>) -> Result<(), CommandError> {
        let start = self.cursor;
        let mut buffer = MessageBuffer::new();

        while self.cursor > 0 && cmd.can_coalesce(&self.actions[self.cursor - 1]) {
            let prev = &mut self.actions[self.cursor - 1];
            if let Err(err) = prev.undo(&mut self.target, &mut buffer) {
                self.restore(start);
                return Err(err);
            }
            self.cursor -= 1;
        }

        if let Err(err) = cmd.apply(&mut self.target, &mut buffer) {
            tracing::warn!("{} failed: {}", cmd, err);
            self.restore(start);
            return Err(err);
        }

        let coalesced = start - self.cursor;
        tracing::debug!("applied {} (coalesced {})", cmd, coalesced);
        self.actions.truncate(self.cursor);
        self.actions.push_back(cmd);
        self.cursor += 1;
        while self.actions.len() > self.depth {
            self.actions.pop_front();
            self.cursor -= 1;
        }
        self.deliver(buffer);
        Ok(())
    }

    /// Undoes the most recent command. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        let Some(index) = self.current_index() else {
            return Ok(false);
        };
        let mut buffer = MessageBuffer::new();
        self.actions[index].undo(&mut self.target, &mut buffer)?;
        tracing::debug!("undid {}", self.actions[index]);
        self.cursor = index;
        self.deliver(buffer);
        Ok(true)
    }

    /// Re-applies the most recently undone command. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        if !self.can_redo() {
            return Ok(false);
        }
        let mut buffer = MessageBuffer::new();
        self.actions[self.cursor].apply(&mut self.target, &mut buffer)?;
        tracing::debug!("redid {}", self.actions[self.cursor]);
        self.cursor += 1;
        self.deliver(buffer);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Counter, CounterOp, CounterRecipe};
    use super::*;
    use crate::command::Message;
    use proptest::prelude::*;
    use std::sync::mpsc;

    fn add(n: i64) -> Command<Counter> {
        Command::op(CounterOp::Add(n))
    }

    fn slide(to: i64) -> Command<Counter> {
        Command::op(CounterOp::Slide { to, previous: None })
    }

    #[test]
    fn undo_redo_walk_the_cursor() {
        let mut stack = CommandStack::new(Counter::default(), 10);
        assert!(!stack.undo().unwrap());
        stack.push_and_apply(add(1)).unwrap();
        stack.push_and_apply(add(2)).unwrap();
        assert_eq!(stack.target().value, 3);
        assert_eq!(stack.current_index(), Some(1));

        assert!(stack.undo().unwrap());
        assert_eq!(stack.target().value, 1);
        assert!(stack.can_redo());
        assert!(stack.redo().unwrap());
        assert_eq!(stack.target().value, 3);
        assert!(!stack.redo().unwrap());
    }

    #[test]
    fn push_discards_redo_tail() {
        let mut stack = CommandStack::new(Counter::default(), 10);
        stack.push_and_apply(add(1)).unwrap();
        stack.push_and_apply(add(2)).unwrap();
        stack.undo().unwrap();
        stack.push_and_apply(add(5)).unwrap();
        assert_eq!(stack.len(), 2);
        assert!(!stack.can_redo());
        assert_eq!(stack.target().value, 6);
    }

    #[test]
    fn oldest_entry_evicted_past_depth() {
        let mut stack = CommandStack::new(Counter::default(), 2);
        for n in 1..=3 {
            stack.push_and_apply(add(n)).unwrap();
        }
        assert_eq!(stack.len(), 2);
        assert!(stack.undo().unwrap());
        assert!(stack.undo().unwrap());
        assert!(!stack.undo().unwrap());
        assert_eq!(stack.target().value, 1);
    }

    #[test]
    fn failed_push_leaves_state_untouched() {
        let mut stack = CommandStack::new(Counter::default(), 10);
        stack.push_and_apply(add(1)).unwrap();
        stack.undo().unwrap();
        stack.push_and_apply(add(2)).unwrap();
        let before = stack.target().clone();
        let len = stack.len();

        let failing = Command::composite(CounterRecipe(vec![CounterOp::Add(7), CounterOp::Fail]));
        assert!(stack.push_and_apply(failing).is_err());
        assert_eq!(stack.target(), &before);
        assert_eq!(stack.len(), len);
        assert_eq!(stack.current_index(), Some(0));
    }

    #[test]
    fn coalescing_keeps_one_entry() {
        let mut stack = CommandStack::new(Counter::default(), 10);
        stack.push_and_apply(add(1)).unwrap();
        stack.push_and_apply(slide(5)).unwrap();
        stack.push_and_apply(slide(8)).unwrap();
        stack.push_and_apply(slide(9)).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.target().value, 9);
        stack.undo().unwrap();
        assert_eq!(stack.target().value, 1);
    }

    #[test]
    fn failed_coalescing_push_restores_previous_entry() {
        let mut stack = CommandStack::new(Counter::default(), 10);
        stack.push_and_apply(slide(5)).unwrap();

        // Coalesces with the slide, then fails: the slide must come back.
        let failing = Command::op(CounterOp::BrokenSlide);
        assert!(stack.push_and_apply(failing).is_err());
        assert_eq!(stack.target().value, 5);
        assert_eq!(stack.len(), 1);
        assert!(stack.undo().unwrap());
        assert_eq!(stack.target().value, 0);
    }

    #[test]
    fn subscribers_see_only_committed_messages() {
        let mut stack = CommandStack::new(Counter::default(), 10);
        let (tx, rx) = mpsc::channel::<Message>();
        let id = stack.attach(Box::new(tx));

        stack.push_and_apply(add(1)).unwrap();
        assert_eq!(rx.try_iter().count(), 1);

        let failing = Command::composite(CounterRecipe(vec![CounterOp::Add(1), CounterOp::Fail]));
        assert!(stack.push_and_apply(failing).is_err());
        assert_eq!(rx.try_iter().count(), 0);

        stack.undo().unwrap();
        assert_eq!(rx.try_iter().count(), 1);

        assert!(stack.detach(id));
        assert!(!stack.detach(id));
        stack.redo().unwrap();
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Push(i64),
        Undo,
        Redo,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (-20i64..20).prop_map(Step::Push),
            Just(Step::Undo),
            Just(Step::Redo),
        ]
    }

    proptest! {
        #[test]
        fn cursor_matches_a_done_undone_model(steps in prop::collection::vec(step(), 0..60)) {
            let mut stack = CommandStack::new(Counter::default(), 1000);
            let mut done: Vec<i64> = Vec::new();
            let mut undone: Vec<i64> = Vec::new();
            for s in steps {
                match s {
                    Step::Push(n) => {
                        stack.push_and_apply(add(n)).unwrap();
                        done.push(n);
                        undone.clear();
                    }
                    Step::Undo => {
                        let moved = stack.undo().unwrap();
                        prop_assert_eq!(moved, !done.is_empty());
                        if let Some(n) = done.pop() {
                            undone.push(n);
                        }
                    }
                    Step::Redo => {
                        let moved = stack.redo().unwrap();
                        prop_assert_eq!(moved, !undone.is_empty());
                        if let Some(n) = undone.pop() {
                            done.push(n);
                        }
                    }
                }
                prop_assert_eq!(stack.target().value, done.iter().sum::<i64>());
                prop_assert_eq!(stack.len(), done.len() + undone.len());
            }
        }
    }
}
