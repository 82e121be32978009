//! Cross-thread command queue
//!
//! Producers are native completion callbacks on SDK-owned threads; the only consumer is the
//! dispatcher running on the host's main cycle. A push lands entirely before or entirely
//! after a drain, never inside the drained batch.

use parking_lot::Mutex;

use crate::deferred_teardown::TeardownToken;
use crate::slot_pool::SlotKey;
use crate::types::{AdEvent, AdResult};

/// What a command reports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Native initialize step finished successfully; the load step is still to be issued
    Initialized,
    Loaded,
    FailedToLoad,
    Shown,
    Hidden,
    AppLeave,
    Unloaded,
    /// A hide issued by teardown finished; parked native resources can go
    TeardownComplete,
}

impl CommandKind {
    /// The caller-visible event, if this kind is delivered to the callback
    pub fn event(&self) -> Option<AdEvent> {
        match self {
            Self::Loaded => Some(AdEvent::Loaded),
            Self::FailedToLoad => Some(AdEvent::FailedToLoad),
            Self::Shown => Some(AdEvent::Shown),
            Self::Hidden => Some(AdEvent::Hidden),
            Self::AppLeave => Some(AdEvent::AppLeave),
            Self::Unloaded => Some(AdEvent::Unloaded),
            Self::Initialized | Self::TeardownComplete => None,
        }
    }
}

/// Continuation run on the main thread after the callback fired
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostAction {
    /// Clear the target slot and hand it back to the pool
    ReleaseSlot,
    /// Drop the native resources parked under this token
    FinishTeardown(TeardownToken),
}

/// One queued event
#[derive(Debug)]
pub struct Command {
    pub target: SlotKey,
    pub kind: CommandKind,
    pub result: AdResult,
    pub message: Option<String>,
    pub post_action: Option<PostAction>,
}

impl Command {
    pub fn new(target: SlotKey, kind: CommandKind) -> Self {
        Self {
            target,
            kind,
            result: AdResult::None,
            message: None,
            post_action: None,
        }
    }

    pub fn with_result(mut self, result: AdResult, message: Option<String>) -> Self {
        self.result = result;
        self.message = message;
        self
    }

    pub fn with_post_action(mut self, action: PostAction) -> Self {
        self.post_action = Some(action);
        self
    }
}

/// Growable multi-producer / single-consumer FIFO
pub struct CommandQueue {
    commands: Mutex<Vec<Command>>,
    growth: usize,
}

impl CommandQueue {
    pub fn new(capacity: usize, growth: usize) -> Self {
        Self {
            commands: Mutex::new(Vec::with_capacity(capacity)),
            growth: growth.max(1),
        }
    }

    /// Enqueue from any thread. Never blocks on the consumer and never drops.
    pub fn push(&self, command: Command) {
        let mut commands = self.commands.lock();
        if commands.len() == commands.capacity() {
            commands.reserve_exact(self.growth);
            tracing::trace!(capacity = commands.capacity(), "command queue grown");
        }
        commands.push(command);
    }

    /// Take every queued command in push order
    pub fn drain_all(&self) -> Vec<Command> {
        let mut commands = self.commands.lock();
        let capacity = commands.capacity();
        std::mem::replace(&mut *commands, Vec::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.commands.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(index: usize) -> SlotKey {
        SlotKey::new(index, 0)
    }

    #[test]
    fn growth_is_lossless() {
        let queue = CommandQueue::new(8, 8);
        for i in 0..9 {
            queue.push(Command::new(key(i), CommandKind::Shown));
        }
        assert!(queue.capacity() >= 9);

        let drained = queue.drain_all();
        assert_eq!(drained.len(), 9);
        let order: Vec<usize> = drained.iter().map(|c| c.target.index()).collect();
        assert_eq!(order, (0..9).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_preserves_fifo_order() {
        let queue = CommandQueue::new(2, 1);
        queue.push(Command::new(key(0), CommandKind::Loaded));
        queue.push(Command::new(key(1), CommandKind::Shown));
        queue.push(Command::new(key(2), CommandKind::Hidden));

        let kinds: Vec<CommandKind> = queue.drain_all().into_iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CommandKind::Loaded, CommandKind::Shown, CommandKind::Hidden]);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let queue = Arc::new(CommandQueue::new(8, 8));
        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for seq in 0..250 {
                        queue.push(
                            Command::new(key(producer), CommandKind::Hidden)
                                .with_result(AdResult::None, Some(seq.to_string())),
                        );
                    }
                })
            })
            .collect();

        let mut drained = Vec::new();
        for handle in handles {
            handle.join().unwrap();
            drained.extend(queue.drain_all());
        }
        drained.extend(queue.drain_all());
        assert_eq!(drained.len(), 1000);

        for producer in 0..4 {
            let seqs: Vec<u32> = drained
                .iter()
                .filter(|c| c.target.index() == producer)
                .map(|c| c.message.as_deref().unwrap().parse().unwrap())
                .collect();
            assert_eq!(seqs, (0..250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn internal_kinds_are_not_events() {
        assert_eq!(CommandKind::Initialized.event(), None);
        assert_eq!(CommandKind::TeardownComplete.event(), None);
        assert_eq!(CommandKind::Unloaded.event(), Some(AdEvent::Unloaded));
    }

    #[test]
    fn builder_sets_result_and_post_action() {
        let cmd = Command::new(key(3), CommandKind::FailedToLoad)
            .with_result(AdResult::NoFill, Some("no fill".to_string()))
            .with_post_action(PostAction::ReleaseSlot);
        assert_eq!(cmd.result, AdResult::NoFill);
        assert_eq!(cmd.message.as_deref(), Some("no fill"));
        assert_eq!(cmd.post_action, Some(PostAction::ReleaseSlot));
    }
}
