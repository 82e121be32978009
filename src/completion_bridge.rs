//! Async completion bridge
//!
//! Adapters handed to the native SDK. They run on whatever thread the SDK picks and do
//! exactly one thing: turn the native outcome into a [`Command`] and push it. They never
//! read or write slot state and never call into the scripting host.

use std::sync::{Arc, Weak};

use crate::command_queue::{Command, CommandKind, CommandQueue, PostAction};
use crate::deferred_teardown::TeardownToken;
use crate::native::{Completion, NativeResult, PresentationListener};
use crate::slot_pool::SlotKey;
use crate::types::PresentationState;

/// Producer side of the command queue.
///
/// Holds a weak reference so completions arriving after context teardown are dropped
/// instead of keeping the queue alive.
#[derive(Clone)]
pub struct CommandSender {
    queue: Weak<CommandQueue>,
}

impl CommandSender {
    pub fn new(queue: &Arc<CommandQueue>) -> Self {
        Self {
            queue: Arc::downgrade(queue),
        }
    }

    /// Push `command`; returns false when the context is already gone
    pub fn send(&self, command: Command) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                queue.push(command);
                true
            }
            None => {
                tracing::debug!(
                    slot = command.target.index(),
                    kind = ?command.kind,
                    "ads context gone, dropping completion"
                );
                false
            }
        }
    }
}

/// Completion for the native initialize step
pub fn initialize_completion(sender: CommandSender, target: SlotKey) -> Completion {
    Box::new(move |result: NativeResult| {
        let command = if result.is_success() {
            Command::new(target, CommandKind::Initialized)
        } else {
            failed_to_load(target, result)
        };
        sender.send(command);
    })
}

/// Completion for the native load step
pub fn load_completion(sender: CommandSender, target: SlotKey) -> Completion {
    Box::new(move |result: NativeResult| {
        let command = if result.is_success() {
            Command::new(target, CommandKind::Loaded)
        } else {
            failed_to_load(target, result)
        };
        sender.send(command);
    })
}

/// Completion for a hide issued by teardown. The token is the only context it carries.
pub fn hide_completion(sender: CommandSender, token: TeardownToken) -> Completion {
    Box::new(move |result: NativeResult| {
        if !result.is_success() {
            tracing::debug!(token = token.id(), result = ?result.code, "teardown hide reported an error");
        }
        sender.send(
            Command::new(token.slot(), CommandKind::TeardownComplete)
                .with_post_action(PostAction::FinishTeardown(token)),
        );
    })
}

/// Completion whose outcome is reported elsewhere (presentation listener)
pub fn discard_completion() -> Completion {
    Box::new(|_result: NativeResult| {})
}

fn failed_to_load(target: SlotKey, result: NativeResult) -> Command {
    Command::new(target, CommandKind::FailedToLoad)
        .with_result(result.code, result.message)
        .with_post_action(PostAction::ReleaseSlot)
}

// ============================================================================
// Presentation listeners
// ============================================================================

/// Banner presentation adapter
pub struct BannerListener {
    target: SlotKey,
    sender: CommandSender,
}

impl BannerListener {
    pub fn new(target: SlotKey, sender: CommandSender) -> Self {
        Self { target, sender }
    }
}

impl PresentationListener for BannerListener {
    fn on_presentation_state_changed(&self, state: PresentationState) {
        tracing::trace!(slot = self.target.index(), ?state, "banner presentation changed");
        let kind = match state {
            // clicked; duplicates are filtered by the covering-UI guard at dispatch
            PresentationState::CoveringUi => CommandKind::AppLeave,
            PresentationState::Hidden => CommandKind::Hidden,
            PresentationState::VisibleWithAd => CommandKind::Shown,
            PresentationState::VisibleWithoutAd | PresentationState::OpenedPartialOverlay => return,
        };
        self.sender.send(Command::new(self.target, kind));
    }
}

/// Interstitial presentation adapter
pub struct InterstitialListener {
    target: SlotKey,
    sender: CommandSender,
}

impl InterstitialListener {
    pub fn new(target: SlotKey, sender: CommandSender) -> Self {
        Self { target, sender }
    }
}

impl PresentationListener for InterstitialListener {
    fn on_presentation_state_changed(&self, state: PresentationState) {
        tracing::trace!(slot = self.target.index(), ?state, "interstitial presentation changed");
        match state {
            // showing an interstitial also leaves the app
            PresentationState::CoveringUi => {
                self.sender.send(Command::new(self.target, CommandKind::Shown));
                self.sender.send(Command::new(self.target, CommandKind::AppLeave));
            }
            PresentationState::Hidden => {
                self.sender.send(Command::new(self.target, CommandKind::Hidden));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AdResult;

    fn setup() -> (Arc<CommandQueue>, CommandSender, SlotKey) {
        let queue = Arc::new(CommandQueue::new(8, 8));
        let sender = CommandSender::new(&queue);
        (queue, sender, SlotKey::new(2, 7))
    }

    #[test]
    fn initialize_failure_schedules_release() {
        let (queue, sender, key) = setup();
        initialize_completion(sender, key)(NativeResult::failure(AdResult::NetworkError, "offline"));

        let drained = queue.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind, CommandKind::FailedToLoad);
        assert_eq!(drained[0].result, AdResult::NetworkError);
        assert_eq!(drained[0].message.as_deref(), Some("offline"));
        assert_eq!(drained[0].post_action, Some(PostAction::ReleaseSlot));
        assert_eq!(drained[0].target, key);
    }

    #[test]
    fn successful_steps_enqueue_plain_commands() {
        let (queue, sender, key) = setup();
        initialize_completion(sender.clone(), key)(NativeResult::success());
        load_completion(sender, key)(NativeResult::success());

        let kinds: Vec<_> = queue.drain_all().into_iter().map(|c| (c.kind, c.post_action)).collect();
        assert_eq!(kinds, vec![(CommandKind::Initialized, None), (CommandKind::Loaded, None)]);
    }

    #[test]
    fn completion_after_queue_dropped_is_discarded() {
        let (queue, sender, key) = setup();
        let done = load_completion(sender.clone(), key);
        drop(queue);
        done(NativeResult::success());
        assert!(!sender.send(Command::new(key, CommandKind::Shown)));
    }

    #[test]
    fn banner_states_map_to_commands() {
        let (queue, sender, key) = setup();
        let listener = BannerListener::new(key, sender);
        listener.on_presentation_state_changed(PresentationState::VisibleWithAd);
        listener.on_presentation_state_changed(PresentationState::CoveringUi);
        listener.on_presentation_state_changed(PresentationState::CoveringUi);
        listener.on_presentation_state_changed(PresentationState::OpenedPartialOverlay);
        listener.on_presentation_state_changed(PresentationState::Hidden);

        let kinds: Vec<_> = queue.drain_all().into_iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![CommandKind::Shown, CommandKind::AppLeave, CommandKind::AppLeave, CommandKind::Hidden]
        );
    }

    #[test]
    fn interstitial_covering_reports_show_then_leave() {
        let (queue, sender, key) = setup();
        let listener = InterstitialListener::new(key, sender);
        listener.on_presentation_state_changed(PresentationState::CoveringUi);
        listener.on_presentation_state_changed(PresentationState::Hidden);

        let kinds: Vec<_> = queue.drain_all().into_iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CommandKind::Shown, CommandKind::AppLeave, CommandKind::Hidden]);
    }

    #[test]
    fn hide_completion_carries_its_own_token() {
        let (queue, sender, key) = setup();
        let token = TeardownToken::new(41, key);
        hide_completion(sender, token)(NativeResult::success());

        let drained = queue.drain_all();
        assert_eq!(drained[0].kind, CommandKind::TeardownComplete);
        assert_eq!(drained[0].post_action, Some(PostAction::FinishTeardown(token)));
    }
}
