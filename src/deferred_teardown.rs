//! Two-phase banner teardown
//!
//! A banner's hide is asynchronous, so its view cannot be dropped when the slot is cleared.
//! The view and its listener are parked here under a [`TeardownToken`] and dropped once the
//! hide completion for that token has been dispatched.

use std::collections::HashMap;
use std::sync::Arc;

use crate::completion_bridge::{CommandSender, hide_completion};
use crate::native::{BannerView, PresentationListener};
use crate::slot_pool::SlotKey;

/// Handle to one parked teardown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TeardownToken {
    id: u64,
    slot: SlotKey,
}

impl TeardownToken {
    pub fn new(id: u64, slot: SlotKey) -> Self {
        Self { id, slot }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Slot (and generation) the resources were detached from
    pub fn slot(&self) -> SlotKey {
        self.slot
    }
}

struct PendingTeardown {
    view: Box<dyn BannerView>,
    listener: Option<Arc<dyn PresentationListener>>,
}

/// Registry of banners waiting for their hide to finish
#[derive(Default)]
pub struct DeferredTeardown {
    next_id: u64,
    pending: HashMap<u64, PendingTeardown>,
}

impl DeferredTeardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a detached banner, request its hide and park it until that completes
    pub fn retire_banner(
        &mut self,
        slot: SlotKey,
        mut view: Box<dyn BannerView>,
        listener: Option<Arc<dyn PresentationListener>>,
        sender: &CommandSender,
    ) -> TeardownToken {
        self.next_id += 1;
        let token = TeardownToken::new(self.next_id, slot);

        // no presentation events from a view that is going away
        view.set_listener(None);
        view.hide(hide_completion(sender.clone(), token));
        self.pending.insert(token.id, PendingTeardown { view, listener });

        tracing::debug!(slot = slot.index(), token = token.id, "banner teardown deferred");
        token
    }

    /// Drop the resources parked under `token`. Returns false for unknown or finished tokens.
    pub fn finish(&mut self, token: TeardownToken) -> bool {
        match self.pending.remove(&token.id) {
            Some(PendingTeardown { view, listener }) => {
                drop(listener);
                drop(view);
                tracing::debug!(slot = token.slot.index(), token = token.id, "banner teardown finished");
                true
            }
            None => {
                tracing::warn!(token = token.id, "unknown teardown token, ignoring");
                false
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every parked resource without waiting for its hide
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "dropping pending teardowns");
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad_request::AdRequestConfig;
    use crate::command_queue::{CommandKind, CommandQueue, PostAction};
    use crate::native::{AdParent, Completion, NativeResult};
    use crate::types::{BannerPosition, BannerSize};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        drops: AtomicUsize,
        hide: Mutex<Option<Completion>>,
    }

    struct ProbeView(Arc<Probe>);

    impl BannerView for ProbeView {
        fn initialize(&mut self, _: AdParent, _: &str, _: BannerSize, _: Completion) {}
        fn load_ad(&mut self, _: &AdRequestConfig, _: Completion) {}
        fn show(&mut self) {}
        fn hide(&mut self, done: Completion) {
            *self.0.hide.lock().unwrap() = Some(done);
        }
        fn move_to_position(&mut self, _: BannerPosition) {}
        fn move_to_point(&mut self, _: i32, _: i32) {}
        fn pause(&mut self) {}
        fn resume(&mut self) {}
        fn set_listener(&mut self, _: Option<Arc<dyn PresentationListener>>) {}
    }

    impl Drop for ProbeView {
        fn drop(&mut self) {
            self.0.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn view_outlives_clear_until_hide_completes() {
        let queue = Arc::new(CommandQueue::new(4, 4));
        let sender = CommandSender::new(&queue);
        let probe = Arc::new(Probe::default());
        let mut teardown = DeferredTeardown::new();

        let token = teardown.retire_banner(SlotKey::new(1, 3), Box::new(ProbeView(probe.clone())), None, &sender);
        assert_eq!(teardown.pending_count(), 1);
        assert_eq!(probe.drops.load(Ordering::SeqCst), 0);

        let done = probe.hide.lock().unwrap().take().unwrap();
        done(NativeResult::success());
        let commands = queue.drain_all();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].kind, CommandKind::TeardownComplete);
        assert_eq!(commands[0].post_action, Some(PostAction::FinishTeardown(token)));
        // still parked until the command is dispatched
        assert_eq!(probe.drops.load(Ordering::SeqCst), 0);

        assert!(teardown.finish(token));
        assert_eq!(probe.drops.load(Ordering::SeqCst), 1);
        assert!(!teardown.finish(token));
        assert_eq!(probe.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tokens_are_unique_per_retirement() {
        let queue = Arc::new(CommandQueue::new(4, 4));
        let sender = CommandSender::new(&queue);
        let mut teardown = DeferredTeardown::new();
        let slot = SlotKey::new(0, 0);

        let a = teardown.retire_banner(slot, Box::new(ProbeView(Arc::default())), None, &sender);
        let b = teardown.retire_banner(slot, Box::new(ProbeView(Arc::default())), None, &sender);
        assert_ne!(a, b);
        assert!(b.id() > a.id());
        assert!(!teardown.finish(TeardownToken::new(99, slot)));
        assert_eq!(teardown.pending_count(), 2);
    }

    #[test]
    fn clear_drops_everything_parked() {
        let queue = Arc::new(CommandQueue::new(4, 4));
        let sender = CommandSender::new(&queue);
        let probe = Arc::new(Probe::default());
        let mut teardown = DeferredTeardown::new();

        teardown.retire_banner(SlotKey::new(0, 0), Box::new(ProbeView(probe.clone())), None, &sender);
        teardown.clear();
        assert_eq!(teardown.pending_count(), 0);
        assert_eq!(probe.drops.load(Ordering::SeqCst), 1);
    }
}
