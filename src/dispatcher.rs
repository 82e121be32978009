//! Main-cycle command dispatch
//!
//! Each command goes through three steps:
//! 1. `begin_dispatch` validates it against the slot it targets and applies the state change
//! 2. the prepared delivery invokes the caller's handler
//! 3. `finish_dispatch` runs the post-action and drops the command's message
//!
//! The C ABI runs step 2 without holding the context lock so the host may call back into
//! the context from its handler.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::ad_context::AdContext;
use crate::command_queue::{Command, CommandKind, PostAction};
use crate::completion_bridge::{BannerListener, InterstitialListener, load_completion};
use crate::event_protocol::{AdEventHandler, AdEventInfo};
use crate::native::PresentationListener;
use crate::slot_pool::{NativeAd, SlotKey};
use crate::types::{AdEvent, AdKind, AdResult, AdState, SlotId};

/// A command that passed validation and is ready for the caller's handler
pub struct PreparedDelivery {
    target: SlotKey,
    handler: Option<Arc<dyn AdEventHandler>>,
    kind: AdKind,
    ad_unit: String,
    event: AdEvent,
    result: AdResult,
    message: Option<String>,
    post_action: Option<PostAction>,
}

impl PreparedDelivery {
    pub fn slot(&self) -> SlotId {
        self.target.index()
    }

    pub fn event(&self) -> AdEvent {
        self.event
    }

    pub fn info(&self) -> AdEventInfo<'_> {
        AdEventInfo {
            kind: self.kind,
            ad_unit: &self.ad_unit,
            event: self.event,
            result: self.result,
            message: self.message.as_deref().unwrap_or(""),
        }
    }

    /// Invoke the handler. A panicking handler is logged and does not stop the tick.
    pub fn deliver(&self) {
        let Some(handler) = &self.handler else {
            return;
        };
        let info = self.info();
        let slot = self.slot();
        if catch_unwind(AssertUnwindSafe(|| handler.handle_event(slot, &info))).is_err() {
            tracing::error!(slot, event = ?self.event, "ad event handler panicked");
        }
    }
}

impl AdContext {
    /// Deliver every queued command in FIFO order. Returns the number of events delivered.
    pub fn tick(&mut self) -> usize {
        let mut delivered = 0;
        for command in self.drain_commands() {
            if let Some(delivery) = self.begin_dispatch(command) {
                delivery.deliver();
                self.finish_dispatch(delivery);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn drain_commands(&self) -> Vec<Command> {
        self.queue.drain_all()
    }

    /// Apply a command to its slot. Returns the delivery when the caller must be notified.
    pub fn begin_dispatch(&mut self, command: Command) -> Option<PreparedDelivery> {
        if let (CommandKind::TeardownComplete, Some(PostAction::FinishTeardown(token))) =
            (command.kind, command.post_action)
        {
            self.teardown.finish(token);
            return None;
        }

        let Command {
            target,
            kind,
            result,
            message,
            post_action,
        } = command;

        let Some(slot) = self.pool.resolve_mut(target) else {
            tracing::debug!(slot = target.index(), ?kind, "discarding command for cleared slot");
            return None;
        };
        if slot.state == AdState::Unloading && kind != CommandKind::Unloaded {
            tracing::debug!(slot = target.index(), ?kind, "discarding command for unloading slot");
            return None;
        }

        match kind {
            CommandKind::Initialized => {
                let done = load_completion(self.sender.clone(), target);
                match &mut slot.native {
                    NativeAd::Banner(view) => view.load_ad(&slot.request, done),
                    NativeAd::Interstitial(ad) => ad.load_ad(&slot.request, done),
                    NativeAd::None => {}
                }
                tracing::debug!(slot = target.index(), "ad initialized, loading");
                return None;
            }
            CommandKind::Loaded => {
                slot.state = AdState::Ready;
                slot.initialized = true;
                let listener: Arc<dyn PresentationListener> = match slot.kind {
                    AdKind::Banner => Arc::new(BannerListener::new(target, self.sender.clone())),
                    _ => Arc::new(InterstitialListener::new(target, self.sender.clone())),
                };
                match &mut slot.native {
                    NativeAd::Banner(view) => view.set_listener(Some(listener.clone())),
                    NativeAd::Interstitial(ad) => ad.set_listener(Some(listener.clone())),
                    NativeAd::None => {}
                }
                slot.listener = Some(listener);
            }
            CommandKind::FailedToLoad => slot.state = AdState::FailedToLoad,
            CommandKind::Shown => slot.state = AdState::Showing,
            CommandKind::Hidden => slot.state = AdState::Hidden,
            CommandKind::AppLeave => {
                if let Some(covering) = self.covering_ui {
                    tracing::debug!(slot = target.index(), covering, "already covering UI, ignoring app leave");
                    return None;
                }
                self.covering_ui = Some(target.index());
            }
            _ => {}
        }

        let event = kind.event()?;
        tracing::debug!(slot = target.index(), ?event, ?result, "dispatching ad event");
        Some(PreparedDelivery {
            target,
            handler: slot.handler.clone(),
            kind: slot.kind,
            ad_unit: slot.ad_unit.clone(),
            event,
            result,
            message,
            post_action,
        })
    }

    /// Run the delivered command's post-action
    pub fn finish_dispatch(&mut self, delivery: PreparedDelivery) {
        match delivery.post_action {
            Some(PostAction::ReleaseSlot) => self.release_slot(delivery.target),
            Some(PostAction::FinishTeardown(token)) => {
                self.teardown.finish(token);
            }
            None => {}
        }
    }

    fn release_slot(&mut self, target: SlotKey) {
        if self.pool.resolve(target).is_none() {
            return;
        }
        if self.covering_ui == Some(target.index()) {
            self.covering_ui = None;
        }
        if let Some(slot) = self.pool.release(target.index()) {
            tracing::debug!(slot = target.index(), "slot released");
            self.dispose(slot);
        }
    }
}
