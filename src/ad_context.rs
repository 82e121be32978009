//! Ads context
//!
//! Owns everything the main cycle mutates: the slot pool, the covering-UI designation and
//! the teardown registry. The command queue is shared with the completion bridge, which
//! only ever sees it through a [`CommandSender`].
//!
//! Caller operations live in `ad_lifecycle`, the per-tick drain in `dispatcher`.

use std::sync::Arc;

use crate::command_queue::CommandQueue;
use crate::completion_bridge::CommandSender;
use crate::config::AdsConfig;
use crate::deferred_teardown::DeferredTeardown;
use crate::error::AdError;
use crate::native::{AdParent, AdSdk};
use crate::slot_pool::{AdSlot, AdSlotPool, NativeAd};
use crate::types::{AdKind, AdState, SlotId};

pub struct AdContext {
    pub(crate) sdk: Arc<dyn AdSdk>,
    pub(crate) parent: AdParent,
    pub(crate) pool: AdSlotPool,
    pub(crate) covering_ui: Option<SlotId>,
    pub(crate) queue: Arc<CommandQueue>,
    pub(crate) sender: CommandSender,
    pub(crate) teardown: DeferredTeardown,
    terminated: bool,
}

impl AdContext {
    /// Initialize the native SDK and build the context around it.
    ///
    /// Fails without touching the SDK when the configuration is invalid or carries no app id
    /// for this platform.
    pub fn new(sdk: Arc<dyn AdSdk>, parent: AdParent, config: &AdsConfig) -> Result<Self, AdError> {
        config.validate()?;
        let app_id = config.app_id()?;
        sdk.initialize(app_id)?;

        let queue = Arc::new(CommandQueue::new(
            config.command_queue_capacity,
            config.command_queue_growth,
        ));
        let sender = CommandSender::new(&queue);

        tracing::info!(max_ads = config.max_ads, "ads context initialized");
        Ok(Self {
            sdk,
            parent,
            pool: AdSlotPool::new(config.max_ads),
            covering_ui: None,
            queue,
            sender,
            teardown: DeferredTeardown::new(),
            terminated: false,
        })
    }

    pub fn state(&self, id: SlotId) -> Result<AdState, AdError> {
        Ok(self.pool.live(id)?.state())
    }

    pub fn kind(&self, id: SlotId) -> Result<AdKind, AdError> {
        Ok(self.pool.live(id)?.kind())
    }

    /// Slot currently covering the host UI
    pub fn covering_ui(&self) -> Option<SlotId> {
        self.covering_ui
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn allocated_ids(&self) -> Vec<SlotId> {
        self.pool.allocated_ids()
    }

    pub fn free_ids(&self) -> Vec<SlotId> {
        self.pool.free_ids()
    }

    /// Commands waiting for the next tick
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Banners detached from their slot whose hide has not been dispatched yet
    pub fn pending_teardowns(&self) -> usize {
        self.teardown.pending_count()
    }

    /// Host came back to the foreground
    pub fn on_activate(&mut self) {
        self.covering_ui = None;
        self.resume_banners();
    }

    /// Host is going to the background. Events of an ad that took over the screen are
    /// delivered before the host stops ticking.
    pub fn on_deactivate(&mut self) {
        if self.covering_ui.is_some() {
            self.tick();
        }
        self.pause_banners();
    }

    pub(crate) fn pause_banners(&mut self) {
        for slot in self.pool.iter_live_mut() {
            if let NativeAd::Banner(view) = &mut slot.native {
                view.pause();
            }
        }
    }

    pub(crate) fn resume_banners(&mut self) {
        for slot in self.pool.iter_live_mut() {
            if let NativeAd::Banner(view) = &mut slot.native {
                view.resume();
            }
        }
    }

    /// Release a cleared slot's native resources.
    ///
    /// Banners go through deferred teardown; interstitials are released right away.
    pub(crate) fn dispose(&mut self, slot: AdSlot) {
        let key = slot.key();
        match slot.native {
            NativeAd::Banner(view) => {
                self.teardown.retire_banner(key, view, slot.listener, &self.sender);
            }
            NativeAd::Interstitial(mut ad) => {
                ad.set_listener(None);
                drop(ad);
                drop(slot.listener);
                tracing::debug!(slot = key.index(), "interstitial released");
            }
            NativeAd::None => {}
        }
    }

    /// Clear every slot, drop pending teardowns and terminate the SDK. Runs once.
    pub fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        for id in self.pool.allocated_ids() {
            if let Some(slot) = self.pool.release(id) {
                self.dispose(slot);
            }
        }
        self.covering_ui = None;
        self.teardown.clear();

        let undelivered = self.queue.drain_all().len();
        if undelivered > 0 {
            tracing::debug!(count = undelivered, "dropping undelivered commands at shutdown");
        }

        self.sdk.terminate();
        tracing::info!("ads context shut down");
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Drop for AdContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
