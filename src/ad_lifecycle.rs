//! Caller-facing ad operations
//!
//! Every operation validates and returns immediately. Native work is started here and
//! reports back later through the completion bridge.

use std::sync::Arc;

use crate::ad_context::AdContext;
use crate::ad_request::AdRequestConfig;
use crate::command_queue::{Command, CommandKind, PostAction};
use crate::completion_bridge::{discard_completion, initialize_completion};
use crate::error::AdError;
use crate::event_protocol::AdEventHandler;
use crate::slot_pool::NativeAd;
use crate::types::{AdKind, AdResult, AdState, MoveTarget, SlotId};

impl AdContext {
    fn ensure_running(&self) -> Result<(), AdError> {
        if self.is_terminated() {
            return Err(AdError::with_message(
                AdResult::Uninitialized,
                "ads context has been shut down",
            ));
        }
        Ok(())
    }

    /// Allocate a slot and start the native initialize step. Load follows once initialize
    /// has been dispatched successfully.
    pub fn load(
        &mut self,
        kind: AdKind,
        ad_unit: &str,
        request: AdRequestConfig,
        handler: Arc<dyn AdEventHandler>,
    ) -> Result<SlotId, AdError> {
        self.ensure_running()?;
        if !kind.is_loadable() {
            return Err(AdError::with_message(
                AdResult::InvalidKind,
                format!("Invalid kind: {}", kind as i32),
            ));
        }
        let key = self.pool.allocate(kind)?;
        let done = initialize_completion(self.sender.clone(), key);

        let native = match kind {
            AdKind::Banner => {
                let mut view = self.sdk.create_banner();
                view.initialize(self.parent, ad_unit, request.banner_size(), done);
                NativeAd::Banner(view)
            }
            _ => {
                let mut ad = self.sdk.create_interstitial();
                ad.initialize(self.parent, ad_unit, done);
                NativeAd::Interstitial(ad)
            }
        };

        let slot = self.pool.live_mut(key.index())?;
        slot.ad_unit = ad_unit.to_string();
        slot.request = request;
        slot.handler = Some(handler);
        slot.native = native;

        tracing::debug!(slot = key.index(), ?kind, ad_unit, "ad load started");
        Ok(key.index())
    }

    /// Present the ad. A no-op until the ad has loaded.
    pub fn show(&mut self, id: SlotId) -> Result<(), AdError> {
        self.ensure_running()?;
        let slot = self.pool.live_mut(id)?;
        if !slot.initialized || slot.state == AdState::Unloading {
            tracing::debug!(slot = id, state = ?slot.state, "show ignored, ad not ready");
            return Ok(());
        }
        match &mut slot.native {
            NativeAd::Banner(view) => view.show(),
            NativeAd::Interstitial(ad) => {
                if slot.state == AdState::Hidden {
                    tracing::debug!(slot = id, "interstitial already dismissed, not shown again");
                    return Ok(());
                }
                ad.show();
            }
            NativeAd::None => return Ok(()),
        }
        slot.state = AdState::Showing;
        Ok(())
    }

    /// Hide a banner. Interstitials are dismissed by the user only.
    pub fn hide(&mut self, id: SlotId) -> Result<(), AdError> {
        self.ensure_running()?;
        let slot = self.pool.live_mut(id)?;
        if !slot.initialized || slot.state == AdState::Unloading {
            tracing::debug!(slot = id, state = ?slot.state, "hide ignored, ad not ready");
            return Ok(());
        }
        if let NativeAd::Banner(view) = &mut slot.native {
            view.hide(discard_completion());
            slot.state = AdState::Hidden;
        }
        Ok(())
    }

    /// Reposition a loaded banner
    pub fn move_to(&mut self, id: SlotId, target: MoveTarget) -> Result<(), AdError> {
        self.ensure_running()?;
        let slot = self.pool.live_mut(id)?;
        if slot.kind != AdKind::Banner {
            return Err(AdError::with_message(
                AdResult::WrongKind,
                format!("move_to is only supported by banner ads (id: {id})"),
            ));
        }
        if !slot.initialized || !slot.state.is_presentable() {
            return Err(AdError::with_message(
                AdResult::NotInitialized,
                format!("move_to can only be called after initialization is done (id: {id})"),
            ));
        }
        if let NativeAd::Banner(view) = &mut slot.native {
            match target {
                MoveTarget::Position(position) => view.move_to_position(position),
                MoveTarget::Point { x, y } => view.move_to_point(x, y),
            }
        }
        Ok(())
    }

    /// Schedule the ad for removal. The slot is released after `Unloaded` is dispatched.
    pub fn unload(&mut self, id: SlotId) -> Result<(), AdError> {
        self.ensure_running()?;
        let slot = self.pool.live_mut(id)?;
        if slot.state == AdState::Unloading {
            tracing::debug!(slot = id, "unload already pending");
            return Ok(());
        }
        slot.state = AdState::Unloading;
        let key = slot.key();

        self.queue
            .push(Command::new(key, CommandKind::Unloaded).with_post_action(PostAction::ReleaseSlot));
        tracing::debug!(slot = id, "ad unload scheduled");
        Ok(())
    }
}
