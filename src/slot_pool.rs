//! Fixed-capacity ad slot pool
//!
//! Slots are addressed by their index, which is what the caller sees. Internally every
//! reference that can outlive a synchronous call (bridge adapters, queued commands) uses a
//! [`SlotKey`] that also carries the slot generation, so a completion aimed at a cleared slot
//! can never land on the ad that reused it.

use std::sync::Arc;

use crate::ad_request::AdRequestConfig;
use crate::error::AdError;
use crate::event_protocol::AdEventHandler;
use crate::native::{BannerView, InterstitialAd, PresentationListener};
use crate::types::{AdKind, AdResult, AdState, SlotId};

/// Generation-stamped slot reference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: SlotId,
    generation: u32,
}

impl SlotKey {
    pub fn new(index: SlotId, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> SlotId {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// The native object owned by a slot; the variant always matches the slot kind
#[derive(Default)]
pub enum NativeAd {
    #[default]
    None,
    Banner(Box<dyn BannerView>),
    Interstitial(Box<dyn InterstitialAd>),
}

/// One pool entry
#[derive(Default)]
pub struct AdSlot {
    pub(crate) id: SlotId,
    pub(crate) generation: u32,
    pub(crate) kind: AdKind,
    pub(crate) state: AdState,
    pub(crate) request: AdRequestConfig,
    pub(crate) handler: Option<Arc<dyn AdEventHandler>>,
    pub(crate) ad_unit: String,
    pub(crate) initialized: bool,
    pub(crate) native: NativeAd,
    pub(crate) listener: Option<Arc<dyn PresentationListener>>,
}

impl AdSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.id, self.generation)
    }

    pub fn is_free(&self) -> bool {
        self.kind == AdKind::None
    }

    pub fn kind(&self) -> AdKind {
        self.kind
    }

    pub fn state(&self) -> AdState {
        self.state
    }

    pub fn ad_unit(&self) -> &str {
        &self.ad_unit
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

pub struct AdSlotPool {
    slots: Vec<AdSlot>,
}

impl AdSlotPool {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|id| AdSlot {
                id,
                ..AdSlot::default()
            })
            .collect();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim the first free slot for `kind`
    pub fn allocate(&mut self, kind: AdKind) -> Result<SlotKey, AdError> {
        let capacity = self.slots.len();
        let slot = self.slots.iter_mut().find(|slot| slot.is_free()).ok_or_else(|| {
            AdError::with_message(AdResult::TooManyAds, format!("Too many ads in use: {capacity}"))
        })?;
        slot.kind = kind;
        slot.state = AdState::Initializing;
        Ok(slot.key())
    }

    /// Reset the slot to its unallocated default and return what it held.
    ///
    /// The caller owns disposal of the returned native resources.
    pub fn release(&mut self, index: SlotId) -> Option<AdSlot> {
        let slot = self.slots.get_mut(index)?;
        let fresh = AdSlot {
            id: slot.id,
            generation: slot.generation.wrapping_add(1),
            ..AdSlot::default()
        };
        Some(std::mem::replace(slot, fresh))
    }

    /// Allocated slot by caller id
    pub fn live(&self, id: SlotId) -> Result<&AdSlot, AdError> {
        match self.slots.get(id) {
            Some(slot) if !slot.is_free() => Ok(slot),
            _ => Err(invalid_id(id)),
        }
    }

    pub fn live_mut(&mut self, id: SlotId) -> Result<&mut AdSlot, AdError> {
        match self.slots.get_mut(id) {
            Some(slot) if !slot.is_free() => Ok(slot),
            _ => Err(invalid_id(id)),
        }
    }

    /// Allocated slot still holding the generation `key` was issued for
    pub fn resolve(&self, key: SlotKey) -> Option<&AdSlot> {
        self.slots
            .get(key.index)
            .filter(|slot| !slot.is_free() && slot.generation == key.generation)
    }

    pub fn resolve_mut(&mut self, key: SlotKey) -> Option<&mut AdSlot> {
        self.slots
            .get_mut(key.index)
            .filter(|slot| !slot.is_free() && slot.generation == key.generation)
    }

    pub fn iter_live_mut(&mut self) -> impl Iterator<Item = &mut AdSlot> {
        self.slots.iter_mut().filter(|slot| !slot.is_free())
    }

    pub fn allocated_ids(&self) -> Vec<SlotId> {
        self.slots.iter().filter(|s| !s.is_free()).map(|s| s.id).collect()
    }

    pub fn free_ids(&self) -> Vec<SlotId> {
        self.slots.iter().filter(|s| s.is_free()).map(|s| s.id).collect()
    }
}

fn invalid_id(id: SlotId) -> AdError {
    AdError::with_message(AdResult::InvalidId, format!("Invalid id: {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_first_free_slot_until_full() {
        let mut pool = AdSlotPool::new(2);
        let a = pool.allocate(AdKind::Banner).unwrap();
        let b = pool.allocate(AdKind::Interstitial).unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert!(!pool.live(0).unwrap().is_initialized());

        let err = pool.allocate(AdKind::Banner).unwrap_err();
        assert_eq!(err.code(), AdResult::TooManyAds);
    }

    #[test]
    fn release_bumps_generation_and_frees_slot() {
        let mut pool = AdSlotPool::new(2);
        let first = pool.allocate(AdKind::Banner).unwrap();
        pool.live_mut(0).unwrap().ad_unit = "unit1".to_string();

        let old = pool.release(first.index()).unwrap();
        assert_eq!(old.ad_unit, "unit1");
        assert_eq!(old.kind, AdKind::Banner);
        assert!(pool.resolve(first).is_none());
        assert_eq!(pool.free_ids(), vec![0, 1]);

        let second = pool.allocate(AdKind::Interstitial).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(pool.resolve(first).is_none());
        assert!(pool.resolve(second).is_some());
        assert_eq!(pool.live(0).unwrap().ad_unit(), "");
    }

    #[test]
    fn free_and_out_of_range_ids_are_invalid() {
        let mut pool = AdSlotPool::new(1);
        assert_eq!(pool.live(0).err().unwrap().code(), AdResult::InvalidId);
        assert_eq!(pool.live_mut(5).err().unwrap().code(), AdResult::InvalidId);
        assert!(pool.release(5).is_none());
    }

    #[test]
    fn allocated_and_free_sets_are_disjoint() {
        let mut pool = AdSlotPool::new(4);
        pool.allocate(AdKind::Banner).unwrap();
        pool.allocate(AdKind::Banner).unwrap();
        pool.release(0);

        let allocated = pool.allocated_ids();
        let free = pool.free_ids();
        assert_eq!(allocated, vec![1]);
        assert_eq!(free, vec![0, 2, 3]);
        assert!(allocated.iter().all(|id| !free.contains(id)));
    }
}
