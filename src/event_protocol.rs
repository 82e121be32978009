//!
//! Event delivery protocol - what the caller's callback receives per dispatched command
//!

use crate::types::{AdEvent, AdKind, AdResult, SlotId};

/// Event as seen from Rust
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdEventInfo<'a> {
    pub kind: AdKind,
    pub ad_unit: &'a str,
    pub event: AdEvent,
    pub result: AdResult,
    /// Diagnostic message, empty when the SDK gave none
    pub message: &'a str,
}

/// Caller event sink registered at load time
pub trait AdEventHandler: Send + Sync {
    /// Handle one event for `slot`. Runs on the dispatching thread only.
    fn handle_event(&self, slot: SlotId, event: &AdEventInfo<'_>);
}

impl<F> AdEventHandler for F
where
    F: Fn(SlotId, &AdEventInfo<'_>) + Send + Sync,
{
    fn handle_event(&self, slot: SlotId, event: &AdEventInfo<'_>) {
        self(slot, event)
    }
}

// ============================================================================
// C representation
// ============================================================================

/// String data structure (UTF-8, not NUL terminated)
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StringData {
    pub ptr: *const u8,
    pub len: usize,
}

impl StringData {
    pub fn borrowed(text: &str) -> Self {
        Self {
            ptr: text.as_ptr(),
            len: text.len(),
        }
    }

    /// # Safety
    /// `ptr`/`len` must still reference the live UTF-8 buffer they were built from
    pub unsafe fn as_str<'a>(&self) -> &'a str {
        if self.ptr.is_null() || self.len == 0 {
            return "";
        }
        unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(self.ptr, self.len)) }
    }
}

/// Event message passed to the C callback - 16-byte header + two string views
///
/// Strings borrow Rust-owned buffers and are only valid for the duration of the callback.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AdEventMessage {
    pub slot_id: i32,
    pub ad_kind: i32,
    pub event: i32,
    pub result: i32,
    pub ad_unit: StringData,
    pub message: StringData,
}

impl AdEventMessage {
    pub fn from_info(slot: SlotId, info: &AdEventInfo<'_>) -> Self {
        Self {
            slot_id: slot as i32,
            ad_kind: info.kind as i32,
            event: info.event as i32,
            result: info.result as i32,
            ad_unit: StringData::borrowed(info.ad_unit),
            message: StringData::borrowed(info.message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == AdResult::None as i32
    }
}

// Compile-time assertions - layout seen by the C side
const _: () = {
    assert!(std::mem::size_of::<StringData>() == 2 * std::mem::size_of::<usize>());
    assert!(std::mem::align_of::<AdEventMessage>() <= 8);
};
