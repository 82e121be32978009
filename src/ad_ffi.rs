//! C ABI for scripting hosts
//!
//! Every function returns an [`AdResult`] code (0 on success) unless documented otherwise.
//! The handle is not reentrant-locked: events are delivered from [`ads_tick`] with the
//! context unlocked, so the host callback may call any other `ads_*` function.

use std::ffi::{CStr, c_char};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ad_context::AdContext;
use crate::ad_request::AdRequestConfig;
use crate::config::AdsConfig;
use crate::error::AdError;
use crate::event_protocol::{AdEventHandler, AdEventInfo, AdEventMessage};
use crate::native::AdParent;
use crate::simulated_sdk::SimulatedSdk;
use crate::types::{AdKind, AdResult, BannerPosition, MoveTarget, SlotId};

// ============================================
// Callback Types
// ============================================

/// Event callback; `message` and the strings it points to are valid only during the call
pub type AdEventCallback = extern "C" fn(user_data: usize, message: *const AdEventMessage);

/// Wrapper to make function pointers Send + Sync
#[derive(Clone, Copy)]
pub struct SendableCallback<T>(pub T);

unsafe impl<T> Send for SendableCallback<T> {}
unsafe impl<T> Sync for SendableCallback<T> {}

/// Forwards events to a C callback together with the host's opaque user data
struct FfiEventHandler {
    callback: SendableCallback<AdEventCallback>,
    user_data: usize,
}

impl AdEventHandler for FfiEventHandler {
    fn handle_event(&self, slot: SlotId, event: &AdEventInfo<'_>) {
        let message = AdEventMessage::from_info(slot, event);
        (self.callback.0)(self.user_data, &message);
    }
}

// ============================================
// Handle
// ============================================

pub struct AdContextHandle {
    context: Mutex<AdContext>,
}

impl AdContextHandle {
    pub fn new(context: AdContext) -> Self {
        Self {
            context: Mutex::new(context),
        }
    }

    pub fn into_raw(self) -> *mut AdContextHandle {
        Box::into_raw(Box::new(self))
    }

    /// Run `f` on the locked context
    pub fn with_context<R>(&self, f: impl FnOnce(&mut AdContext) -> R) -> R {
        f(&mut self.context.lock())
    }

    /// Deliver queued events without holding the lock across the host callback
    pub fn dispatch(&self) -> usize {
        let commands = self.context.lock().drain_commands();
        let mut delivered = 0;
        for command in commands {
            let delivery = self.context.lock().begin_dispatch(command);
            if let Some(delivery) = delivery {
                delivery.deliver();
                self.context.lock().finish_dispatch(delivery);
                delivered += 1;
            }
        }
        delivered
    }
}

macro_rules! check_handle {
    ($handle:expr) => {
        if $handle.is_null() {
            return AdResult::InvalidParameter as i32;
        }
    };
}

fn result_code(result: Result<(), AdError>) -> i32 {
    match result {
        Ok(()) => AdResult::None as i32,
        Err(e) => {
            tracing::warn!(code = e.code_value(), "{e}");
            e.code_value()
        }
    }
}

/// Borrow a nullable C string; null reads as `None`
unsafe fn optional_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, AdError> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(Some)
        .map_err(|_| AdError::with_message(AdResult::InvalidParameter, "string is not valid UTF-8"))
}

// ============================================
// Lifecycle
// ============================================

/// Install the stderr tracing subscriber. Returns true when this call installed it.
#[unsafe(no_mangle)]
pub extern "C" fn ads_init_logging() -> bool {
    crate::logging::init_logging()
}

/// Create a context backed by the simulated SDK (automatic mode)
///
/// # Parameters
/// - `config_json`: `AdsConfig` as JSON, or null for defaults
/// - `parent`: opaque platform window handle
///
/// Returns null when the configuration is invalid or has no app id.
///
/// # Safety
/// - `config_json` must be null or a valid null-terminated C string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_context_new_simulated(
    config_json: *const c_char,
    parent: usize,
) -> *mut AdContextHandle {
    let created = (|| -> Result<AdContext, AdError> {
        let config = match unsafe { optional_str(config_json) }? {
            Some(json) if !json.trim().is_empty() => AdsConfig::from_json_str(json)?,
            _ => AdsConfig::default(),
        };
        let sdk = SimulatedSdk::automatic(&config.simulated)?;
        AdContext::new(Arc::new(sdk), AdParent(parent), &config)
    })();

    match created {
        Ok(context) => AdContextHandle::new(context).into_raw(),
        Err(e) => {
            tracing::error!(code = e.code_value(), "failed to create ads context: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Shut the context down and free it
///
/// # Safety
/// - `handle` must come from `ads_context_new_simulated` and not be used afterwards
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_context_free(handle: *mut AdContextHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle);
        }
    }
}

// ============================================
// Ad Operations
// ============================================

/// Load an ad
///
/// # Parameters
/// - `kind`: `AdKind` code
/// - `ad_unit`: ad unit identifier
/// - `request_json`: `AdRequestConfig` as JSON, or null for defaults
/// - `callback`/`user_data`: event sink for this ad
/// - `out_slot`: receives the slot id on success
///
/// # Safety
/// - `handle` must be a live handle, `ad_unit` a valid C string, `out_slot` writable
/// - `request_json` must be null or a valid C string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_load(
    handle: *mut AdContextHandle,
    kind: i32,
    ad_unit: *const c_char,
    request_json: *const c_char,
    callback: AdEventCallback,
    user_data: usize,
    out_slot: *mut i32,
) -> i32 {
    check_handle!(handle);
    if ad_unit.is_null() || out_slot.is_null() {
        return AdResult::InvalidParameter as i32;
    }
    let handle = unsafe { &*handle };

    let loaded = (|| -> Result<SlotId, AdError> {
        let kind = AdKind::from_i32(kind).ok_or_else(|| {
            AdError::with_message(AdResult::InvalidKind, format!("Invalid kind: {kind}"))
        })?;
        let ad_unit = unsafe { optional_str(ad_unit) }?.unwrap_or_default();
        let request = match unsafe { optional_str(request_json) }? {
            Some(json) => AdRequestConfig::from_json_str(json)?,
            None => AdRequestConfig::default(),
        };
        let handler = Arc::new(FfiEventHandler {
            callback: SendableCallback(callback),
            user_data,
        });
        handle.with_context(|ctx| ctx.load(kind, ad_unit, request, handler))
    })();

    match loaded {
        Ok(slot) => {
            unsafe { *out_slot = slot as i32 };
            AdResult::None as i32
        }
        Err(e) => result_code(Err(e)),
    }
}

/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_show(handle: *mut AdContextHandle, slot: usize) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    result_code(handle.with_context(|ctx| ctx.show(slot)))
}

/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_hide(handle: *mut AdContextHandle, slot: usize) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    result_code(handle.with_context(|ctx| ctx.hide(slot)))
}

/// Move a banner to one of the `BannerPosition` anchors
///
/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_move_to_position(handle: *mut AdContextHandle, slot: usize, position: i32) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    result_code(handle.with_context(|ctx| -> Result<(), AdError> {
        ctx.kind(slot)?;
        let position = BannerPosition::try_from(position)?;
        ctx.move_to(slot, MoveTarget::Position(position))
    }))
}

/// Move a banner to a point in screen coordinates
///
/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_move_to_point(handle: *mut AdContextHandle, slot: usize, x: i32, y: i32) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    result_code(handle.with_context(|ctx| ctx.move_to(slot, MoveTarget::Point { x, y })))
}

/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_unload(handle: *mut AdContextHandle, slot: usize) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    result_code(handle.with_context(|ctx| ctx.unload(slot)))
}

// ============================================
// Host Hooks
// ============================================

/// Deliver queued events; call once per frame. Returns the number of events delivered,
/// or a negative value for a null handle.
///
/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_tick(handle: *mut AdContextHandle) -> i32 {
    if handle.is_null() {
        return -1;
    }
    let handle = unsafe { &*handle };
    handle.dispatch() as i32
}

/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_on_activate(handle: *mut AdContextHandle) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    handle.with_context(|ctx| ctx.on_activate());
    AdResult::None as i32
}

/// # Safety
/// - `handle` must be a live handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ads_on_deactivate(handle: *mut AdContextHandle) -> i32 {
    check_handle!(handle);
    let handle = unsafe { &*handle };
    if handle.with_context(|ctx| ctx.covering_ui().is_some()) {
        handle.dispatch();
    }
    handle.with_context(|ctx| ctx.pause_banners());
    AdResult::None as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    static LOADED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_loaded(user_data: usize, message: *const AdEventMessage) {
        let message = unsafe { &*message };
        let unit = unsafe { message.ad_unit.as_str() };
        if user_data == 7 && unit == "unit1" && message.event == crate::types::AdEvent::Loaded as i32 {
            LOADED.fetch_add(1, Ordering::SeqCst);
        }
    }

    extern "C" fn ignore(_: usize, _: *const AdEventMessage) {}

    static REENTERED: AtomicUsize = AtomicUsize::new(0);
    static FIRST_UNLOADED: AtomicUsize = AtomicUsize::new(0);
    static SECOND_LOADED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_second(_: usize, message: *const AdEventMessage) {
        let message = unsafe { &*message };
        if message.event == crate::types::AdEvent::Loaded as i32 {
            SECOND_LOADED.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Loads a second ad and unloads this one from inside the tick
    extern "C" fn reenter(user_data: usize, message: *const AdEventMessage) {
        let handle = user_data as *mut AdContextHandle;
        let message = unsafe { &*message };
        if message.event == crate::types::AdEvent::Loaded as i32 {
            let unit = c"unit-second";
            let mut slot = -1;
            let code = unsafe {
                ads_load(handle, AdKind::Interstitial as i32, unit.as_ptr(), std::ptr::null(), count_second, 0, &mut slot)
            };
            let unloaded = unsafe { ads_unload(handle, message.slot_id as usize) };
            let shown = unsafe { ads_show(handle, message.slot_id as usize) };
            if code == 0 && slot >= 0 && unloaded == 0 && shown == 0 {
                REENTERED.fetch_add(1, Ordering::SeqCst);
            }
        } else if message.event == crate::types::AdEvent::Unloaded as i32 {
            FIRST_UNLOADED.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn new_handle() -> *mut AdContextHandle {
        let config = CString::new(
            r#"{"app_id_android": "app", "app_id_ios": "app", "simulated": {"completion_delay_ms": 1}}"#,
        )
        .unwrap();
        let handle = unsafe { ads_context_new_simulated(config.as_ptr(), 0) };
        assert!(!handle.is_null());
        handle
    }

    #[test]
    fn null_handle_is_invalid_parameter() {
        let code = unsafe { ads_show(std::ptr::null_mut(), 0) };
        assert_eq!(code, AdResult::InvalidParameter as i32);
        assert_eq!(unsafe { ads_tick(std::ptr::null_mut()) }, -1);
    }

    #[test]
    fn missing_app_id_creates_no_context() {
        let handle = unsafe { ads_context_new_simulated(std::ptr::null(), 0) };
        assert!(handle.is_null());
    }

    #[test]
    fn banner_loads_through_the_c_abi() {
        let handle = new_handle();
        let unit = CString::new("unit1").unwrap();
        let mut slot = -1;
        let code = unsafe {
            ads_load(handle, AdKind::Banner as i32, unit.as_ptr(), std::ptr::null(), count_loaded, 7, &mut slot)
        };
        assert_eq!(code, 0);
        assert_eq!(slot, 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while LOADED.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            unsafe { ads_tick(handle) };
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(LOADED.load(Ordering::SeqCst), 1);

        let code = unsafe { ads_move_to_position(handle, slot as usize, 42) };
        assert_eq!(code, AdResult::InvalidPosition as i32);
        assert_eq!(unsafe { ads_move_to_point(handle, slot as usize, 10, 20) }, 0);
        unsafe { ads_context_free(handle) };
    }

    #[test]
    fn callback_can_call_back_into_the_handle() {
        let handle = new_handle();
        let unit = c"unit-first";
        let mut slot = -1;
        let code = unsafe {
            ads_load(handle, AdKind::Banner as i32, unit.as_ptr(), std::ptr::null(), reenter, handle as usize, &mut slot)
        };
        assert_eq!(code, 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while (FIRST_UNLOADED.load(Ordering::SeqCst) == 0 || SECOND_LOADED.load(Ordering::SeqCst) == 0)
            && Instant::now() < deadline
        {
            unsafe { ads_tick(handle) };
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(REENTERED.load(Ordering::SeqCst), 1);
        assert_eq!(FIRST_UNLOADED.load(Ordering::SeqCst), 1);
        assert_eq!(SECOND_LOADED.load(Ordering::SeqCst), 1);
        unsafe { ads_context_free(handle) };
    }

    #[test]
    fn move_to_position_checks_id_before_position() {
        let handle = new_handle();
        assert_eq!(unsafe { ads_move_to_position(handle, 5, 42) }, AdResult::InvalidId as i32);
        unsafe { ads_context_free(handle) };
    }

    #[test]
    fn bad_kind_and_request_are_rejected() {
        let handle = new_handle();
        let unit = CString::new("unit9").unwrap();
        let bad_request = CString::new("{\"gender\": 9}").unwrap();
        let mut slot = -1;
        let code = unsafe { ads_load(handle, 3, unit.as_ptr(), std::ptr::null(), ignore, 0, &mut slot) };
        assert_eq!(code, AdResult::InvalidKind as i32);
        let code = unsafe { ads_load(handle, 1, unit.as_ptr(), bad_request.as_ptr(), ignore, 0, &mut slot) };
        assert_eq!(code, AdResult::InvalidParameter as i32);
        assert_eq!(slot, -1);
        assert_eq!(unsafe { ads_unload(handle, 0) }, AdResult::InvalidId as i32);
        unsafe { ads_context_free(handle) };
    }
}
