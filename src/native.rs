//! Native ad SDK seam
//!
//! The vendor SDK owns fetching and rendering. It is reached only through these traits;
//! every asynchronous operation reports back through a [`Completion`] that the SDK may
//! invoke from any thread, at any time, at most once.

use std::sync::Arc;

use crate::ad_request::AdRequestConfig;
use crate::error::AdError;
use crate::types::{AdResult, BannerPosition, BannerSize, PresentationState};

/// Outcome of one asynchronous native operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeResult {
    pub code: AdResult,
    pub message: Option<String>,
}

impl NativeResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(code: AdResult, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

/// One-shot continuation handed to the SDK
pub type Completion = Box<dyn FnOnce(NativeResult) + Send + 'static>;

/// Opaque platform window handle ads attach to (activity / root view)
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdParent(pub usize);

/// Receives presentation-state changes of one native ad object
pub trait PresentationListener: Send + Sync {
    fn on_presentation_state_changed(&self, state: PresentationState);
}

/// Process-wide SDK entry point
pub trait AdSdk: Send + Sync {
    /// Initialize the SDK with the application id
    fn initialize(&self, app_id: &str) -> Result<(), AdError>;

    /// Shut the SDK down; no completion fires afterwards
    fn terminate(&self);

    fn create_banner(&self) -> Box<dyn BannerView>;

    fn create_interstitial(&self) -> Box<dyn InterstitialAd>;
}

/// Native banner view
pub trait BannerView: Send {
    fn initialize(&mut self, parent: AdParent, ad_unit: &str, size: BannerSize, done: Completion);

    fn load_ad(&mut self, request: &AdRequestConfig, done: Completion);

    fn show(&mut self);

    /// Hiding is asynchronous; `done` fires once the view is off screen
    fn hide(&mut self, done: Completion);

    fn move_to_position(&mut self, position: BannerPosition);

    fn move_to_point(&mut self, x: i32, y: i32);

    fn pause(&mut self);

    fn resume(&mut self);

    fn set_listener(&mut self, listener: Option<Arc<dyn PresentationListener>>);
}

/// Native full-screen interstitial
pub trait InterstitialAd: Send {
    fn initialize(&mut self, parent: AdParent, ad_unit: &str, done: Completion);

    fn load_ad(&mut self, request: &AdRequestConfig, done: Completion);

    fn show(&mut self);

    fn set_listener(&mut self, listener: Option<Arc<dyn PresentationListener>>);
}
