//! Native ad lifecycle bridge
//!
//! Manages banner and interstitial ads served by an asynchronous native SDK and reports
//! their lifecycle to a scripting host. Native completions arrive on arbitrary threads;
//! they are turned into commands, queued, and delivered in order from the host's main
//! cycle by [`AdContext::tick`].

pub mod types;
pub mod error;
pub mod ad_request;
pub mod config;
pub mod native;
pub mod command_queue;
pub mod slot_pool;
pub mod completion_bridge;
pub mod deferred_teardown;
pub mod event_protocol;
pub mod ad_context;
mod ad_lifecycle;
pub mod dispatcher;
pub mod runtime_manager;
pub mod simulated_sdk;
pub mod logging;
pub mod ad_ffi;

pub use ad_context::AdContext;
pub use ad_request::AdRequestConfig;
pub use config::{AdsConfig, SimulatedSdkConfig};
pub use dispatcher::PreparedDelivery;
pub use error::AdError;
pub use event_protocol::{AdEventHandler, AdEventInfo, AdEventMessage};
pub use native::{AdParent, AdSdk, BannerView, Completion, InterstitialAd, NativeResult, PresentationListener};
pub use simulated_sdk::{NativeOp, SdkCall, SimulatedSdk};
pub use types::*;
