//! In-process ad SDK
//!
//! Stands in for the vendor SDK on desktop builds and in tests. Two modes:
//! - manual: every completion is parked until [`SimulatedSdk::resolve_next`] (or
//!   [`SimulatedSdk::take_next`], to resolve it from another thread) is called
//! - automatic: completions resolve on a background tokio runtime after the configured delay
//!
//! Views report presentation changes the way a real SDK does: banner show/hide report
//! `VisibleWithAd`/`Hidden`, showing an interstitial reports `CoveringUi`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::ad_request::AdRequestConfig;
use crate::config::SimulatedSdkConfig;
use crate::error::AdError;
use crate::native::{
    AdParent, AdSdk, BannerView, Completion, InterstitialAd, NativeResult, PresentationListener,
};
use crate::runtime_manager::RuntimeManager;
use crate::types::{AdResult, BannerPosition, BannerSize, PresentationState};

/// Asynchronous native operation kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeOp {
    Initialize,
    Load,
    Hide,
}

/// Synchronous calls recorded for assertions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SdkCall {
    Initialize(String),
    Terminate,
    Show(String),
    Hide(String),
    MoveToPosition(String, BannerPosition),
    MoveToPoint(String, i32, i32),
    Pause(String),
    Resume(String),
}

struct ParkedCompletion {
    op: NativeOp,
    ad_unit: String,
    done: Completion,
}

enum Mode {
    Manual,
    Automatic {
        runtime: RuntimeManager,
        config: SimulatedSdkConfig,
    },
}

struct SimState {
    mode: Mode,
    parked: Mutex<VecDeque<ParkedCompletion>>,
    listeners: Mutex<HashMap<String, Arc<dyn PresentationListener>>>,
    calls: Mutex<Vec<SdkCall>>,
    live_banners: AtomicUsize,
    live_interstitials: AtomicUsize,
    terminated: AtomicBool,
}

impl SimState {
    fn record(&self, call: SdkCall) {
        self.calls.lock().push(call);
    }

    fn complete_later(&self, op: NativeOp, ad_unit: &str, done: Completion) {
        match &self.mode {
            Mode::Manual => {
                self.parked.lock().push_back(ParkedCompletion {
                    op,
                    ad_unit: ad_unit.to_string(),
                    done,
                });
            }
            Mode::Automatic { runtime, config } => {
                let code = match op {
                    NativeOp::Initialize => config.initialize_result,
                    NativeOp::Load => config.load_result,
                    NativeOp::Hide => AdResult::None,
                };
                let result = if code.is_success() {
                    NativeResult::success()
                } else {
                    NativeResult::failure(code, format!("simulated {op:?} failure"))
                };
                let delay = config.completion_delay();
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    done(result);
                });
            }
        }
    }

    fn register_listener(&self, ad_unit: &str, listener: Option<Arc<dyn PresentationListener>>) {
        let mut listeners = self.listeners.lock();
        match listener {
            Some(listener) => {
                listeners.insert(ad_unit.to_string(), listener);
            }
            None => {
                listeners.remove(ad_unit);
            }
        }
    }
}

/// Simulated [`AdSdk`]
#[derive(Clone)]
pub struct SimulatedSdk {
    state: Arc<SimState>,
}

impl SimulatedSdk {
    /// SDK whose completions wait for the test to resolve them
    pub fn manual() -> Self {
        Self::with_mode(Mode::Manual)
    }

    /// SDK whose completions resolve by themselves on a background runtime
    pub fn automatic(config: &SimulatedSdkConfig) -> Result<Self, AdError> {
        let runtime = RuntimeManager::new(config.worker_threads)?;
        Ok(Self::with_mode(Mode::Automatic {
            runtime,
            config: config.clone(),
        }))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            state: Arc::new(SimState {
                mode,
                parked: Mutex::new(VecDeque::new()),
                listeners: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                live_banners: AtomicUsize::new(0),
                live_interstitials: AtomicUsize::new(0),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    /// Remove the oldest parked completion of `op`
    pub fn take_next(&self, op: NativeOp) -> Option<Completion> {
        let mut parked = self.state.parked.lock();
        let index = parked.iter().position(|p| p.op == op)?;
        parked.remove(index).map(|p| p.done)
    }

    /// Resolve the oldest parked completion of `op`. Returns false when none is parked.
    pub fn resolve_next(&self, op: NativeOp, result: NativeResult) -> bool {
        // the lock is released before the completion runs
        match self.take_next(op) {
            Some(done) => {
                done(result);
                true
            }
            None => false,
        }
    }

    /// Resolve the oldest parked completion of `op` issued for `ad_unit`
    pub fn resolve_for(&self, ad_unit: &str, op: NativeOp, result: NativeResult) -> bool {
        let done = {
            let mut parked = self.state.parked.lock();
            let index = parked.iter().position(|p| p.op == op && p.ad_unit == ad_unit);
            index.and_then(|index| parked.remove(index))
        };
        match done {
            Some(parked) => {
                (parked.done)(result);
                true
            }
            None => false,
        }
    }

    /// Parked operations in issue order
    pub fn parked_ops(&self) -> Vec<(NativeOp, String)> {
        self.state
            .parked
            .lock()
            .iter()
            .map(|p| (p.op, p.ad_unit.clone()))
            .collect()
    }

    /// Report a presentation change for the ad loaded with `ad_unit`, as a user
    /// interaction would. Returns false when no listener is attached.
    pub fn notify_presentation(&self, ad_unit: &str, state: PresentationState) -> bool {
        let listener = self.state.listeners.lock().get(ad_unit).cloned();
        match listener {
            Some(listener) => {
                listener.on_presentation_state_changed(state);
                true
            }
            None => false,
        }
    }

    pub fn has_listener(&self, ad_unit: &str) -> bool {
        self.state.listeners.lock().contains_key(ad_unit)
    }

    pub fn live_banners(&self) -> usize {
        self.state.live_banners.load(Ordering::SeqCst)
    }

    pub fn live_interstitials(&self) -> usize {
        self.state.live_interstitials.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<SdkCall> {
        self.state.calls.lock().clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.state.terminated.load(Ordering::SeqCst)
    }
}

impl AdSdk for SimulatedSdk {
    fn initialize(&self, app_id: &str) -> Result<(), AdError> {
        tracing::info!(app_id, "simulated ad sdk initialized");
        self.state.record(SdkCall::Initialize(app_id.to_string()));
        Ok(())
    }

    fn terminate(&self) {
        self.state.terminated.store(true, Ordering::SeqCst);
        self.state.parked.lock().clear();
        self.state.listeners.lock().clear();
        self.state.record(SdkCall::Terminate);
    }

    fn create_banner(&self) -> Box<dyn BannerView> {
        self.state.live_banners.fetch_add(1, Ordering::SeqCst);
        Box::new(SimulatedBanner {
            state: self.state.clone(),
            ad_unit: String::new(),
            listener: None,
        })
    }

    fn create_interstitial(&self) -> Box<dyn InterstitialAd> {
        self.state.live_interstitials.fetch_add(1, Ordering::SeqCst);
        Box::new(SimulatedInterstitial {
            state: self.state.clone(),
            ad_unit: String::new(),
            listener: None,
        })
    }
}

// ============================================================================
// Native objects
// ============================================================================

struct SimulatedBanner {
    state: Arc<SimState>,
    ad_unit: String,
    listener: Option<Arc<dyn PresentationListener>>,
}

impl SimulatedBanner {
    fn report(&self, presentation: PresentationState) {
        if let Some(listener) = &self.listener {
            listener.on_presentation_state_changed(presentation);
        }
    }
}

impl BannerView for SimulatedBanner {
    fn initialize(&mut self, _parent: AdParent, ad_unit: &str, _size: BannerSize, done: Completion) {
        self.ad_unit = ad_unit.to_string();
        self.state.complete_later(NativeOp::Initialize, ad_unit, done);
    }

    fn load_ad(&mut self, _request: &AdRequestConfig, done: Completion) {
        self.state.complete_later(NativeOp::Load, &self.ad_unit, done);
    }

    fn show(&mut self) {
        self.state.record(SdkCall::Show(self.ad_unit.clone()));
        self.report(PresentationState::VisibleWithAd);
    }

    fn hide(&mut self, done: Completion) {
        self.state.record(SdkCall::Hide(self.ad_unit.clone()));
        self.report(PresentationState::Hidden);
        self.state.complete_later(NativeOp::Hide, &self.ad_unit, done);
    }

    fn move_to_position(&mut self, position: BannerPosition) {
        self.state.record(SdkCall::MoveToPosition(self.ad_unit.clone(), position));
    }

    fn move_to_point(&mut self, x: i32, y: i32) {
        self.state.record(SdkCall::MoveToPoint(self.ad_unit.clone(), x, y));
    }

    fn pause(&mut self) {
        self.state.record(SdkCall::Pause(self.ad_unit.clone()));
    }

    fn resume(&mut self) {
        self.state.record(SdkCall::Resume(self.ad_unit.clone()));
    }

    fn set_listener(&mut self, listener: Option<Arc<dyn PresentationListener>>) {
        self.state.register_listener(&self.ad_unit, listener.clone());
        self.listener = listener;
    }
}

impl Drop for SimulatedBanner {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.state.register_listener(&self.ad_unit, None);
        }
        self.state.live_banners.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SimulatedInterstitial {
    state: Arc<SimState>,
    ad_unit: String,
    listener: Option<Arc<dyn PresentationListener>>,
}

impl InterstitialAd for SimulatedInterstitial {
    fn initialize(&mut self, _parent: AdParent, ad_unit: &str, done: Completion) {
        self.ad_unit = ad_unit.to_string();
        self.state.complete_later(NativeOp::Initialize, ad_unit, done);
    }

    fn load_ad(&mut self, _request: &AdRequestConfig, done: Completion) {
        self.state.complete_later(NativeOp::Load, &self.ad_unit, done);
    }

    fn show(&mut self) {
        self.state.record(SdkCall::Show(self.ad_unit.clone()));
        if let Some(listener) = &self.listener {
            listener.on_presentation_state_changed(PresentationState::CoveringUi);
        }
    }

    fn set_listener(&mut self, listener: Option<Arc<dyn PresentationListener>>) {
        self.state.register_listener(&self.ad_unit, listener.clone());
        self.listener = listener;
    }
}

impl Drop for SimulatedInterstitial {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.state.register_listener(&self.ad_unit, None);
        }
        self.state.live_interstitials.fetch_sub(1, Ordering::SeqCst);
    }
}
