//! Ad Type Definition Module
//!
//! Defines FFI-friendly result codes, ad kinds, event kinds and banner enums.

use serde::{Deserialize, Serialize};

use crate::error::AdError;

/// Stable pool index handed to the caller
pub type SlotId = usize;

// ============================================================================
// AdResult Error Code
// ============================================================================

/// Ad Operation Result Code
///
/// FFI-friendly result code enumeration for passing operation results across language boundaries.
/// Value design:
/// - 0-99: Native SDK result taxonomy (0 = no error)
/// - 100-199: Errors raised synchronously by this layer
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdResult {
    // ===== Native SDK taxonomy (0-99) =====
    /// No error
    None = 0,
    /// The SDK has not been initialized
    Uninitialized = 1,
    /// The ad object was already initialized
    AlreadyInitialized = 2,
    /// A load is already running for this ad object
    LoadInProgress = 3,
    /// Internal SDK error
    InternalError = 4,
    /// Malformed ad request
    InvalidRequest = 5,
    /// Network failure
    NetworkError = 6,
    /// No ad available for the request
    NoFill = 7,
    /// No window token available to attach the ad to
    NoWindowToken = 8,

    // ===== Local errors (100-199) =====
    /// Every slot of the pool is in use
    TooManyAds = 100,
    /// Slot id out of range or not allocated
    InvalidId = 101,
    /// Unsupported ad kind for load
    InvalidKind = 102,
    /// Operation not supported by this ad kind
    WrongKind = 103,
    /// Ad has not finished loading
    NotInitialized = 104,
    /// Banner position code out of range
    InvalidPosition = 105,
    /// Null pointer or malformed argument at the C boundary
    InvalidParameter = 106,
    /// Configuration error
    ConfigError = 107,
}

impl AdResult {
    /// Check if successful
    pub fn is_success(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Check if the code comes from the native SDK taxonomy
    pub fn is_native(&self) -> bool {
        (0..100).contains(&(*self as i32))
    }

    /// Convert from integer value
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Uninitialized,
            2 => Self::AlreadyInitialized,
            3 => Self::LoadInProgress,
            4 => Self::InternalError,
            5 => Self::InvalidRequest,
            6 => Self::NetworkError,
            7 => Self::NoFill,
            8 => Self::NoWindowToken,

            100 => Self::TooManyAds,
            101 => Self::InvalidId,
            102 => Self::InvalidKind,
            103 => Self::WrongKind,
            104 => Self::NotInitialized,
            105 => Self::InvalidPosition,
            106 => Self::InvalidParameter,
            107 => Self::ConfigError,

            _ => Self::InternalError,
        }
    }
}

impl Default for AdResult {
    fn default() -> Self {
        Self::None
    }
}

// ============================================================================
// Ad kinds and events
// ============================================================================

/// Ad kind stored in a slot; `None` marks a free slot
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AdKind {
    #[default]
    None = 0,
    Banner = 1,
    Interstitial = 2,
    Video = 3,
}

impl AdKind {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Banner),
            2 => Some(Self::Interstitial),
            3 => Some(Self::Video),
            _ => None,
        }
    }

    /// Kinds accepted by load
    pub fn is_loadable(&self) -> bool {
        matches!(self, Self::Banner | Self::Interstitial)
    }
}

/// Event kind delivered to the caller's callback
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdEvent {
    Loaded = 0,
    FailedToLoad = 1,
    Shown = 2,
    Hidden = 3,
    AppLeave = 4,
    Unloaded = 5,
}

/// Per-slot lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdState {
    #[default]
    Empty,
    Initializing,
    Ready,
    FailedToLoad,
    Showing,
    Hidden,
    Unloading,
}

impl AdState {
    /// States in which a banner accepts move requests
    pub fn is_presentable(&self) -> bool {
        matches!(self, Self::Ready | Self::Showing | Self::Hidden)
    }
}

/// Presentation state reported by a native ad object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentationState {
    Hidden,
    VisibleWithoutAd,
    VisibleWithAd,
    OpenedPartialOverlay,
    CoveringUi,
}

// ============================================================================
// Request enums
// ============================================================================

#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Gender {
    #[default]
    Unknown = 0,
    Female = 1,
    Male = 2,
}

impl TryFrom<i32> for Gender {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Female),
            2 => Ok(Self::Male),
            other => Err(format!("invalid gender: {other}")),
        }
    }
}

impl From<Gender> for i32 {
    fn from(value: Gender) -> Self {
        value as i32
    }
}

#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ChildDirectedTreatment {
    #[default]
    NotTagged = 0,
    Tagged = 1,
    Unknown = 2,
}

impl TryFrom<i32> for ChildDirectedTreatment {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotTagged),
            1 => Ok(Self::Tagged),
            2 => Ok(Self::Unknown),
            other => Err(format!("invalid child directed treatment state: {other}")),
        }
    }
}

impl From<ChildDirectedTreatment> for i32 {
    fn from(value: ChildDirectedTreatment) -> Self {
        value as i32
    }
}

// ============================================================================
// Banner placement
// ============================================================================

/// Predefined banner anchor
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerPosition {
    Top = 0,
    Bottom = 1,
    TopLeft = 2,
    TopRight = 3,
    BottomLeft = 4,
    BottomRight = 5,
}

impl TryFrom<i32> for BannerPosition {
    type Error = AdError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Top),
            1 => Ok(Self::Bottom),
            2 => Ok(Self::TopLeft),
            3 => Ok(Self::TopRight),
            4 => Ok(Self::BottomLeft),
            5 => Ok(Self::BottomRight),
            other => Err(AdError::with_message(
                AdResult::InvalidPosition,
                format!("Invalid position: {other}"),
            )),
        }
    }
}

/// Where to move a banner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveTarget {
    Position(BannerPosition),
    Point { x: i32, y: i32 },
}

/// Banner size in density independent pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BannerSize {
    pub width: i32,
    pub height: i32,
}

impl Default for BannerSize {
    fn default() -> Self {
        Self {
            width: 320,
            height: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_round_trip_through_i32() {
        assert_eq!(AdResult::from_i32(7), AdResult::NoFill);
        assert_eq!(AdResult::from_i32(101), AdResult::InvalidId);
        assert_eq!(AdResult::from_i32(9999), AdResult::InternalError);
        assert!(AdResult::NetworkError.is_native());
        assert!(!AdResult::TooManyAds.is_native());
        assert!(AdResult::default().is_success());
    }

    #[test]
    fn only_banner_and_interstitial_are_loadable() {
        assert!(AdKind::Banner.is_loadable());
        assert!(AdKind::Interstitial.is_loadable());
        assert!(!AdKind::Video.is_loadable());
        assert!(!AdKind::None.is_loadable());
        assert_eq!(AdKind::from_i32(4), None);
    }

    #[test]
    fn position_out_of_range_is_rejected() {
        assert_eq!(BannerPosition::try_from(5).unwrap(), BannerPosition::BottomRight);
        let err = BannerPosition::try_from(6).unwrap_err();
        assert_eq!(err.code(), AdResult::InvalidPosition);
        assert!(BannerPosition::try_from(-1).is_err());
    }

    #[test]
    fn result_serializes_as_snake_case() {
        let json = serde_json::to_string(&AdResult::NoFill).unwrap();
        assert_eq!(json, "\"no_fill\"");
        let parsed: AdResult = serde_json::from_str("\"network_error\"").unwrap();
        assert_eq!(parsed, AdResult::NetworkError);
    }
}
