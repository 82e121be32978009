//! Ad request configuration
//!
//! Targeting parameters captured at load time and kept immutable for the lifetime of the ad.
//! The scripting host passes them as a JSON object whose keys mirror the script table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AdError;
use crate::types::{AdResult, BannerSize, ChildDirectedTreatment, Gender};

/// Ad request targeting and banner sizing
///
/// # Example
/// ```rust
/// use ad_bridge_ffi::AdRequestConfig;
///
/// let request = AdRequestConfig::default()
///     .with_keyword("games")
///     .with_test_device("EMULATOR")
///     .with_extra("color_bg", "AAAAFF");
/// assert_eq!(request.birthday_year, 1970);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdRequestConfig {
    pub birthday_day: i32,
    pub birthday_month: i32,
    pub birthday_year: i32,
    pub gender: Gender,
    pub tagged_for_child_directed_treatment: ChildDirectedTreatment,
    pub keywords: Vec<String>,
    /// Test device identifiers
    #[serde(rename = "testdevices")]
    pub test_devices: Vec<String>,
    pub extras: BTreeMap<String, String>,
    /// Banner width, ignored by interstitials
    pub width: i32,
    /// Banner height, ignored by interstitials
    pub height: i32,
}

impl Default for AdRequestConfig {
    fn default() -> Self {
        let size = BannerSize::default();
        Self {
            birthday_day: 1,
            birthday_month: 1,
            birthday_year: 1970,
            gender: Gender::Unknown,
            tagged_for_child_directed_treatment: ChildDirectedTreatment::NotTagged,
            keywords: Vec::new(),
            test_devices: Vec::new(),
            extras: BTreeMap::new(),
            width: size.width,
            height: size.height,
        }
    }
}

impl AdRequestConfig {
    /// Parse from the host's JSON object. Empty input yields the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AdError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| {
            AdError::with_message(AdResult::InvalidParameter, format!("Invalid ad request: {e}"))
        })
    }

    pub fn banner_size(&self) -> BannerSize {
        BannerSize {
            width: self.width,
            height: self.height,
        }
    }

    pub fn with_birthday(mut self, day: i32, month: i32, year: i32) -> Self {
        self.birthday_day = day;
        self.birthday_month = month;
        self.birthday_year = year;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_child_directed(mut self, state: ChildDirectedTreatment) -> Self {
        self.tagged_for_child_directed_treatment = state;
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn with_test_device(mut self, device_id: impl Into<String>) -> Self {
        self.test_devices.push(device_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_banner_size(mut self, size: BannerSize) -> Self {
        self.width = size.width;
        self.height = size.height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let request = AdRequestConfig::from_json_str("  ").unwrap();
        assert_eq!(request, AdRequestConfig::default());
        assert_eq!((request.birthday_day, request.birthday_month), (1, 1));
        assert_eq!(request.banner_size(), BannerSize { width: 320, height: 100 });
    }

    #[test]
    fn parses_script_table_keys() {
        let json = r#"{
            "birthday_year": 1990,
            "gender": 1,
            "tagged_for_child_directed_treatment": 1,
            "keywords": ["puzzle", "casual"],
            "testdevices": ["EMULATOR"],
            "extras": {"color_bg": "AAAAFF"},
            "width": 468,
            "height": 60
        }"#;
        let request = AdRequestConfig::from_json_str(json).unwrap();
        assert_eq!(request.birthday_year, 1990);
        assert_eq!(request.birthday_day, 1);
        assert_eq!(request.gender, Gender::Female);
        assert_eq!(request.tagged_for_child_directed_treatment, ChildDirectedTreatment::Tagged);
        assert_eq!(request.keywords, vec!["puzzle", "casual"]);
        assert_eq!(request.test_devices, vec!["EMULATOR"]);
        assert_eq!(request.extras.get("color_bg").map(String::as_str), Some("AAAAFF"));
        assert_eq!(request.banner_size(), BannerSize { width: 468, height: 60 });
    }

    #[test]
    fn wrong_types_are_invalid_parameters() {
        let err = AdRequestConfig::from_json_str(r#"{"gender": 9}"#).unwrap_err();
        assert_eq!(err.code(), AdResult::InvalidParameter);

        let err = AdRequestConfig::from_json_str(r#"{"keywords": [1, 2]}"#).unwrap_err();
        assert_eq!(err.code(), AdResult::InvalidParameter);
    }

    #[test]
    fn builder_accumulates_lists() {
        let request = AdRequestConfig::default()
            .with_birthday(3, 4, 2001)
            .with_gender(Gender::Male)
            .with_keyword("a")
            .with_keyword("b")
            .with_extra("k", "v")
            .with_child_directed(ChildDirectedTreatment::Unknown)
            .with_banner_size(BannerSize { width: 728, height: 90 });
        assert_eq!(request.birthday_month, 4);
        assert_eq!(request.tagged_for_child_directed_treatment, ChildDirectedTreatment::Unknown);
        assert_eq!(request.banner_size(), BannerSize { width: 728, height: 90 });
        assert_eq!(request.keywords.len(), 2);
        assert_eq!(request.extras.len(), 1);
    }
}
