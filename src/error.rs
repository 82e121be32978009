//! Ad Error Types Module
//!
//! Provides a unified error type carrying a result code and an optional detail message.
//! The scripting layer maps known codes to its own messages; the detail message is used
//! when the underlying failure needs more context (bad JSON, unreadable config, ...).

use std::error::Error;
use std::fmt;

use crate::types::AdResult;

// ============================================================================
// AdError Definition
// ============================================================================

/// Ad Error Type
///
/// Contains a result code and optional detailed error information.
#[derive(Clone, PartialEq, Eq)]
pub struct AdError {
    /// Error code
    code: AdResult,
    /// Detailed error message
    message: Option<String>,
}

impl AdError {
    /// Create from error code
    pub fn from_code(code: AdResult) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// Create from error code with a detail message
    pub fn with_message(code: AdResult, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// Get error code
    pub fn code(&self) -> AdResult {
        self.code
    }

    /// Get integer value of error code
    pub fn code_value(&self) -> i32 {
        self.code as i32
    }

    /// Get error message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Debug for AdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("AdError");
        d.field("code", &self.code);
        if let Some(msg) = &self.message {
            d.field("message", msg);
        }
        d.finish()
    }
}

impl fmt::Display for AdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "[{:?}] {}", self.code, msg),
            None => write!(f, "[{:?}]", self.code),
        }
    }
}

impl Error for AdError {}

impl From<AdResult> for AdError {
    fn from(code: AdResult) -> Self {
        Self::from_code(code)
    }
}

// ============================================================================
// Error Type Conversion
// ============================================================================

impl From<std::io::Error> for AdError {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(AdResult::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for AdError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_message(AdResult::ConfigError, err.to_string())
    }
}
