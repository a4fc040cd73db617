//! Configuration options for notification dispatch.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::category::CategorySet;
use crate::error::NotifyError;
use crate::mapping::NotificationMapping;

/// Configuration for a provider's notification dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Raise test signals from handlers.
    pub test_mode: bool,

    /// Notification mappings to register.
    pub mappings: Vec<NotificationMapping>,

    /// Default timeout for test signal waits.
    pub signal_timeout: Duration,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            test_mode: false,
            mappings: Vec::new(),
            signal_timeout: Duration::from_secs(10),
        }
    }
}

/// On-disk form of [`NotifyOptions`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    test_mode: bool,
    #[serde(default)]
    signal_timeout_ms: Option<u64>,
    #[serde(default, rename = "mapping")]
    mappings: Vec<NotificationMapping>,
}

impl NotifyOptions {
    /// Options tracking local modifications across the whole root.
    pub fn for_writable() -> Self {
        Self::default().with_mapping(NotificationMapping::root(CategorySet::for_writable()))
    }

    /// Options with no notifications.
    pub fn for_readonly() -> Self {
        Self::default()
    }

    /// Enable or disable test mode.
    ///
    /// # Arguments
    /// * `enabled` - Whether handlers raise test signals
    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    /// Append one mapping.
    ///
    /// # Arguments
    /// * `mapping` - Notification mapping
    pub fn with_mapping(mut self, mapping: NotificationMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Replace all mappings.
    ///
    /// # Arguments
    /// * `mappings` - Notification mappings
    pub fn with_mappings(mut self, mappings: Vec<NotificationMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Set the default test signal timeout.
    ///
    /// # Arguments
    /// * `timeout` - Wait timeout
    pub fn with_signal_timeout(mut self, timeout: Duration) -> Self {
        self.signal_timeout = timeout;
        self
    }

    /// Parse options from TOML.
    ///
    /// ```toml
    /// test_mode = true
    /// signal_timeout_ms = 5000
    ///
    /// [[mapping]]
    /// path = ""
    /// categories = ["FileOpened", "PreDelete"]
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, NotifyError> {
        let raw: RawOptions = toml::from_str(text)?;
        let defaults = Self::default();

        Ok(Self {
            test_mode: raw.test_mode,
            mappings: raw.mappings,
            signal_timeout: raw
                .signal_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.signal_timeout),
        })
    }

    /// Load options from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the options file
    pub fn load(path: &Path) -> Result<Self, NotifyError> {
        let text: String = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
