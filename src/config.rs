use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::error::ConfigError;
use crate::data::time::TimeUnit;

pub const DEFAULT_LABEL_PREFIX: &str = "Label: ";
pub const DEFAULT_SEGMENT_MARKER: &str = "~";
pub const DEFAULT_TIME_SUBSTRING: &str = "time";
pub const DEFAULT_SNAP_WINDOW: usize = 6;

/// Environment variable naming a JSON config file for the app.
pub const CONFIG_ENV_VAR: &str = "RUSTY_PULSE_CONFIG";

// ---------------------------------------------------------------------------
// AnnotationConfig – static lookup tables supplied at startup
// ---------------------------------------------------------------------------

/// Naming conventions and defaults used by the annotation core.
///
/// Every field has a default so a partial JSON file is enough:
///
/// ```json
/// { "heartbeat_classes": ["N", "V"], "time_unit": "milliseconds" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Column-name prefix marking a label column, e.g. `"Label: N"`.
    pub label_prefix: String,
    /// Label names that toggle segment suppression instead of marking points.
    pub segment_markers: BTreeSet<String>,
    /// Label names treated as heartbeats when deriving intervals.
    pub heartbeat_classes: BTreeSet<String>,
    /// Case-insensitive substring identifying a time column.
    pub time_substring: String,
    /// Forces the unit of every time column; detected from the header when `None`.
    pub time_unit: Option<TimeUnit>,
    pub snap_window: usize,
    pub snap_enabled: bool,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            segment_markers: [DEFAULT_SEGMENT_MARKER.to_string()].into(),
            heartbeat_classes: ["N", "S", "V"].map(String::from).into(),
            time_substring: DEFAULT_TIME_SUBSTRING.to_string(),
            time_unit: None,
            snap_window: DEFAULT_SNAP_WINDOW,
            snap_enabled: false,
        }
    }
}

impl AnnotationConfig {
    /// Load a config from a JSON file and validate it.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `RUSTY_PULSE_CONFIG` if set, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("Loading annotation config from {path:?}");
                Self::from_path(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label_prefix.is_empty() {
            return Err(ConfigError::EmptyLabelPrefix);
        }
        if self.snap_window == 0 {
            return Err(ConfigError::ZeroSnapWindow);
        }
        Ok(())
    }

    /// Label name carried by a column header, if it has the label prefix.
    pub fn label_name<'a>(&self, column: &'a str) -> Option<&'a str> {
        column.strip_prefix(self.label_prefix.as_str())
    }

    /// Column header for a label name.
    pub fn label_column(&self, label: &str) -> String {
        format!("{}{label}", self.label_prefix)
    }

    pub fn is_segment_marker(&self, label: &str) -> bool {
        self.segment_markers.contains(label)
    }

    pub fn is_time_column(&self, column: &str) -> bool {
        column
            .to_lowercase()
            .contains(&self.time_substring.to_lowercase())
    }
}
