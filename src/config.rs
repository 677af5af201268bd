//! Editor configuration.
//!
//! The host loads this once and passes it by reference into every
//! operation that needs a snapping threshold or ledger-line allowance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EditError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pixel slack around a staff (or measure box) that still counts as a hit
    pub snap_threshold: u32,
    /// Ledger lines considered above and below the five-line staff
    pub extra_ledger_lines: usize,
    /// Measures per staff in a freshly created score
    pub default_measure_count: usize,
    /// Removing measures stops at this count
    pub min_measure_count: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 5,
            extra_ledger_lines: 2,
            default_measure_count: 4,
            min_measure_count: 1,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, EditError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EditError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), EditError> {
        if self.default_measure_count == 0 {
            return Err(EditError::InvalidConfig(
                "default_measure_count must be at least 1".into(),
            ));
        }
        if self.min_measure_count > self.default_measure_count {
            return Err(EditError::InvalidConfig(format!(
                "min_measure_count ({}) exceeds default_measure_count ({})",
                self.min_measure_count, self.default_measure_count
            )));
        }
        Ok(())
    }

    /// Number of half-line positions above the top staff line.
    pub fn ledger_positions(&self) -> isize {
        2 * self.extra_ledger_lines as isize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "snap_threshold": 8 }"#).unwrap();
        assert_eq!(config.snap_threshold, 8);
        assert_eq!(config.extra_ledger_lines, 2);
        assert_eq!(config.default_measure_count, 4);
    }

    #[test]
    fn min_above_default_is_rejected() {
        let err = EditorConfig::from_json_str(
            r#"{ "default_measure_count": 2, "min_measure_count": 3 }"#,
        )
        .unwrap_err();
        assert!(matches!(err, EditError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = EditorConfig::from_json_str("{ snap_threshold: ").unwrap_err();
        assert!(matches!(err, EditError::Json(_)));
    }
}
