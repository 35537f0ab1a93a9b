//! Review configuration
//!
//! Defaults, optionally overlaid by a TOML file, then by `REVIEW_*`
//! environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `REVIEW_GENERATOR_URL` | `identity.generator_url` |
//! | `REVIEW_REQUEST_TIMEOUT_SECS` | `identity.request_timeout_secs` |
//! | `REVIEW_STORAGE_KEY` | `identity.storage_key` |
//! | `REVIEW_STORAGE_PATH` | `identity.storage_path` |
//! | `REVIEW_ESCALATION_COLLECTION` | `escalation.collection` |
//! | `REVIEW_ROUTE_TARGET` | `escalation.default_route_target` |
//! | `REVIEW_TRIGGER_LEVEL` | `escalation.trigger_level` |
//! | `REVIEW_ESCALATE_AT_LEVEL` | `escalation.escalate_at_level` |
//! | `REVIEW_BLUR_THRESHOLD` | `quality.blur_threshold` |
//! | `REVIEW_MAX_ROTATION` | `quality.max_rotation` |
//! | `REVIEW_ROTATION_CUTOFF` | `quality.projection_rotation_cutoff` |
//! | `REVIEW_POOR_BELOW` | `quality.poor_below` |
//! | `REVIEW_FAIR_BELOW` | `quality.fair_below` |
//!
//! Unparseable numeric values are ignored with a warning.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::escalation::EscalationConfig;
use crate::identity::IdentityConfig;
use crate::quality::QualityThresholds;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Inconsistent quality thresholds: {reason}")]
    InconsistentThresholds { reason: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub identity: IdentityConfig,
    pub escalation: EscalationConfig,
    pub quality: QualityThresholds,
}

impl ReviewConfig {
    /// Defaults overlaid with `REVIEW_*` variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a TOML file. Missing sections and fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.quality.inconsistency() {
            Some(reason) => Err(ConfigError::InconsistentThresholds { reason }),
            None => Ok(()),
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Overlay values from `lookup`, keyed by variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let id = &mut self.identity;
        if let Some(v) = lookup("REVIEW_GENERATOR_URL") {
            id.generator_url = v;
        }
        set_parsed(&lookup, "REVIEW_REQUEST_TIMEOUT_SECS", &mut id.request_timeout_secs);
        if let Some(v) = lookup("REVIEW_STORAGE_KEY") {
            id.storage_key = v;
        }
        if let Some(v) = lookup("REVIEW_STORAGE_PATH") {
            id.storage_path = PathBuf::from(v);
        }

        let esc = &mut self.escalation;
        if let Some(v) = lookup("REVIEW_ESCALATION_COLLECTION") {
            esc.collection = v;
        }
        if let Some(v) = lookup("REVIEW_ROUTE_TARGET") {
            esc.default_route_target = v;
        }
        set_parsed(&lookup, "REVIEW_TRIGGER_LEVEL", &mut esc.trigger_level);
        set_parsed(&lookup, "REVIEW_ESCALATE_AT_LEVEL", &mut esc.escalate_at_level);

        let q = &mut self.quality;
        set_parsed(&lookup, "REVIEW_BLUR_THRESHOLD", &mut q.blur_threshold);
        set_parsed(&lookup, "REVIEW_MAX_ROTATION", &mut q.max_rotation);
        set_parsed(&lookup, "REVIEW_ROTATION_CUTOFF", &mut q.projection_rotation_cutoff);
        set_parsed(&lookup, "REVIEW_POOR_BELOW", &mut q.poor_below);
        set_parsed(&lookup, "REVIEW_FAIR_BELOW", &mut q.fair_below);
    }
}

fn set_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str, slot: &mut T) {
    let Some(raw) = lookup(var) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(var, value = %raw, "Ignoring unparseable config override"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReviewConfig::default();
        assert_eq!(config.identity.storage_key, "RPR_ACTIVE_PROJECT_ID");
        assert_eq!(config.escalation.collection, "escalations");
        assert_eq!(config.escalation.trigger_level, 2);
        assert_eq!(config.quality.poor_below, 50);
        assert_eq!(config.quality.fair_below, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = ReviewConfig::default();
        config.apply_overrides(lookup(&[
            ("REVIEW_GENERATOR_URL", "http://ids.internal/generate"),
            ("REVIEW_REQUEST_TIMEOUT_SECS", "5"),
            ("REVIEW_ROUTE_TARGET", "/queue"),
            ("REVIEW_ESCALATE_AT_LEVEL", "3"),
            ("REVIEW_ROTATION_CUTOFF", "2.5"),
        ]));

        assert_eq!(config.identity.generator_url, "http://ids.internal/generate");
        assert_eq!(config.identity.request_timeout_secs, 5);
        assert_eq!(config.escalation.default_route_target, "/queue");
        assert_eq!(config.escalation.escalate_at_level, 3);
        assert_eq!(config.quality.projection_rotation_cutoff, 2.5);
    }

    #[test]
    fn test_bad_number_is_ignored() {
        let mut config = ReviewConfig::default();
        config.apply_overrides(lookup(&[
            ("REVIEW_TRIGGER_LEVEL", "high"),
            ("REVIEW_POOR_BELOW", "-1"),
        ]));
        assert_eq!(config.escalation.trigger_level, 2);
        assert_eq!(config.quality.poor_below, 50);
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.toml");
        std::fs::write(
            &path,
            r#"
[identity]
storage_path = "/var/lib/review/identity.json"

[quality]
fair_below = 85
"#,
        )
        .unwrap();

        let config = ReviewConfig::load(&path).unwrap();
        assert_eq!(
            config.identity.storage_path,
            PathBuf::from("/var/lib/review/identity.json")
        );
        assert_eq!(config.identity.storage_key, "RPR_ACTIVE_PROJECT_ID");
        assert_eq!(config.quality.fair_below, 85);
        assert_eq!(config.quality.poor_below, 50);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ReviewConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[quality\n").unwrap();
        assert!(matches!(ReviewConfig::load(&bad), Err(ConfigError::Parse { .. })));

        let inverted = dir.path().join("inverted.toml");
        std::fs::write(&inverted, "[quality]\npoor_below = 90\nfair_below = 60\n").unwrap();
        assert!(matches!(
            ReviewConfig::load(&inverted),
            Err(ConfigError::InconsistentThresholds { .. })
        ));
    }

    #[test]
    fn test_threshold_error_names_the_broken_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("over.toml");
        std::fs::write(&path, "[quality]\nfair_below = 150\n").unwrap();
        let err = ReviewConfig::load(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Inconsistent quality thresholds: fair_below must not exceed 100"
        );

        let mut config = ReviewConfig::default();
        config.quality.blur_threshold = -5.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blur_threshold"));
        assert!(!err.to_string().contains("poor_below"));
    }
}
