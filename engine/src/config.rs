use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::fairness::DEFAULT_ALPHA;
use crate::validity::DEFAULT_MIN_EXPECTED;

pub const DEFAULT_PREFS_FILE: &str = "usersettings.dicegraphprefs";

/// User preferences the statistics core depends on. Missing keys fall back
/// to their defaults individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Preferences {
    pub default_faces: u32,
    pub statistical_alpha: f64,
    pub min_expected_per_face: u64,
    pub data_dir: PathBuf,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_faces: 6,
            statistical_alpha: DEFAULT_ALPHA,
            min_expected_per_face: DEFAULT_MIN_EXPECTED,
            data_dir: PathBuf::from("."),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Preferences {
    /// Load from a JSON (default) or YAML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no preferences file; using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read preferences: {}", path.display()))?;
        let prefs: Preferences = if is_yaml(path) {
            serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse preferences YAML: {}", path.display()))?
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse preferences JSON: {}", path.display()))?
        };
        prefs.validate()?;
        Ok(prefs)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let text = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, text)
            .with_context(|| format!("failed to write preferences: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_faces < 2 {
            bail!("default_faces must be at least 2, got {}", self.default_faces);
        }
        if !(self.statistical_alpha > 0.0 && self.statistical_alpha < 1.0) {
            bail!(
                "statistical_alpha must lie strictly between 0 and 1, got {}",
                self.statistical_alpha
            );
        }
        if self.min_expected_per_face == 0 {
            bail!("min_expected_per_face must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"default_faces": 20}"#).unwrap();
        assert_eq!(prefs.default_faces, 20);
        assert_eq!(prefs.statistical_alpha, 0.05);
        assert_eq!(prefs.min_expected_per_face, 5);
    }

    #[test]
    fn unknown_ui_keys_are_ignored() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"dark_mode": true, "window_width": 800}"#).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn rejects_bad_alpha() {
        let prefs = Preferences {
            statistical_alpha: 1.0,
            ..Preferences::default()
        };
        assert!(prefs.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.yaml");
        let prefs = Preferences {
            default_faces: 8,
            statistical_alpha: 0.01,
            ..Preferences::default()
        };
        prefs.save(&path).unwrap();
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn absent_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(&dir.path().join(DEFAULT_PREFS_FILE)).unwrap();
        assert_eq!(prefs, Preferences::default());
    }
}
