use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dedup::DuplicateDetector;
use crate::error::{ResiboError, Result};
use crate::loader::{TableLoader, CANONICAL_HEADERS};

/// Tunables for loading and duplicate detection. Loaded from a JSON file
/// the orchestration layer owns; unknown fields are ignored and missing
/// fields fall back to the shipped defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_window_days")]
    pub duplicate_window_days: i64,
    #[serde(default = "default_fallback_tail")]
    pub duplicate_fallback_tail: usize,
    #[serde(default = "default_similar_threshold")]
    pub similar_merchant_threshold: f64,
    #[serde(default = "default_very_similar_threshold")]
    pub very_similar_merchant_threshold: f64,
    #[serde(default = "default_amount_tolerance")]
    pub close_amount_tolerance: f64,
    #[serde(default = "default_fallback_headers")]
    pub fallback_headers: Vec<String>,
}

fn default_window_days() -> i64 {
    30
}

fn default_fallback_tail() -> usize {
    20
}

fn default_similar_threshold() -> f64 {
    70.0
}

fn default_very_similar_threshold() -> f64 {
    85.0
}

fn default_amount_tolerance() -> f64 {
    2.0
}

fn default_fallback_headers() -> Vec<String> {
    CANONICAL_HEADERS.iter().map(|s| s.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duplicate_window_days: default_window_days(),
            duplicate_fallback_tail: default_fallback_tail(),
            similar_merchant_threshold: default_similar_threshold(),
            very_similar_merchant_threshold: default_very_similar_threshold(),
            close_amount_tolerance: default_amount_tolerance(),
            fallback_headers: default_fallback_headers(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; a missing or unreadable file yields
    /// the defaults.
    pub fn load(path: &Path) -> Settings {
        if path.exists() {
            let content = std::fs::read_to_string(path).unwrap_or_default();
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            Settings::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ResiboError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    pub fn detector(&self) -> DuplicateDetector {
        DuplicateDetector {
            window_days: self.duplicate_window_days,
            fallback_tail: self.duplicate_fallback_tail,
            similar_threshold: self.similar_merchant_threshold,
            very_similar_threshold: self.very_similar_merchant_threshold,
            close_amount_tolerance: self.close_amount_tolerance,
        }
    }

    pub fn loader(&self) -> TableLoader {
        TableLoader::with_fallback_headers(self.fallback_headers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            duplicate_window_days: 14,
            similar_merchant_threshold: 60.0,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded.duplicate_window_days, 14);
        assert_eq!(loaded.similar_merchant_threshold, 60.0);
        assert_eq!(loaded.duplicate_fallback_tail, 20);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let s = Settings::load(Path::new("/does/not/exist.json"));
        assert_eq!(s.duplicate_window_days, 30);
        assert_eq!(s.close_amount_tolerance, 2.0);
        assert_eq!(s.fallback_headers.len(), 8);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"duplicate_window_days": 7}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.duplicate_window_days, 7);
        assert_eq!(s.very_similar_merchant_threshold, 85.0);
    }

    #[test]
    fn test_detector_takes_thresholds() {
        let settings = Settings {
            duplicate_window_days: 7,
            close_amount_tolerance: 5.0,
            ..Settings::default()
        };
        let detector = settings.detector();
        assert_eq!(detector.window_days, 7);
        assert_eq!(detector.close_amount_tolerance, 5.0);
    }
}
