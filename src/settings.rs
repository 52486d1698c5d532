//! Simulation settings and presets
//!
//! Persisted as JSON. Missing fields fall back to defaults so older files
//! keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::{CanvasConfig, SpawnerConfig};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum ropes alive at once
    pub fn max_ropes(&self) -> usize {
        match self {
            QualityPreset::Low => 32,
            QualityPreset::Medium => 128,
            QualityPreset::High => 512,
        }
    }

    /// Constraint passes per step (3-6 is plenty for short ropes)
    pub fn solver_iterations(&self) -> u32 {
        match self {
            QualityPreset::Low => 3,
            QualityPreset::Medium => 4,
            QualityPreset::High => 6,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality preset
    pub quality: QualityPreset,

    // === Gore ===
    /// Rope tails paint blood onto the canvas
    pub blood_trails: bool,
    /// Accessibility: suppress blood painting regardless of `blood_trails`
    pub reduced_gore: bool,

    /// Seed for the spawner RNG
    pub seed: u64,
    pub canvas: CanvasConfig,
    pub spawner: SpawnerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            blood_trails: true,
            reduced_gore: false,
            seed: 0x5EED,
            canvas: CanvasConfig::default(),
            spawner: SpawnerConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.spawner.batch.solver_iterations = preset.solver_iterations();
    }

    /// Effective blood trails (respects reduced_gore)
    pub fn effective_trails(&self) -> bool {
        self.blood_trails && !self.reduced_gore
    }

    /// Pool cap for the current preset
    pub fn max_ropes(&self) -> usize {
        self.quality.max_ropes()
    }

    /// Read settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write settings as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from `path` if given, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ReleaseMode;

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "quality": "High", "spawner": { "release": "Inert" } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.spawner.release, ReleaseMode::Inert);
        assert_eq!(settings.spawner.batch, Default::default());
        assert!(settings.blood_trails);
        assert_eq!(settings.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::from_preset(QualityPreset::Low);
        settings.seed = 42;
        settings.spawner.batch.wind = glam::Vec2::new(0.5, 0.0);
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_apply_preset() {
        let settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.spawner.batch.solver_iterations, 6);
        assert_eq!(settings.max_ropes(), 512);
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::Low.as_str(), "Low");
    }

    #[test]
    fn test_reduced_gore_disables_trails() {
        let mut settings = Settings::default();
        assert!(settings.effective_trails());
        settings.reduced_gore = true;
        assert!(!settings.effective_trails());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("verlet-guts-does-not-exist.json");
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
        assert_eq!(Settings::load_or_default(Some(&path)), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("verlet-guts-{}.json", std::process::id()));
        let settings = Settings::from_preset(QualityPreset::Low);
        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = serde_json::from_str::<Settings>("{ \"quality\": 3 }")
            .map_err(SettingsError::from)
            .unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
