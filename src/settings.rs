//! Game settings and preferences
//!
//! Persisted separately from the leaderboards through a `Store`.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_INFECTION_DELAY_MS;
use crate::highscores::DEFAULT_LEADERBOARD_SIZE;
use crate::persistence::{Store, StoreError};
use crate::sim::SimConfig;

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

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (infection bursts, fading lines)
    pub particles: bool,
    /// Reduced motion (no particles)
    pub reduced_motion: bool,

    /// Restrict leaderboard names to A-Z
    pub strict_names: bool,
    /// Entries kept per leaderboard
    pub leaderboard_size: usize,

    /// Delay between game start and the first infection
    pub infection_delay_ms: u32,
    /// Population and pacing
    pub sim: SimConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            reduced_motion: false,
            strict_names: true,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            infection_delay_ms: DEFAULT_INFECTION_DELAY_MS,
            sim: SimConfig::default(),
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "outbreak_settings";

    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Switch preset by name, e.g. from an environment override
    ///
    /// Unknown names leave the current preset in place.
    pub fn override_quality(&mut self, name: &str) -> bool {
        match QualityPreset::parse(name.trim()) {
            Some(preset) => {
                self.quality = preset;
                log::info!("Quality preset overridden to {}", preset.as_str());
                true
            }
            None => {
                log::warn!(
                    "Unknown quality preset {:?}, keeping {}",
                    name,
                    self.quality.as_str()
                );
                false
            }
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Load settings, falling back to defaults on missing or malformed data
    pub fn load<S: Store + ?Sized>(store: &S) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring malformed settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Settings unavailable: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save<S: Store + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.put(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
