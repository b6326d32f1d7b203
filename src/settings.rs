//! Field settings and preferences
//!
//! Persisted in LocalStorage on the web; defaults on native.

use serde::{Deserialize, Serialize};

use crate::consts::{DISPLAY_TEXT, REFERENCE_PARTICLES};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
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

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Fraction of the reference particle count used by this preset
    pub fn density(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.5,
            QualityPreset::High => 1.0,
        }
    }

    /// Particle count at the reference resolution
    pub fn reference_particles(&self) -> usize {
        (REFERENCE_PARTICLES as f32 * self.density()) as usize
    }
}

/// Field settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Particle density preset
    pub quality: QualityPreset,
    /// Glow halo on displaced particles
    pub glow: bool,
    /// Log FPS periodically
    pub show_fps: bool,
    /// Reduced motion (suppresses glow)
    pub reduced_motion: bool,
    /// Text the particles settle into
    #[serde(default = "default_text")]
    pub text: String,
}

fn default_text() -> String {
    DISPLAY_TEXT.to_string()
}

/// Value of `key` in a URL query string (`?a=1&b=2`), undecoded
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::High,
            glow: true,
            show_fps: false,
            reduced_motion: false,
            text: default_text(),
        }
    }
}

impl Settings {
    /// Effective glow (respects reduced_motion)
    pub fn effective_glow(&self) -> bool {
        self.glow && !self.reduced_motion
    }

    /// Particle count at the reference resolution
    pub fn reference_particles(&self) -> usize {
        self.quality.reference_particles()
    }

    /// Apply a quality override such as `?quality=low`.
    ///
    /// Returns true if the preset changed and should be persisted.
    pub fn apply_quality(&mut self, value: &str) -> bool {
        match QualityPreset::from_str(value) {
            Some(preset) if preset != self.quality => {
                log::info!("Quality set to {}", preset.as_str());
                self.quality = preset;
                true
            }
            Some(_) => false,
            None => {
                log::warn!("Ignoring unknown quality '{}'", value);
                false
            }
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "glory_particles_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
