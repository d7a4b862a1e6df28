//! Effect tuning
//!
//! Plain data with sensible defaults, loadable from JSON so a page can tweak
//! effects without a rebuild.

use serde::{Deserialize, Serialize};

use crate::audio::Tone;

/// Confetti and sound parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    // === Confetti ===
    /// Particles per burst
    pub confetti_count: usize,
    /// Delay between consecutive particles (ms)
    pub confetti_stagger_ms: u32,
    /// How long a particle stays on screen (ms)
    pub confetti_lifetime_ms: u32,
    /// Upper bound of the random CSS animation delay (s)
    pub confetti_max_animation_delay: f32,
    /// Period of continuous confetti (ms)
    pub confetti_repeat_ms: u32,
    /// Particle colours (CSS)
    pub confetti_palette: Vec<String>,

    // === Sound ===
    /// Tone played on each greeting click
    pub click_tone: Tone,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            confetti_count: 50,
            confetti_stagger_ms: 30,
            confetti_lifetime_ms: 3000,
            confetti_max_animation_delay: 0.5,
            confetti_repeat_ms: 5000,
            confetti_palette: ["#667eea", "#764ba2", "#f093fb", "#4facfe", "#43e97b"]
                .into_iter()
                .map(String::from)
                .collect(),
            click_tone: Tone::default(),
        }
    }
}

impl EffectConfig {
    /// Parse JSON, falling back to defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Page-supplied overrides, if any. Unparsable JSON is logged and ignored.
    pub fn from_page(json: Option<&str>) -> Self {
        let Some(json) = json.map(str::trim).filter(|j| !j.is_empty()) else {
            return Self::default();
        };
        match Self::from_json(json) {
            Ok(config) => {
                log::info!("Loaded effect config from page");
                config
            }
            Err(e) => {
                log::warn!("Error parsing effect config, using defaults: {e}");
                Self::default()
            }
        }
    }
}
