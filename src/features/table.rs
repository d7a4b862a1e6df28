//! Flag to effect lookup table

use super::FeatureDispatcher;
use crate::error::{EffectError, FeatureError};
use crate::flags::FeatureFlag;

/// A side effect run against the dispatcher
pub type Effect = fn(&mut FeatureDispatcher) -> Result<(), EffectError>;

/// What to do when a flag turns on and off
#[derive(Clone, Copy)]
pub struct EffectPair {
    pub enable: Effect,
    pub disable: Effect,
}

impl EffectPair {
    pub fn new(enable: Effect, disable: Effect) -> Self {
        Self { enable, disable }
    }

    pub fn select(&self, enabled: bool) -> Effect {
        if enabled { self.enable } else { self.disable }
    }
}

/// One [`EffectPair`] per [`FeatureFlag`], checked for completeness on build
#[derive(Clone)]
pub struct EffectTable {
    pairs: Vec<EffectPair>,
}

impl EffectTable {
    /// Build from `(flag, pair)` entries.
    ///
    /// Every flag needs exactly one entry.
    pub fn from_entries(entries: &[(FeatureFlag, EffectPair)]) -> Result<Self, FeatureError> {
        let mut slots: [Option<EffectPair>; FeatureFlag::COUNT] = [None; FeatureFlag::COUNT];
        for (flag, pair) in entries {
            if slots[flag.index()].replace(*pair).is_some() {
                return Err(FeatureError::DuplicateEffect(*flag));
            }
        }

        let pairs = FeatureFlag::ALL
            .iter()
            .map(|flag| slots[flag.index()].ok_or(FeatureError::MissingEffect(*flag)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pairs })
    }

    /// The effects the greeting page uses
    pub fn standard() -> Result<Self, FeatureError> {
        Self::from_entries(&[
            (
                FeatureFlag::DarkMode,
                EffectPair::new(
                    |d| {
                        d.enable_dark_mode();
                        Ok(())
                    },
                    |d| {
                        d.disable_dark_mode();
                        Ok(())
                    },
                ),
            ),
            (
                FeatureFlag::AnimatedBackground,
                EffectPair::new(
                    |d| {
                        d.enable_animated_background();
                        Ok(())
                    },
                    |d| {
                        d.disable_animated_background();
                        Ok(())
                    },
                ),
            ),
            (
                FeatureFlag::ShowGreetingCounter,
                EffectPair::new(
                    |d| d.show_greeting_counter(),
                    |d| {
                        d.hide_greeting_counter();
                        Ok(())
                    },
                ),
            ),
            (
                FeatureFlag::ConfettiEffect,
                EffectPair::new(
                    |d| {
                        d.show_confetti();
                        Ok(())
                    },
                    |d| {
                        d.disable_continuous_confetti();
                        Ok(())
                    },
                ),
            ),
            (
                FeatureFlag::SoundEffects,
                // Nothing to undo: tones are one-shot
                EffectPair::new(
                    |d| {
                        d.play_click_sound();
                        Ok(())
                    },
                    |_| Ok(()),
                ),
            ),
        ])
    }

    pub fn get(&self, flag: FeatureFlag) -> EffectPair {
        self.pairs[flag.index()]
    }
}
