//! Feature flag names and the flag set
//!
//! Flags are persisted as a flat JSON object in LocalStorage. The set of known
//! flags is closed; names read back from storage or the admin panel go through
//! [`FeatureFlag::from_name`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Known feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureFlag {
    DarkMode,
    ConfettiEffect,
    SoundEffects,
    AnimatedBackground,
    ShowGreetingCounter,
}

impl FeatureFlag {
    pub const COUNT: usize = 5;

    /// Every flag, in panel order
    pub const ALL: [FeatureFlag; Self::COUNT] = [
        FeatureFlag::DarkMode,
        FeatureFlag::ConfettiEffect,
        FeatureFlag::SoundEffects,
        FeatureFlag::AnimatedBackground,
        FeatureFlag::ShowGreetingCounter,
    ];

    /// Name used in storage and in the panel's `data-flag` attributes
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureFlag::DarkMode => "darkMode",
            FeatureFlag::ConfettiEffect => "confettiEffect",
            FeatureFlag::SoundEffects => "soundEffects",
            FeatureFlag::AnimatedBackground => "animatedBackground",
            FeatureFlag::ShowGreetingCounter => "showGreetingCounter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.as_str() == name)
    }

    /// Position in [`FeatureFlag::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag name to enabled state.
///
/// Always contains every [`FeatureFlag`]. Keys from older stored versions that
/// are not known flags are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet {
    values: BTreeMap<String, bool>,
}

impl Default for FlagSet {
    fn default() -> Self {
        Self {
            values: FeatureFlag::ALL
                .iter()
                .map(|flag| (flag.as_str().to_string(), false))
                .collect(),
        }
    }
}

impl FlagSet {
    /// Built-in defaults (everything off)
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Parse stored JSON and lay it over the defaults.
    ///
    /// Only a flat object of booleans is accepted.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: BTreeMap<String, bool> = serde_json::from_str(json)?;
        Ok(Self::defaults().merged_with(parsed))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Shallow override: parsed values win, unknown keys are kept
    pub fn merged_with(mut self, overrides: BTreeMap<String, bool>) -> Self {
        self.values.extend(overrides);
        self
    }

    pub fn get(&self, flag: FeatureFlag) -> bool {
        self.get_by_name(flag.as_str())
    }

    pub fn get_by_name(&self, name: &str) -> bool {
        self.values.get(name).copied().unwrap_or(false)
    }

    pub fn set(&mut self, flag: FeatureFlag, enabled: bool) {
        self.values.insert(flag.as_str().to_string(), enabled);
    }

    /// Known flags with their values, in panel order
    pub fn known(&self) -> impl Iterator<Item = (FeatureFlag, bool)> + '_ {
        FeatureFlag::ALL.into_iter().map(|flag| (flag, self.get(flag)))
    }

    /// Stored keys that are not known flags
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|name| FeatureFlag::from_name(name).is_none())
    }

    /// Number of enabled known flags
    pub fn enabled_count(&self) -> usize {
        self.known().filter(|(_, enabled)| *enabled).count()
    }
}
