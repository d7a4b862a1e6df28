//! Feature flag store
//!
//! Persisted to LocalStorage under `featureFlags` and written through on every
//! mutation.

use std::rc::Rc;

use crate::consts::FLAGS_KEY;
use crate::error::StorageError;
use crate::flags::{FeatureFlag, FlagSet};
use crate::platform::KeyValueStore;

pub struct FlagStore {
    storage: Rc<dyn KeyValueStore>,
    flags: FlagSet,
}

impl FlagStore {
    /// Open the store, loading whatever flags were saved
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let flags = Self::load(storage.as_ref())?;
        Ok(Self { storage, flags })
    }

    /// Load flags from storage.
    ///
    /// Missing or malformed data yields the defaults; only a failing backend
    /// is an error.
    pub fn load(storage: &dyn KeyValueStore) -> Result<FlagSet, StorageError> {
        let Some(json) = storage.get(FLAGS_KEY)? else {
            log::info!("Using default feature flags");
            return Ok(FlagSet::defaults());
        };

        match FlagSet::from_json(&json) {
            Ok(flags) => {
                log::info!("Loaded {} enabled feature flags", flags.enabled_count());
                Ok(flags)
            }
            Err(e) => {
                log::warn!("Error loading feature flags, using defaults: {e}");
                Ok(FlagSet::defaults())
            }
        }
    }

    fn save(&self) -> Result<(), StorageError> {
        let json = self.flags.to_json()?;
        self.storage.set(FLAGS_KEY, &json)
    }

    pub fn is_enabled(&self, flag: FeatureFlag) -> bool {
        self.flags.get(flag)
    }

    /// Unknown names are simply off
    pub fn is_enabled_by_name(&self, name: &str) -> bool {
        self.flags.get_by_name(name)
    }

    /// Enable a flag by name. `Ok(false)` if no such flag exists.
    pub fn enable(&mut self, name: &str) -> Result<bool, StorageError> {
        let Some(flag) = lookup(name) else {
            return Ok(false);
        };
        self.enable_flag(flag)?;
        Ok(true)
    }

    /// Disable a flag by name. `Ok(false)` if no such flag exists.
    pub fn disable(&mut self, name: &str) -> Result<bool, StorageError> {
        let Some(flag) = lookup(name) else {
            return Ok(false);
        };
        self.disable_flag(flag)?;
        Ok(true)
    }

    /// Flip a flag by name and return its new value (`Ok(false)` if unknown)
    pub fn toggle(&mut self, name: &str) -> Result<bool, StorageError> {
        let Some(flag) = lookup(name) else {
            return Ok(false);
        };
        self.toggle_flag(flag)
    }

    pub fn enable_flag(&mut self, flag: FeatureFlag) -> Result<(), StorageError> {
        self.flags.set(flag, true);
        self.save()?;
        log::info!("Feature \"{flag}\" enabled");
        Ok(())
    }

    pub fn disable_flag(&mut self, flag: FeatureFlag) -> Result<(), StorageError> {
        self.flags.set(flag, false);
        self.save()?;
        log::info!("Feature \"{flag}\" disabled");
        Ok(())
    }

    pub fn toggle_flag(&mut self, flag: FeatureFlag) -> Result<bool, StorageError> {
        let enabled = !self.flags.get(flag);
        self.flags.set(flag, enabled);
        self.save()?;
        log::info!("Feature \"{flag}\" toggled to: {enabled}");
        Ok(enabled)
    }

    /// Copy of every flag, including unknown stored keys
    pub fn all_flags(&self) -> FlagSet {
        self.flags.clone()
    }

    /// Back to defaults, persisted
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.flags = FlagSet::defaults();
        self.save()?;
        log::info!("All feature flags reset to defaults");
        Ok(())
    }
}

fn lookup(name: &str) -> Option<FeatureFlag> {
    let flag = FeatureFlag::from_name(name);
    if flag.is_none() {
        log::warn!("Feature \"{name}\" not found");
    }
    flag
}
