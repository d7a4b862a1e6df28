//! Greeting page wiring
//!
//! Owns the flag store, the feature dispatcher and the greeting cycle, and
//! turns page events into calls on them. This is the composition root; nothing
//! else holds on to the store or the dispatcher.

use crate::config::EffectConfig;
use crate::consts::GREETINGS;
use crate::error::AppError;
use crate::features::FeatureDispatcher;
use crate::flag_store::FlagStore;
use crate::flags::{FeatureFlag, FlagSet};
use crate::platform::Platform;

/// Round-robin over the localized greetings
#[derive(Debug, Clone, Default)]
pub struct GreetingCycle {
    next: usize,
}

impl GreetingCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_greeting(&mut self) -> &'static str {
        let greeting = GREETINGS[self.next];
        self.next = (self.next + 1) % GREETINGS.len();
        greeting
    }
}

pub struct GreetingApp {
    flags: FlagStore,
    features: FeatureDispatcher,
    greetings: GreetingCycle,
}

impl GreetingApp {
    /// Load flags, count the visit and restore persistent effects
    pub fn new(platform: &Platform, config: EffectConfig) -> Result<Self, AppError> {
        let flags = FlagStore::new(platform.storage.clone())?;
        let mut features = FeatureDispatcher::new(platform, config)?;
        features.initialize(&flags.all_flags())?;

        Ok(Self {
            flags,
            features,
            greetings: GreetingCycle::new(),
        })
    }

    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    /// Mutable store access for the debug console
    pub fn flags_mut(&mut self) -> &mut FlagStore {
        &mut self.flags
    }

    pub fn features(&self) -> &FeatureDispatcher {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureDispatcher {
        &mut self.features
    }

    /// Current flags, for initialising the panel checkboxes
    pub fn flag_snapshot(&self) -> FlagSet {
        self.flags.all_flags()
    }

    /// Greeting button clicked: returns the text to show
    pub fn greet(&mut self) -> Result<&'static str, AppError> {
        let greeting = self.greetings.next_greeting();

        if self.flags.is_enabled(FeatureFlag::SoundEffects) {
            self.features.play_click_sound();
        }
        if self.flags.is_enabled(FeatureFlag::ConfettiEffect) {
            self.features.show_confetti();
        }
        if self.flags.is_enabled(FeatureFlag::ShowGreetingCounter) {
            self.features.update_greeting_counter()?;
        }

        Ok(greeting)
    }

    /// Panel checkbox changed.
    ///
    /// Returns `Ok(false)` for names that are not flags; nothing is applied.
    pub fn set_flag(&mut self, name: &str, enabled: bool) -> Result<bool, AppError> {
        let found = if enabled {
            self.flags.enable(name)?
        } else {
            self.flags.disable(name)?
        };

        if let Some(flag) = FeatureFlag::from_name(name).filter(|_| found) {
            self.features.apply(flag, enabled)?;
        }
        Ok(found)
    }

    /// Flip a flag from the console and apply the result
    pub fn toggle_flag(&mut self, name: &str) -> Result<bool, AppError> {
        let Some(flag) = FeatureFlag::from_name(name) else {
            // Let the store log the miss
            return Ok(self.flags.toggle(name)?);
        };
        let enabled = self.flags.toggle_flag(flag)?;
        self.features.apply(flag, enabled)?;
        Ok(enabled)
    }

    /// Reset button: every flag off and every persistent effect undone
    pub fn reset_flags(&mut self) -> Result<(), AppError> {
        self.flags.reset()?;

        self.features.disable_dark_mode();
        self.features.disable_animated_background();
        self.features.hide_greeting_counter();
        self.features.disable_continuous_confetti();

        log::info!("All features reset!");
        Ok(())
    }

    /// Reset-counters button: zero counters, refresh the display if shown
    pub fn reset_counters(&mut self) -> Result<(), AppError> {
        self.features.reset_counters()?;
        if self.flags.is_enabled(FeatureFlag::ShowGreetingCounter) {
            self.features.show_greeting_counter()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EffectError, StorageError};
    use crate::platform::KeyValueStore;
    use crate::platform::headless::{HeadlessPlatform, HeadlessSurface, MemoryStorage};
    use chrono::{DateTime, TimeZone, Utc};
    use std::rc::Rc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn app(rig: &HeadlessPlatform) -> GreetingApp {
        GreetingApp::new(&rig.platform(), EffectConfig::default()).unwrap()
    }

    #[test]
    fn test_greetings_cycle() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        let first = app.greet().unwrap();
        assert_eq!(first, "Hello, World! 🌍");
        for _ in 1..GREETINGS.len() {
            app.greet().unwrap();
        }
        assert_eq!(app.greet().unwrap(), first);
    }

    #[test]
    fn test_greet_with_everything_off() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        app.greet().unwrap();
        assert!(rig.audio.played().is_empty());
        assert_eq!(rig.surface.particle_count(), 0);
        assert_eq!(app.features().counters().greeting_count, 0);
    }

    #[test]
    fn test_greet_runs_enabled_features() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        for flag in ["soundEffects", "confettiEffect", "showGreetingCounter"] {
            assert!(app.set_flag(flag, true).unwrap());
        }
        // Enabling sound and confetti gives a preview
        assert_eq!(rig.audio.played().len(), 1);
        assert_eq!(rig.surface.particle_count(), 50);

        app.greet().unwrap();
        assert_eq!(rig.audio.played().len(), 2);
        assert_eq!(rig.surface.particle_count(), 100);
        assert_eq!(app.features().counters().greeting_count, 1);
        assert!(rig.surface.counter_html().unwrap().contains("Greetings shown: <strong>1</strong>"));
    }

    #[test]
    fn test_startup_restores_effects() {
        let storage = MemoryStorage::with_items([(
            "featureFlags",
            r#"{"darkMode":true,"animatedBackground":true,"showGreetingCounter":true}"#,
        )]);
        let rig = HeadlessPlatform::with_storage(storage, now());
        let _app = app(&rig);
        assert!(rig.surface.has_body_class("dark-mode"));
        assert!(rig.surface.has_body_class("animated-background"));
        assert!(rig.surface.counter_html().unwrap().contains("Site Visits"));
    }

    #[test]
    fn test_set_flag_unknown_name() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        assert!(!app.set_flag("nonExistent", true).unwrap());
        assert_eq!(app.flag_snapshot(), FlagSet::defaults());
    }

    #[test]
    fn test_set_flag_persists_and_applies() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        assert!(app.set_flag("darkMode", true).unwrap());
        assert!(rig.surface.has_body_class("dark-mode"));

        let reloaded = rig.reload();
        let app = GreetingApp::new(&reloaded.platform(), EffectConfig::default()).unwrap();
        assert!(app.flags().is_enabled(FeatureFlag::DarkMode));
        assert!(reloaded.surface.has_body_class("dark-mode"));
    }

    #[test]
    fn test_toggle_flag_applies() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        assert!(app.toggle_flag("animatedBackground").unwrap());
        assert!(rig.surface.has_body_class("animated-background"));
        assert!(!app.toggle_flag("animatedBackground").unwrap());
        assert!(!rig.surface.has_body_class("animated-background"));
        assert!(!app.toggle_flag("nonExistent").unwrap());
    }

    #[test]
    fn test_reset_flags_undoes_effects() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        for flag in FeatureFlag::ALL {
            app.set_flag(flag.as_str(), true).unwrap();
        }
        app.features_mut().enable_continuous_confetti();

        app.reset_flags().unwrap();
        assert_eq!(app.flag_snapshot(), FlagSet::defaults());
        assert!(!rig.surface.has_body_class("dark-mode"));
        assert!(!rig.surface.has_body_class("animated-background"));
        assert!(rig.surface.counter_html().is_none());
        assert!(!app.features().is_confetti_running());
        assert_eq!(rig.scheduler.active(), 0);

        let saved = rig.storage.get("featureFlags").unwrap().unwrap();
        assert_eq!(FlagSet::from_json(&saved).unwrap(), FlagSet::defaults());
    }

    #[test]
    fn test_reset_counters_refreshes_display() {
        let storage = MemoryStorage::with_items([
            ("featureFlags", r#"{"showGreetingCounter":true}"#),
            ("greetingCount", "10"),
            ("visitCount", "19"),
        ]);
        let rig = HeadlessPlatform::with_storage(storage, now());
        let mut app = app(&rig);
        assert!(rig.surface.counter_html().unwrap().contains("Greetings shown: <strong>10</strong>"));

        app.reset_counters().unwrap();
        let html = rig.surface.counter_html().unwrap();
        assert!(html.contains("Greetings shown: <strong>0</strong>"));
        assert!(html.contains("Site Visits: <strong>0</strong>"));
    }

    #[test]
    fn test_storage_failure_is_fatal() {
        let rig = HeadlessPlatform::new(now());
        let mut app = app(&rig);
        rig.storage.set_read_only(true);
        assert!(matches!(
            app.set_flag("darkMode", true),
            Err(AppError::Storage(StorageError::Write { .. }))
        ));
        // Nothing was applied
        assert!(!rig.surface.has_body_class("dark-mode"));
    }

    #[test]
    fn test_counter_without_container_fails_startup() {
        let storage = MemoryStorage::with_items([("featureFlags", r#"{"showGreetingCounter":true}"#)]);
        let rig = HeadlessPlatform {
            surface: Rc::new(HeadlessSurface::without_container()),
            ..HeadlessPlatform::with_storage(storage, now())
        };
        assert!(matches!(
            GreetingApp::new(&rig.platform(), EffectConfig::default()),
            Err(AppError::Effect(EffectError::MissingContainer(_)))
        ));
    }
}
