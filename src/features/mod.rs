//! Feature effects driven by the flag store
//!
//! The dispatcher never reads flags itself. Callers decide *whether* an
//! effect should run; the dispatcher only knows *how*.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::config::EffectConfig;
use crate::consts::{ANIMATED_BACKGROUND_CLASS, DARK_MODE_CLASS};
use crate::counters::{CounterState, Counters, format_relative_time};
use crate::error::{EffectError, FeatureError, StorageError};
use crate::flags::{FeatureFlag, FlagSet};
use crate::platform::{AudioSink, Clock, Platform, Scheduler, Surface};

pub mod confetti;
pub mod table;

pub use confetti::{ConfettiCannon, ConfettiLoop, ConfettiParticle};
pub use table::{Effect, EffectPair, EffectTable};

pub struct FeatureDispatcher {
    surface: Rc<dyn Surface>,
    audio: Rc<dyn AudioSink>,
    scheduler: Rc<dyn Scheduler>,
    clock: Rc<dyn Clock>,
    config: EffectConfig,
    counters: Counters,
    cannon: Rc<RefCell<ConfettiCannon>>,
    confetti_loop: ConfettiLoop,
    effects: EffectTable,
}

impl FeatureDispatcher {
    /// Dispatcher with the standard effect table. Counts this page load.
    pub fn new(platform: &Platform, config: EffectConfig) -> Result<Self, FeatureError> {
        Self::with_table(platform, config, EffectTable::standard()?)
    }

    pub fn with_table(
        platform: &Platform,
        config: EffectConfig,
        effects: EffectTable,
    ) -> Result<Self, FeatureError> {
        let counters = Counters::load(platform.storage.clone()).map_err(EffectError::from)?;
        let now = platform.clock.now();
        let cannon = ConfettiCannon::new(now.timestamp_millis() as u64, config.clone());

        let mut dispatcher = Self {
            surface: platform.surface.clone(),
            audio: platform.audio.clone(),
            scheduler: platform.scheduler.clone(),
            clock: platform.clock.clone(),
            config,
            counters,
            cannon: Rc::new(RefCell::new(cannon)),
            confetti_loop: ConfettiLoop::Stopped,
            effects,
        };
        dispatcher.track_visit().map_err(EffectError::from)?;
        Ok(dispatcher)
    }

    // === Dispatch ===

    /// Run the effect registered for `flag` turning on or off
    pub fn apply(&mut self, flag: FeatureFlag, enabled: bool) -> Result<(), EffectError> {
        let effect = self.effects.get(flag).select(enabled);
        effect(self)
    }

    /// Bring persistent visual state in line with the flags at page load.
    ///
    /// Click-driven features (sound, confetti) have nothing to restore.
    pub fn initialize(&mut self, flags: &FlagSet) -> Result<(), EffectError> {
        if flags.get(FeatureFlag::DarkMode) {
            self.enable_dark_mode();
        }
        if flags.get(FeatureFlag::AnimatedBackground) {
            self.enable_animated_background();
        }
        if flags.get(FeatureFlag::ShowGreetingCounter) {
            self.show_greeting_counter()
        } else {
            self.hide_greeting_counter();
            Ok(())
        }
    }

    // === Dark mode ===

    pub fn enable_dark_mode(&self) {
        self.surface.set_body_class(DARK_MODE_CLASS, true);
        log::info!("Dark mode enabled");
    }

    pub fn disable_dark_mode(&self) {
        self.surface.set_body_class(DARK_MODE_CLASS, false);
        log::info!("Dark mode disabled");
    }

    // === Animated background ===

    pub fn enable_animated_background(&self) {
        self.surface.set_body_class(ANIMATED_BACKGROUND_CLASS, true);
        log::info!("Animated background enabled");
    }

    pub fn disable_animated_background(&self) {
        self.surface.set_body_class(ANIMATED_BACKGROUND_CLASS, false);
        log::info!("Animated background disabled");
    }

    // === Confetti ===

    /// Fire one burst; returns the particle count
    pub fn show_confetti(&self) -> usize {
        self.cannon.borrow_mut().fire(self.surface.as_ref())
    }

    /// Burst now and every `confetti_repeat_ms` until disabled
    pub fn enable_continuous_confetti(&mut self) {
        if self.confetti_loop.is_running() {
            return;
        }

        self.show_confetti();

        let cannon = self.cannon.clone();
        let surface = self.surface.clone();
        let handle = self.scheduler.schedule_repeating(
            self.config.confetti_repeat_ms,
            Box::new(move || {
                cannon.borrow_mut().fire(surface.as_ref());
            }),
        );
        self.confetti_loop = ConfettiLoop::Running(handle);
        log::info!("Continuous confetti enabled");
    }

    pub fn disable_continuous_confetti(&mut self) {
        if let ConfettiLoop::Running(handle) = std::mem::take(&mut self.confetti_loop) {
            self.scheduler.cancel(handle);
            log::info!("Continuous confetti disabled");
        }
    }

    pub fn is_confetti_running(&self) -> bool {
        self.confetti_loop.is_running()
    }

    // === Sound ===

    pub fn play_click_sound(&self) {
        self.audio.play_tone(&self.config.click_tone);
    }

    // === Greeting counter ===

    /// Render the counter display, creating it if needed
    pub fn show_greeting_counter(&self) -> Result<(), EffectError> {
        let html = self.counter_html();
        self.surface.render_counter(&html)?;
        log::info!("Greeting counter shown");
        Ok(())
    }

    pub fn hide_greeting_counter(&self) {
        self.surface.remove_counter();
        log::info!("Greeting counter hidden");
    }

    /// Count a greeting, persist, re-render
    pub fn update_greeting_counter(&mut self) -> Result<(), EffectError> {
        self.counters.increment_greeting()?;
        self.show_greeting_counter()
    }

    /// Zero both counters and forget the last visit
    pub fn reset_counters(&mut self) -> Result<(), EffectError> {
        self.counters.reset()?;
        Ok(())
    }

    pub fn counters(&self) -> CounterState {
        self.counters.state()
    }

    pub fn format_relative_time(&self, instant: DateTime<Utc>) -> String {
        format_relative_time(instant, self.clock.now())
    }

    fn track_visit(&mut self) -> Result<u64, StorageError> {
        let now = self.clock.now();
        self.counters.track_visit(now)
    }

    fn counter_html(&self) -> String {
        let state = self.counters.state();
        let mut html = format!(
            "<span class=\"counter-item\">Greetings shown: <strong>{}</strong></span>\
             <span class=\"counter-item\">Site Visits: <strong>{}</strong></span>",
            state.greeting_count, state.visit_count
        );
        if let Some(last_visit) = state.last_visit {
            html.push_str(&format!(
                "<span class=\"counter-item\">Last Visit: <strong>{}</strong></span>",
                self.format_relative_time(last_visit)
            ));
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::KeyValueStore;
    use crate::platform::headless::{HeadlessPlatform, HeadlessSurface, MemoryStorage};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn dispatcher(rig: &HeadlessPlatform) -> FeatureDispatcher {
        FeatureDispatcher::new(&rig.platform(), EffectConfig::default()).unwrap()
    }

    #[test]
    fn test_construction_tracks_visit() {
        let rig = HeadlessPlatform::new(now());
        let features = dispatcher(&rig);
        assert_eq!(features.counters().visit_count, 1);
        assert_eq!(features.counters().last_visit, None);
        assert_eq!(rig.storage.get("visitCount").unwrap().as_deref(), Some("1"));
        assert!(rig.storage.get("lastVisit").unwrap().is_some());

        rig.clock.advance(Duration::hours(3));
        let reloaded = rig.reload();
        let features = dispatcher(&reloaded);
        assert_eq!(features.counters().visit_count, 2);
        assert_eq!(features.counters().last_visit, Some(now()));
    }

    #[test]
    fn test_dark_mode_and_background() {
        let rig = HeadlessPlatform::new(now());
        let features = dispatcher(&rig);

        features.enable_dark_mode();
        features.enable_dark_mode();
        assert!(rig.surface.has_body_class("dark-mode"));
        features.disable_dark_mode();
        assert!(!rig.surface.has_body_class("dark-mode"));

        features.enable_animated_background();
        assert!(rig.surface.has_body_class("animated-background"));
        features.disable_animated_background();
        assert!(!rig.surface.has_body_class("animated-background"));
    }

    #[test]
    fn test_greeting_counter_render_and_hide() {
        let rig = HeadlessPlatform::new(now());
        let features = dispatcher(&rig);

        features.show_greeting_counter().unwrap();
        let html = rig.surface.counter_html().unwrap();
        assert!(html.contains("Site Visits: <strong>1</strong>"));
        assert!(html.contains("Greetings shown: <strong>0</strong>"));
        assert!(!html.contains("Last Visit"));

        features.hide_greeting_counter();
        assert!(rig.surface.counter_html().is_none());
        // Hiding twice is harmless
        features.hide_greeting_counter();
    }

    #[test]
    fn test_counter_shows_previous_visit() {
        let rig = HeadlessPlatform::new(now());
        drop(dispatcher(&rig));
        rig.clock.advance(Duration::minutes(5));

        let reloaded = rig.reload();
        let features = dispatcher(&reloaded);
        features.show_greeting_counter().unwrap();
        let html = reloaded.surface.counter_html().unwrap();
        assert!(html.contains("Last Visit: <strong>5 mins ago</strong>"));
    }

    #[test]
    fn test_update_greeting_counter_is_durable() {
        let rig = HeadlessPlatform::new(now());
        let mut features = dispatcher(&rig);
        for _ in 0..3 {
            features.update_greeting_counter().unwrap();
        }
        assert_eq!(features.counters().greeting_count, 3);
        assert!(rig.surface.counter_html().unwrap().contains("Greetings shown: <strong>3</strong>"));

        let features = dispatcher(&rig.reload());
        assert_eq!(features.counters().greeting_count, 3);
    }

    #[test]
    fn test_missing_container_is_an_error() {
        let rig = HeadlessPlatform {
            surface: Rc::new(HeadlessSurface::without_container()),
            ..HeadlessPlatform::new(now())
        };
        let mut features = dispatcher(&rig);
        assert!(matches!(
            features.show_greeting_counter(),
            Err(EffectError::MissingContainer(".container"))
        ));
        // The increment is persisted before the render fails
        assert!(features.update_greeting_counter().is_err());
        assert_eq!(rig.storage.get("greetingCount").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_reset_counters() {
        let storage = MemoryStorage::with_items([("greetingCount", "10"), ("visitCount", "19")]);
        let rig = HeadlessPlatform::with_storage(storage, now());
        let mut features = dispatcher(&rig);
        assert_eq!(features.counters().greeting_count, 10);
        assert_eq!(features.counters().visit_count, 20);

        features.reset_counters().unwrap();
        assert_eq!(features.counters(), CounterState::default());
        assert_eq!(rig.storage.get("greetingCount").unwrap().as_deref(), Some("0"));
        assert_eq!(rig.storage.get("visitCount").unwrap().as_deref(), Some("0"));
        assert_eq!(rig.storage.get("lastVisit").unwrap(), None);
    }

    #[test]
    fn test_startup_with_maxed_visit_count() {
        let max = u64::MAX.to_string();
        let storage = MemoryStorage::with_items([("visitCount", max.as_str())]);
        let rig = HeadlessPlatform::with_storage(storage, now());
        let features = dispatcher(&rig);
        assert_eq!(features.counters().visit_count, u64::MAX);
        assert_eq!(rig.storage.get("visitCount").unwrap(), Some(max));
    }

    #[test]
    fn test_show_confetti_fires_one_burst() {
        let rig = HeadlessPlatform::new(now());
        let features = dispatcher(&rig);
        assert_eq!(features.show_confetti(), 50);
        assert_eq!(rig.surface.particle_count(), 50);
        assert_eq!(rig.scheduler.active(), 0);
    }

    #[test]
    fn test_continuous_confetti_single_timer() {
        let rig = HeadlessPlatform::new(now());
        let mut features = dispatcher(&rig);

        features.enable_continuous_confetti();
        features.enable_continuous_confetti();
        assert!(features.is_confetti_running());
        assert_eq!(rig.scheduler.active(), 1);
        // Only the initial burst so far
        assert_eq!(rig.surface.particle_count(), 50);

        rig.scheduler.advance(5000);
        assert_eq!(rig.surface.particle_count(), 100);
        rig.scheduler.advance(10_000);
        assert_eq!(rig.surface.particle_count(), 200);

        features.disable_continuous_confetti();
        assert!(!features.is_confetti_running());
        assert_eq!(rig.scheduler.active(), 0);
        rig.scheduler.advance(10_000);
        assert_eq!(rig.surface.particle_count(), 200);

        features.disable_continuous_confetti();
        assert_eq!(rig.scheduler.active(), 0);
    }

    #[test]
    fn test_click_sound() {
        let rig = HeadlessPlatform::new(now());
        let features = dispatcher(&rig);
        features.play_click_sound();
        let played = rig.audio.played();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].frequency, 800.0);
    }

    #[test]
    fn test_apply_uses_table() {
        let rig = HeadlessPlatform::new(now());
        let mut features = dispatcher(&rig);

        features.apply(FeatureFlag::DarkMode, true).unwrap();
        assert!(rig.surface.has_body_class("dark-mode"));
        features.apply(FeatureFlag::ShowGreetingCounter, true).unwrap();
        assert!(rig.surface.counter_html().is_some());
        features.apply(FeatureFlag::ConfettiEffect, true).unwrap();
        assert_eq!(rig.surface.particle_count(), 50);
        features.apply(FeatureFlag::SoundEffects, true).unwrap();
        assert_eq!(rig.audio.played().len(), 1);

        features.apply(FeatureFlag::DarkMode, false).unwrap();
        features.apply(FeatureFlag::ShowGreetingCounter, false).unwrap();
        features.apply(FeatureFlag::SoundEffects, false).unwrap();
        assert!(!rig.surface.has_body_class("dark-mode"));
        assert!(rig.surface.counter_html().is_none());
        assert_eq!(rig.audio.played().len(), 1);
    }

    #[test]
    fn test_apply_confetti_off_stops_loop() {
        let rig = HeadlessPlatform::new(now());
        let mut features = dispatcher(&rig);
        features.enable_continuous_confetti();
        features.apply(FeatureFlag::ConfettiEffect, false).unwrap();
        assert!(!features.is_confetti_running());
    }

    #[test]
    fn test_initialize_from_flags() {
        let rig = HeadlessPlatform::new(now());
        let mut features = dispatcher(&rig);
        let mut flags = FlagSet::defaults();
        flags.set(FeatureFlag::DarkMode, true);
        flags.set(FeatureFlag::ShowGreetingCounter, true);

        features.initialize(&flags).unwrap();
        assert!(rig.surface.has_body_class("dark-mode"));
        assert!(!rig.surface.has_body_class("animated-background"));
        assert!(rig.surface.counter_html().is_some());

        features.initialize(&FlagSet::defaults()).unwrap();
        assert!(rig.surface.counter_html().is_none());
    }

    #[test]
    fn test_custom_table() {
        let rig = HeadlessPlatform::new(now());
        let entries: Vec<_> = FeatureFlag::ALL
            .iter()
            .map(|f| (*f, EffectPair::new(|d| d.update_greeting_counter(), |_| Ok(()))))
            .collect();
        let table = EffectTable::from_entries(&entries).unwrap();
        let mut features =
            FeatureDispatcher::with_table(&rig.platform(), EffectConfig::default(), table)
                .unwrap();
        features.apply(FeatureFlag::DarkMode, true).unwrap();
        assert_eq!(features.counters().greeting_count, 1);
        assert!(!rig.surface.has_body_class("dark-mode"));
    }
}
