//! Platform abstraction layer
//!
//! The core only talks to the host through these traits:
//! - Storage (LocalStorage on web)
//! - Rendering surface (body classes, counter element, confetti)
//! - Audio (one-shot tones)
//! - Timers (the repeating confetti interval)
//! - Wall clock
//!
//! `headless` backs native builds and tests; `web` backs the wasm32 build.

use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::audio::Tone;
use crate::error::{EffectError, StorageError};
use crate::features::ConfettiParticle;

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Synchronous string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Presentation surface the dispatcher draws on
pub trait Surface {
    /// Add or remove a class on the document body
    fn set_body_class(&self, class: &str, enabled: bool);

    /// Replace the counter display's markup, creating the element if needed
    fn render_counter(&self, html: &str) -> Result<(), EffectError>;

    /// Remove the counter display if present
    fn remove_counter(&self);

    /// Show one confetti particle; the surface owns its delay and removal
    fn spawn_confetti(&self, particle: &ConfettiParticle);
}

/// Fire-and-forget audio output
pub trait AudioSink {
    fn play_tone(&self, tone: &Tone);
}

/// Opaque id of a repeating task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u32);

/// Repeating task scheduler
pub trait Scheduler {
    fn schedule_repeating(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle;
    fn cancel(&self, handle: TimerHandle);
}

/// Wall clock
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Real time from the host (`Date.now()` on wasm32)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Collaborators handed to the dispatcher and the app
#[derive(Clone)]
pub struct Platform {
    pub storage: Rc<dyn KeyValueStore>,
    pub surface: Rc<dyn Surface>,
    pub audio: Rc<dyn AudioSink>,
    pub scheduler: Rc<dyn Scheduler>,
    pub clock: Rc<dyn Clock>,
}
