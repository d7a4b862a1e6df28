//! In-memory platform for native builds and tests

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use super::{AudioSink, Clock, KeyValueStore, Platform, Scheduler, Surface, TimerHandle};
use crate::audio::Tone;
use crate::consts::COUNTER_CONTAINER_SELECTOR;
use crate::error::{EffectError, StorageError};
use crate::features::ConfettiParticle;

/// HashMap-backed storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    read_only: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `(key, value)` pairs
    pub fn with_items<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let storage = Self::new();
        storage.items.borrow_mut().extend(
            items
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        storage
    }

    /// Make every subsequent write fail (simulates a full or blocked store)
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    fn check_writable(&self, key: &str) -> Result<(), StorageError> {
        if self.read_only.get() {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "storage is read-only".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Records what would have been drawn
#[derive(Debug)]
pub struct HeadlessSurface {
    body_classes: RefCell<BTreeSet<String>>,
    counter_html: RefCell<Option<String>>,
    particles: RefCell<Vec<ConfettiParticle>>,
    has_container: Cell<bool>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            body_classes: RefCell::new(BTreeSet::new()),
            counter_html: RefCell::new(None),
            particles: RefCell::new(Vec::new()),
            has_container: Cell::new(true),
        }
    }

    /// Surface whose page lacks the counter container
    pub fn without_container() -> Self {
        let surface = Self::new();
        surface.has_container.set(false);
        surface
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.borrow().contains(class)
    }

    pub fn counter_html(&self) -> Option<String> {
        self.counter_html.borrow().clone()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.borrow().len()
    }
}

impl Surface for HeadlessSurface {
    fn set_body_class(&self, class: &str, enabled: bool) {
        let mut classes = self.body_classes.borrow_mut();
        if enabled {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn render_counter(&self, html: &str) -> Result<(), EffectError> {
        let mut counter = self.counter_html.borrow_mut();
        if counter.is_none() && !self.has_container.get() {
            return Err(EffectError::MissingContainer(COUNTER_CONTAINER_SELECTOR));
        }
        *counter = Some(html.to_string());
        Ok(())
    }

    fn remove_counter(&self) {
        self.counter_html.borrow_mut().take();
    }

    fn spawn_confetti(&self, particle: &ConfettiParticle) {
        self.particles.borrow_mut().push(particle.clone());
    }
}

/// Counts tones instead of playing them
#[derive(Debug, Default)]
pub struct SilentAudio {
    played: RefCell<Vec<Tone>>,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Tone> {
        self.played.borrow().clone()
    }
}

impl AudioSink for SilentAudio {
    fn play_tone(&self, tone: &Tone) {
        log::debug!("tone {} Hz for {} s", tone.frequency, tone.duration);
        self.played.borrow_mut().push(tone.clone());
    }
}

struct RepeatingTask {
    handle: TimerHandle,
    period_ms: u64,
    next_due_ms: u64,
    task: Box<dyn FnMut()>,
}

/// Virtual-time scheduler driven by [`ManualScheduler::advance`]
#[derive(Default)]
pub struct ManualScheduler {
    tasks: RefCell<Vec<RepeatingTask>>,
    /// Handles cancelled while their tasks were out running
    cancelled: RefCell<Vec<TimerHandle>>,
    running: Cell<bool>,
    next_id: Cell<u32>,
    now_ms: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live repeating tasks
    pub fn active(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Move virtual time forward, running every task that comes due
    pub fn advance(&self, ms: u64) {
        let now = self.now_ms.get() + ms;
        self.now_ms.set(now);

        // Tasks run outside the borrow so they may touch the scheduler.
        let mut due = std::mem::take(&mut *self.tasks.borrow_mut());
        self.running.set(true);
        for task in due.iter_mut() {
            while task.next_due_ms <= now && !self.cancelled.borrow().contains(&task.handle) {
                (task.task)();
                task.next_due_ms += task.period_ms;
            }
        }
        self.running.set(false);

        let cancelled = std::mem::take(&mut *self.cancelled.borrow_mut());
        due.retain(|t| !cancelled.contains(&t.handle));
        let mut tasks = self.tasks.borrow_mut();
        due.append(&mut tasks);
        *tasks = due;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = TimerHandle(id);
        let period_ms = u64::from(period_ms.max(1));
        self.tasks.borrow_mut().push(RepeatingTask {
            handle,
            period_ms,
            next_due_ms: self.now_ms.get() + period_ms,
            task,
        });
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.tasks.borrow_mut().retain(|t| t.handle != handle);
        if self.running.get() {
            self.cancelled.borrow_mut().push(handle);
        }
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Concrete handles to every headless collaborator
#[derive(Clone)]
pub struct HeadlessPlatform {
    pub storage: Rc<MemoryStorage>,
    pub surface: Rc<HeadlessSurface>,
    pub audio: Rc<SilentAudio>,
    pub scheduler: Rc<ManualScheduler>,
    pub clock: Rc<FixedClock>,
}

impl HeadlessPlatform {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_storage(MemoryStorage::new(), now)
    }

    pub fn with_storage(storage: MemoryStorage, now: DateTime<Utc>) -> Self {
        Self {
            storage: Rc::new(storage),
            surface: Rc::new(HeadlessSurface::new()),
            audio: Rc::new(SilentAudio::new()),
            scheduler: Rc::new(ManualScheduler::new()),
            clock: Rc::new(FixedClock::new(now)),
        }
    }

    /// Same storage and clock, fresh everything else (a page reload)
    pub fn reload(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            surface: Rc::new(HeadlessSurface::new()),
            audio: Rc::new(SilentAudio::new()),
            scheduler: Rc::new(ManualScheduler::new()),
            clock: self.clock.clone(),
        }
    }

    /// Type-erased view for the core
    pub fn platform(&self) -> Platform {
        Platform {
            storage: self.storage.clone(),
            surface: self.surface.clone(),
            audio: self.audio.clone(),
            scheduler: self.scheduler.clone(),
            clock: self.clock.clone(),
        }
    }
}
