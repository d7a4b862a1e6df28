//! Greeting and visit counters
//!
//! Persisted to LocalStorage as individual keys so they survive flag resets.

use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::consts::{GREETING_COUNT_KEY, LAST_VISIT_KEY, VISIT_COUNT_KEY};
use crate::error::StorageError;
use crate::platform::KeyValueStore;

/// Counter values as seen by this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterState {
    /// Greeting clicks while the counter feature was on
    pub greeting_count: u64,
    /// Page loads, including this one once tracked
    pub visit_count: u64,
    /// When the previous session started, if there was one
    pub last_visit: Option<DateTime<Utc>>,
}

/// Counter state plus write-through persistence
pub struct Counters {
    storage: Rc<dyn KeyValueStore>,
    state: CounterState,
}

impl Counters {
    /// Read all counters from storage. Garbage reads as zero / absent.
    pub fn load(storage: Rc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let greeting_count = read_count(storage.as_ref(), GREETING_COUNT_KEY)?;
        let visit_count = read_count(storage.as_ref(), VISIT_COUNT_KEY)?;
        let last_visit = read_timestamp(storage.as_ref(), LAST_VISIT_KEY)?;
        Ok(Self {
            storage,
            state: CounterState {
                greeting_count,
                visit_count,
                last_visit,
            },
        })
    }

    pub fn state(&self) -> CounterState {
        self.state
    }

    pub fn greeting_count(&self) -> u64 {
        self.state.greeting_count
    }

    pub fn visit_count(&self) -> u64 {
        self.state.visit_count
    }

    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        self.state.last_visit
    }

    /// Count one greeting and persist it
    pub fn increment_greeting(&mut self) -> Result<u64, StorageError> {
        self.state.greeting_count = self.state.greeting_count.saturating_add(1);
        self.save_greeting_count()?;
        Ok(self.state.greeting_count)
    }

    /// Record this page load.
    ///
    /// `now` is persisted for the next session; the in-memory `last_visit`
    /// keeps pointing at the previous one.
    pub fn track_visit(&mut self, now: DateTime<Utc>) -> Result<u64, StorageError> {
        self.state.visit_count = self.state.visit_count.saturating_add(1);
        self.save_visit_count()?;
        self.storage.set(
            LAST_VISIT_KEY,
            &now.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        log::info!("Visit #{} tracked", self.state.visit_count);
        Ok(self.state.visit_count)
    }

    /// Zero both counters and forget the last visit
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.state = CounterState::default();
        self.save_greeting_count()?;
        self.save_visit_count()?;
        self.storage.remove(LAST_VISIT_KEY)?;
        log::info!("Counters reset");
        Ok(())
    }

    fn save_greeting_count(&self) -> Result<(), StorageError> {
        self.storage
            .set(GREETING_COUNT_KEY, &self.state.greeting_count.to_string())
    }

    fn save_visit_count(&self) -> Result<(), StorageError> {
        self.storage
            .set(VISIT_COUNT_KEY, &self.state.visit_count.to_string())
    }
}

fn read_count(storage: &dyn KeyValueStore, key: &str) -> Result<u64, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(0);
    };
    match raw.trim().parse::<u64>() {
        Ok(count) => Ok(count),
        Err(e) => {
            log::warn!("Ignoring stored {key} {raw:?}: {e}");
            Ok(0)
        }
    }
}

fn read_timestamp(
    storage: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => Ok(Some(ts.with_timezone(&Utc))),
        Err(e) => {
            log::warn!("Ignoring stored {key} {raw:?}: {e}");
            Ok(None)
        }
    }
}

/// Format a timestamp relative to `now`
///
/// Future instants read as "Just now"; anything a week or older falls back to
/// a `M/D/YYYY` date.
pub fn format_relative_time(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - instant;
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        plural(mins, "min")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        instant.format("%-m/%-d/%Y").to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
