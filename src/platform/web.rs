//! Browser platform (wasm32)

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element};

use super::{KeyValueStore, Scheduler, Surface, TimerHandle};
use crate::consts::{
    CONFETTI_CLASS, COUNTER_CONTAINER_SELECTOR, COUNTER_ELEMENT_CLASS, COUNTER_ELEMENT_ID,
};
use crate::error::{EffectError, StorageError};
use crate::features::ConfettiParticle;

/// `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, StorageError> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Read {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }
}

/// The live page
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn counter_element(&self) -> Result<Element, EffectError> {
        if let Some(el) = self.document.get_element_by_id(COUNTER_ELEMENT_ID) {
            return Ok(el);
        }

        let container = self
            .document
            .query_selector(COUNTER_CONTAINER_SELECTOR)
            .ok()
            .flatten()
            .ok_or(EffectError::MissingContainer(COUNTER_CONTAINER_SELECTOR))?;
        let el = self
            .document
            .create_element("p")
            .map_err(|e| EffectError::Dom(format!("{e:?}")))?;
        el.set_id(COUNTER_ELEMENT_ID);
        el.set_class_name(COUNTER_ELEMENT_CLASS);
        container
            .append_child(&el)
            .map_err(|e| EffectError::Dom(format!("{e:?}")))?;
        Ok(el)
    }
}

impl Surface for DomSurface {
    fn set_body_class(&self, class: &str, enabled: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let classes = body.class_list();
        let result = if enabled {
            classes.add_1(class)
        } else {
            classes.remove_1(class)
        };
        if let Err(e) = result {
            log::warn!("Failed to update body class {class}: {e:?}");
        }
    }

    fn render_counter(&self, html: &str) -> Result<(), EffectError> {
        self.counter_element()?.set_inner_html(html);
        Ok(())
    }

    fn remove_counter(&self) {
        if let Some(el) = self.document.get_element_by_id(COUNTER_ELEMENT_ID) {
            el.remove();
        }
    }

    fn spawn_confetti(&self, particle: &ConfettiParticle) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let document = self.document.clone();
        let particle = particle.clone();
        let delay_ms = particle.spawn_delay_ms as i32;

        // One-shot callbacks free themselves once called
        let spawn = Closure::once_into_js(move || {
            let Ok(el) = document.create_element("div") else {
                return;
            };
            el.set_class_name(CONFETTI_CLASS);
            let _ = el.set_attribute(
                "style",
                &format!(
                    "left: {:.2}%; background-color: {}; animation-delay: {:.2}s",
                    particle.left_percent, particle.color, particle.animation_delay
                ),
            );
            if let Some(body) = document.body() {
                let _ = body.append_child(&el);
            }

            // Remove after animation
            let remove = Closure::once_into_js(move || el.remove());
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    remove.unchecked_ref(),
                    particle.lifetime_ms as i32,
                );
            }
        });
        let _ = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(spawn.unchecked_ref(), delay_ms);
    }
}

/// `setInterval` with the closures kept alive until cancelled
#[derive(Default)]
pub struct BrowserScheduler {
    intervals: RefCell<HashMap<u32, (i32, Closure<dyn FnMut()>)>>,
    next_id: Cell<u32>,
}

impl BrowserScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule_repeating(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TimerHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = TimerHandle(id);

        let mut task = task;
        let closure = Closure::<dyn FnMut()>::new(move || task());
        let interval = web_sys::window().and_then(|w| {
            w.set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms as i32,
            )
            .ok()
        });

        match interval {
            Some(interval) => {
                self.intervals.borrow_mut().insert(id, (interval, closure));
            }
            None => log::error!("Failed to start interval ({period_ms} ms)"),
        }
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let Some((interval, _closure)) = self.intervals.borrow_mut().remove(&handle.0) else {
            return;
        };
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(interval);
        }
    }
}
