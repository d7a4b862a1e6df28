//! Hello Flags entry point
//!
//! Wires the page's buttons and flag panel to the core on wasm32; runs a
//! headless walkthrough natively.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlInputElement};

    use hello_flags::audio::WebAudio;
    use hello_flags::platform::web::{BrowserScheduler, DomSurface, LocalStorage};
    use hello_flags::platform::{Platform, SystemClock};
    use hello_flags::consts::EFFECT_CONFIG_ELEMENT_ID;
    use hello_flags::{AppError, EffectConfig, GreetingApp};

    type SharedApp = Rc<RefCell<GreetingApp>>;

    /// Console handle installed as `window.featureFlags`
    #[wasm_bindgen]
    pub struct FlagConsole {
        app: SharedApp,
    }

    #[wasm_bindgen]
    impl FlagConsole {
        #[wasm_bindgen(js_name = isEnabled)]
        pub fn is_enabled(&self, name: &str) -> bool {
            self.app.borrow().flags().is_enabled_by_name(name)
        }

        pub fn enable(&self, name: &str) -> bool {
            report(self.app.borrow_mut().set_flag(name, true)).unwrap_or(false)
        }

        pub fn disable(&self, name: &str) -> bool {
            report(self.app.borrow_mut().set_flag(name, false)).unwrap_or(false)
        }

        pub fn toggle(&self, name: &str) -> bool {
            report(self.app.borrow_mut().toggle_flag(name)).unwrap_or(false)
        }

        /// All flags as a JSON object string
        #[wasm_bindgen(js_name = getAllFlags)]
        pub fn get_all_flags(&self) -> String {
            self.app
                .borrow()
                .flag_snapshot()
                .to_json()
                .unwrap_or_else(|_| "{}".to_string())
        }

        pub fn reset(&self) {
            report(self.app.borrow_mut().reset_flags());
        }

        #[wasm_bindgen(js_name = resetCounters)]
        pub fn reset_counters(&self) {
            report(self.app.borrow_mut().reset_counters());
        }
    }

    fn report<T>(result: Result<T, AppError>) -> Option<T> {
        result.map_err(|e| log::error!("{e}")).ok()
    }

    /// Storage or DOM failure: the page cannot continue
    fn fatal(e: AppError) -> ! {
        log::error!("Fatal: {e}");
        panic!("{e}");
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let platform = Platform {
            storage: Rc::new(LocalStorage::open().expect("localStorage unavailable")),
            surface: Rc::new(DomSurface::new(document.clone())),
            audio: Rc::new(WebAudio::new()),
            scheduler: Rc::new(BrowserScheduler::new()),
            clock: Rc::new(SystemClock),
        };

        let config_json = document
            .get_element_by_id(EFFECT_CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content());
        let config = EffectConfig::from_page(config_json.as_deref());

        let app = GreetingApp::new(&platform, config).unwrap_or_else(|e| fatal(e));
        let app = Rc::new(RefCell::new(app));

        setup_greet_button(&document, app.clone());
        setup_flag_panel(&document, app.clone());
        setup_reset_buttons(&document, app.clone());

        // Debug access from the browser console
        let console = JsValue::from(FlagConsole { app });
        let _ = js_sys::Reflect::set(&window, &JsValue::from_str("featureFlags"), &console);

        log::info!("Feature Flags Admin Panel Ready!");
        log::info!("Tip: Use window.featureFlags in console to manage flags programmatically");
    }

    fn setup_greet_button(document: &Document, app: SharedApp) {
        let Some(btn) = document.get_element_by_id("greetBtn") else {
            log::warn!("No greet button on page");
            return;
        };
        let Some(message) = document.get_element_by_id("message") else {
            log::warn!("No message element on page");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let greeting = app.borrow_mut().greet().unwrap_or_else(|e| fatal(e));
            message.set_text_content(Some(greeting));

            // Restart the fade-in animation
            let _ = message.set_attribute("style", "animation: none");
            let message = message.clone();
            let restart = Closure::once_into_js(move || {
                let _ = message.set_attribute("style", "animation: fadeIn 0.5s ease");
            });
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    restart.unchecked_ref(),
                    10,
                );
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_flag_panel(document: &Document, app: SharedApp) {
        // Initialise checkboxes from current flags
        for (flag, enabled) in app.borrow().flag_snapshot().known() {
            if let Some(checkbox) = document
                .get_element_by_id(&format!("flag-{flag}"))
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            {
                checkbox.set_checked(enabled);
            }
        }

        let Ok(checkboxes) = document.query_selector_all("[data-flag]") else {
            return;
        };
        for i in 0..checkboxes.length() {
            let Some(checkbox) = checkboxes
                .item(i)
                .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            else {
                continue;
            };
            let Some(name) = checkbox.get_attribute("data-flag") else {
                continue;
            };

            let app = app.clone();
            let input = checkbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut()
                    .set_flag(&name, input.checked())
                    .unwrap_or_else(|e| fatal(e));
            });
            let _ = checkbox
                .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_reset_buttons(document: &Document, app: SharedApp) {
        if let Some(btn) = document.get_element_by_id("resetFlags") {
            let app = app.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if !confirm("Reset all feature flags to defaults?") {
                    return;
                }
                app.borrow_mut().reset_flags().unwrap_or_else(|e| fatal(e));

                if let Ok(checkboxes) = document.query_selector_all("[data-flag]") {
                    for i in 0..checkboxes.length() {
                        if let Some(checkbox) = checkboxes
                            .item(i)
                            .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
                        {
                            checkbox.set_checked(false);
                        }
                    }
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let Some(panel) = document.get_element_by_id("featureFlagsPanel") else {
            return;
        };
        let Ok(btn) = document.create_element("button") else {
            return;
        };
        btn.set_text_content(Some("Reset Counters"));
        btn.set_class_name("btn-small");
        let _ = btn.set_attribute("style", "margin-top: 0.5rem");

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            if !confirm("Reset visit and greeting counters? This will set all counts to 0.") {
                return;
            }
            app.borrow_mut().reset_counters().unwrap_or_else(|e| fatal(e));
            if let Some(window) = web_sys::window() {
                let _ = window.alert_with_message("Counters reset successfully!");
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
        let _ = panel.append_child(&btn);
    }

    fn confirm(message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use hello_flags::platform::headless::HeadlessPlatform;
    use hello_flags::{EffectConfig, GreetingApp};

    env_logger::init();
    log::info!("Hello Flags (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    let rig = HeadlessPlatform::new(chrono::Utc::now());
    let result = GreetingApp::new(&rig.platform(), EffectConfig::default())
        .and_then(|mut app| walkthrough(&mut app).map(|()| app));
    let app = match result {
        Ok(app) => app,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    println!("\nFlags: {}", app.flag_snapshot().to_json().unwrap_or_default());
    println!("Counter: {}", rig.surface.counter_html().unwrap_or_default());
    println!("Tones played: {}", rig.audio.played().len());
}

/// Turn a few flags on and click the greeting button
#[cfg(not(target_arch = "wasm32"))]
fn walkthrough(app: &mut hello_flags::GreetingApp) -> Result<(), hello_flags::AppError> {
    for flag in ["darkMode", "showGreetingCounter", "soundEffects"] {
        app.set_flag(flag, true)?;
    }
    for _ in 0..3 {
        println!("{}", app.greet()?);
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
