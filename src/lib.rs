//! Hello Flags - a greeting page with client-side feature flags
//!
//! Core modules:
//! - `flags` / `flag_store`: Flag names, merge-with-defaults loading, write-through store
//! - `features`: Effect dispatcher (dark mode, background, confetti, sound, counter)
//! - `counters`: Persisted greeting/visit counters and relative time formatting
//! - `platform`: Storage, surface, audio, timer and clock abstraction
//! - `app`: Page wiring (composition root)

pub mod app;
pub mod audio;
pub mod config;
pub mod counters;
pub mod error;
pub mod features;
pub mod flag_store;
pub mod flags;
pub mod platform;

pub use app::GreetingApp;
pub use config::EffectConfig;
pub use error::{AppError, EffectError, FeatureError, StorageError};
pub use features::FeatureDispatcher;
pub use flag_store::FlagStore;
pub use flags::{FeatureFlag, FlagSet};

/// Page configuration constants
pub mod consts {
    /// LocalStorage keys
    pub const FLAGS_KEY: &str = "featureFlags";
    pub const GREETING_COUNT_KEY: &str = "greetingCount";
    pub const VISIT_COUNT_KEY: &str = "visitCount";
    pub const LAST_VISIT_KEY: &str = "lastVisit";

    /// Body classes toggled by visual features
    pub const DARK_MODE_CLASS: &str = "dark-mode";
    pub const ANIMATED_BACKGROUND_CLASS: &str = "animated-background";

    /// Counter display element
    pub const COUNTER_ELEMENT_ID: &str = "greetingCounter";
    pub const COUNTER_ELEMENT_CLASS: &str = "greeting-counter";
    /// Element the counter display is appended to
    pub const COUNTER_CONTAINER_SELECTOR: &str = ".container";

    /// Optional `<script type="application/json">` holding effect overrides
    pub const EFFECT_CONFIG_ELEMENT_ID: &str = "effectConfig";

    /// Class given to each confetti particle
    pub const CONFETTI_CLASS: &str = "confetti";

    /// Greeting button cycles through these
    pub const GREETINGS: [&str; 8] = [
        "Hello, World! 🌍",
        "Hola, Mundo! 🌎",
        "Bonjour, Monde! 🇫🇷",
        "Ciao, Mondo! 🇮🇹",
        "Hallo, Welt! 🇩🇪",
        "こんにちは、世界! 🇯🇵",
        "你好，世界! 🇨🇳",
        "Olá, Mundo! 🇧🇷",
    ];
}
