//! Error types
//!
//! Recoverable conditions (corrupt stored flags, unknown flag names) never
//! reach these types; they are logged and absorbed where they occur.

use crate::flags::FeatureFlag;

/// Failure of the backing key-value store.
///
/// The store is assumed always available, so callers treat this as fatal.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No storage backend could be obtained from the host.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading a key failed.
    #[error("failed to read key `{key}`: {reason}")]
    Read { key: String, reason: String },

    /// Writing or removing a key failed.
    #[error("failed to write key `{key}`: {reason}")]
    Write { key: String, reason: String },

    /// The flag set could not be serialized.
    #[error("failed to encode flags: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure while executing a feature side effect.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    /// The element the counter display attaches to does not exist.
    #[error("render target `{0}` not found")]
    MissingContainer(&'static str),

    /// The host rejected a DOM operation.
    #[error("DOM operation failed: {0}")]
    Dom(String),

    /// A counter could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure while assembling the feature dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// The effect table has no entry for a flag.
    #[error("no effect registered for flag `{0}`")]
    MissingEffect(FeatureFlag),

    /// The effect table has two entries for the same flag.
    #[error("effect registered twice for flag `{0}`")]
    DuplicateEffect(FeatureFlag),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Top-level error surfaced by [`crate::app::GreetingApp`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}
