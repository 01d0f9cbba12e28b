//! Engine configuration.

use crate::lifecycle::LifecycleDurations;

/// Tunables for an [`OversightEngine`](super::OversightEngine).
///
/// Plain data passed to the constructor; nothing is read from ambient
/// state.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Lifecycle period durations.
    pub durations: LifecycleDurations,

    /// Ceiling on feed page sizes.
    pub max_feed_limit: usize,

    /// Per-subscriber change-stream buffer.
    pub watch_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            durations: LifecycleDurations::default(),
            max_feed_limit: 100,
            watch_buffer: 64,
        }
    }
}
