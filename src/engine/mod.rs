// Purpose: the control/audio split. `SynthHandle` lives on the control
// thread, `SynthRenderer` is moved into the audio callback.

mod handle;
mod renderer;

pub use handle::SynthHandle;
pub use renderer::SynthRenderer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::sync::{atomic::AtomicBool, Arc};

use crate::{synth::params::{SynthParams, MAX_DELAY_SECONDS}, DEFAULT_SAMPLE_RATE};

/// Construction-time settings. Fixed once the engine exists, except the
/// sample rate, which a reconnect may change.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub polyphony: usize,
    pub event_queue_capacity: usize,
    pub max_delay_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            polyphony: 8,
            event_queue_capacity: 64,
            max_delay_seconds: 2.0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn polyphony(mut self, voices: usize) -> Self {
        self.polyphony = voices;
        self
    }

    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    pub fn max_delay_seconds(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    /// Replace unusable values with working ones.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            sample_rate: sanitize_sample_rate(self.sample_rate),
            polyphony: self.polyphony.max(1),
            event_queue_capacity: self.event_queue_capacity.max(1),
            max_delay_seconds: if self.max_delay_seconds.is_finite() && self.max_delay_seconds > 0.0 {
                self.max_delay_seconds.min(MAX_DELAY_SECONDS)
            } else {
                defaults.max_delay_seconds
            },
        }
    }
}

pub(crate) fn sanitize_sample_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate >= 1_000.0 {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

/// State visible to both threads.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) params: SynthParams,
    /// Raised by `stop()`, cleared by the renderer once it has flushed.
    pub(crate) flush: AtomicBool,
}

impl Shared {
    fn new(config: &EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            params: SynthParams::new(config.max_delay_seconds),
            flush: AtomicBool::new(false),
        })
    }
}
