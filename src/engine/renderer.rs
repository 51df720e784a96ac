use std::sync::{atomic::Ordering, Arc};

use rtrb::Producer;

use super::Shared;
use crate::{io::AudioRenderer, synth::{params::ParamSnapshot, poly::PolySynth}, MAX_BLOCK_SIZE};

/// Audio-thread side of the engine. Owns the voice pool and the delay line.
///
/// `render` never allocates, locks or logs.
pub struct SynthRenderer {
    synth: PolySynth,
    shared: Arc<Shared>,
    tap: Option<Producer<f32>>,
}

impl SynthRenderer {
    pub(crate) fn new(synth: PolySynth, shared: Arc<Shared>) -> Self {
        Self {
            synth,
            shared,
            tap: None,
        }
    }

    /// Copy every rendered sample into `tap` as well, for scopes and meters.
    /// Samples that do not fit are dropped.
    pub fn with_tap(mut self, tap: Producer<f32>) -> Self {
        self.tap = Some(tap);
        self
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.shared.params.snapshot()
    }

    pub fn active_voice_count(&self) -> usize {
        self.synth.active_voice_count()
    }

    pub fn synth(&self) -> &PolySynth {
        &self.synth
    }
}

impl AudioRenderer for SynthRenderer {
    fn render(&mut self, buffer: &mut [f32]) {
        if self.shared.flush.swap(false, Ordering::Acquire) {
            self.synth.flush();
        }

        for block in buffer.chunks_mut(MAX_BLOCK_SIZE) {
            let params = self.shared.params.snapshot();
            self.synth.render_block(&params, block);

            if let Some(tap) = self.tap.as_mut() {
                for &s in block.iter() {
                    if tap.push(s).is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn sample_rate(&self) -> f32 {
        self.synth.sample_rate()
    }
}
