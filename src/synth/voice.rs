use crate::{
    dsp::{
        envelope::{Envelope, EnvelopeState},
        filter::SVFilter,
        oscillator::Oscillator,
        RenderCtx,
    },
    synth::params::ParamSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One note's signal chain: oscillator → envelope → low-pass filter.
///
/// The state is derived from the envelope, so a voice frees itself the
/// moment its release ramp finishes.
pub struct Voice {
    oscillator: Oscillator,
    envelope: Envelope,
    filter: SVFilter,
    frequency: f32,
    age: u64,
    sample_rate: f32,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(),
            envelope: Envelope::new(),
            filter: SVFilter::default(),
            frequency: 0.0,
            age: 0,
            sample_rate,
        }
    }

    /// Gate on at `frequency`. Phase and filter memory are only cleared when
    /// the voice was silent; a stolen or retriggered voice keeps running so
    /// the restart does not click.
    pub fn start(&mut self, frequency: f32, age: u64) {
        if self.is_free() {
            self.oscillator.reset();
            self.filter.reset();
        }
        self.frequency = frequency;
        self.age = age;
        self.envelope.note_on();
    }

    pub fn release(&mut self) {
        if self.state() == VoiceState::Active {
            let ctx = self.ctx();
            self.envelope.note_off(&ctx);
        }
    }

    /// Change pitch in place: no phase reset, no retrigger.
    pub fn retune(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    /// Render one block into `out`, overwriting it. Parameters are taken
    /// once for the whole block.
    pub fn render(&mut self, out: &mut [f32], params: &ParamSnapshot) {
        let ctx = self.ctx();
        self.envelope.set_params(params.adsr());
        self.filter.set_cutoff(params.filter_cutoff);
        self.filter.set_resonance(params.filter_resonance);
        let coefficients = self.filter.coefficients(&ctx);

        for sample in out.iter_mut() {
            let raw = self.oscillator.next_sample(params.waveform, &ctx);
            let shaped = raw * self.envelope.next_sample(&ctx);
            *sample = self.filter.next_sample(shaped, &coefficients);
        }
    }

    /// Silence immediately.
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.oscillator.reset();
        self.filter.reset();
        self.frequency = 0.0;
    }

    pub fn state(&self) -> VoiceState {
        match self.envelope.state() {
            EnvelopeState::Idle => VoiceState::Free,
            EnvelopeState::Release => VoiceState::Releasing,
            _ => VoiceState::Active,
        }
    }

    pub fn is_free(&self) -> bool {
        self.state() == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    /// True while the gate is high (attack, decay or sustain).
    pub fn is_held(&self) -> bool {
        self.state() == VoiceState::Active
    }

    pub fn level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.oscillator.phase()
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    fn ctx(&self) -> RenderCtx {
        RenderCtx::from_freq(self.sample_rate, self.frequency)
    }
}
