use std::sync::{atomic::Ordering, Arc};

use rtrb::{Producer, RingBuffer};

use super::{sanitize_sample_rate, EngineConfig, Shared, SynthRenderer};
use crate::{
    dsp::oscillator::Waveform,
    error::{Error, Result},
    synth::{
        message::NoteEvent,
        params::{Param, ParamSnapshot, SynthParams},
        poly::PolySynth,
    },
};

/// Control-thread side of the engine.
///
/// Parameter setters never fail and never block: values are clamped and
/// stored in atomics the audio thread reads once per block. Note events go
/// through a bounded queue; when it is full the newest event is dropped and
/// reported as [`Error::QueueFull`].
pub struct SynthHandle {
    shared: Arc<Shared>,
    tx: Producer<NoteEvent>,
    config: EngineConfig,
}

impl SynthHandle {
    /// Build the engine: a handle for the control thread and a renderer to
    /// move into the audio callback.
    pub fn new(config: EngineConfig) -> (Self, SynthRenderer) {
        let config = config.sanitized();
        let shared = Shared::new(&config);
        let (tx, rx) = RingBuffer::new(config.event_queue_capacity);
        let synth = PolySynth::new(
            config.sample_rate,
            config.polyphony,
            config.max_delay_seconds,
            rx,
        );
        tracing::debug!(?config, "engine created");

        let handle = Self {
            shared: Arc::clone(&shared),
            tx,
            config,
        };
        (handle, SynthRenderer::new(synth, shared))
    }

    /// A fresh renderer for a new stream, sharing this handle's parameters.
    ///
    /// The event queue is replaced, so the previous renderer stops receiving
    /// notes. Voices and echoes start from silence.
    pub fn renderer(&mut self, sample_rate: f32) -> SynthRenderer {
        self.config.sample_rate = sanitize_sample_rate(sample_rate);
        let (tx, rx) = RingBuffer::new(self.config.event_queue_capacity);
        self.tx = tx;
        let synth = PolySynth::new(
            self.config.sample_rate,
            self.config.polyphony,
            self.config.max_delay_seconds,
            rx,
        );
        tracing::info!(sample_rate = self.config.sample_rate, "renderer rebuilt");
        SynthRenderer::new(synth, Arc::clone(&self.shared))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn params(&self) -> &SynthParams {
        &self.shared.params
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.shared.params.snapshot()
    }

    // ---- notes ----

    /// Start a note at `frequency` Hz.
    pub fn note_on(&mut self, frequency: f32) -> Result<()> {
        let frequency = validate_frequency(frequency)?;
        self.send(NoteEvent::NoteOn { frequency })
    }

    /// Release the most recently started note.
    pub fn note_off(&mut self) -> Result<()> {
        self.send(NoteEvent::NoteOff)
    }

    /// Glide the most recent note to `frequency` without retriggering.
    pub fn set_frequency(&mut self, frequency: f32) -> Result<()> {
        let frequency = validate_frequency(frequency)?;
        self.send(NoteEvent::NoteRetune { frequency })
    }

    pub fn all_notes_off(&mut self) -> Result<()> {
        self.send(NoteEvent::AllNotesOff)
    }

    /// Silence everything at the next callback. Events still queued at that
    /// point are discarded.
    pub fn stop(&self) {
        self.shared.flush.store(true, Ordering::Release);
        tracing::debug!("stop requested");
    }

    /// Free slots in the event queue.
    pub fn queue_free_slots(&self) -> usize {
        self.tx.slots()
    }

    fn send(&mut self, event: NoteEvent) -> Result<()> {
        match self.tx.push(event) {
            Ok(()) => {
                tracing::trace!(event = event.name(), "event queued");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(event = event.name(), "event queue full, dropping event");
                Err(Error::QueueFull(event.name()))
            }
        }
    }

    // ---- parameters ----

    pub fn set_waveform(&self, waveform: Waveform) {
        self.shared.params.set_waveform(waveform);
        tracing::debug!(%waveform, "waveform set");
    }

    pub fn get_waveform(&self) -> Waveform {
        self.shared.params.waveform()
    }

    /// Set any scalar parameter; returns the value actually stored.
    pub fn set_param(&self, param: Param, value: f32) -> f32 {
        let stored = self.shared.params.set(param, value);
        tracing::debug!(param = param.name(), requested = value, stored, "parameter set");
        stored
    }

    pub fn get_param(&self, param: Param) -> f32 {
        self.shared.params.get(param)
    }

    pub fn set_attack(&self, seconds: f32) {
        self.set_param(Param::Attack, seconds);
    }

    pub fn get_attack(&self) -> f32 {
        self.get_param(Param::Attack)
    }

    pub fn set_decay(&self, seconds: f32) {
        self.set_param(Param::Decay, seconds);
    }

    pub fn get_decay(&self) -> f32 {
        self.get_param(Param::Decay)
    }

    pub fn set_sustain(&self, level: f32) {
        self.set_param(Param::Sustain, level);
    }

    pub fn get_sustain(&self) -> f32 {
        self.get_param(Param::Sustain)
    }

    pub fn set_release(&self, seconds: f32) {
        self.set_param(Param::Release, seconds);
    }

    pub fn get_release(&self) -> f32 {
        self.get_param(Param::Release)
    }

    pub fn set_filter_cutoff(&self, hz: f32) {
        self.set_param(Param::FilterCutoff, hz);
    }

    pub fn get_filter_cutoff(&self) -> f32 {
        self.get_param(Param::FilterCutoff)
    }

    pub fn set_filter_resonance(&self, resonance: f32) {
        self.set_param(Param::FilterResonance, resonance);
    }

    pub fn get_filter_resonance(&self) -> f32 {
        self.get_param(Param::FilterResonance)
    }

    pub fn set_delay_time(&self, seconds: f32) {
        self.set_param(Param::DelayTime, seconds);
    }

    pub fn get_delay_time(&self) -> f32 {
        self.get_param(Param::DelayTime)
    }

    pub fn set_delay_feedback(&self, feedback: f32) {
        self.set_param(Param::DelayFeedback, feedback);
    }

    pub fn get_delay_feedback(&self) -> f32 {
        self.get_param(Param::DelayFeedback)
    }

    pub fn set_delay_mix(&self, mix: f32) {
        self.set_param(Param::DelayMix, mix);
    }

    pub fn get_delay_mix(&self) -> f32 {
        self.get_param(Param::DelayMix)
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.set_param(Param::MasterVolume, volume);
    }

    pub fn get_master_volume(&self) -> f32 {
        self.get_param(Param::MasterVolume)
    }
}

fn validate_frequency(frequency: f32) -> Result<f32> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(frequency)
    } else {
        tracing::warn!(frequency, "rejecting note frequency");
        Err(Error::InvalidFrequency(frequency))
    }
}
