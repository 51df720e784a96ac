//! Lock-free parameter store shared between the control and audio threads.
//!
//! Every scalar lives in its own atomic (f32 bits in an `AtomicU32`), the
//! waveform in an `AtomicU8`. The control thread writes with `Relaxed`
//! stores; the audio thread copies everything into a [`ParamSnapshot`] once
//! per block. Parameters are independent of each other, so no ordering
//! between them is needed and a reader can never block a writer.
//!
//! Writes are clamped into each parameter's range. NaN resets a parameter to
//! its default. Nothing is ever rejected, so the audio thread only ever sees
//! valid values.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{
    delay::{DelayParams, MAX_FEEDBACK},
    envelope::AdsrParams,
    filter::MAX_RESONANCE,
    oscillator::Waveform,
};

/// Valid range and default of a scalar parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Bring any value into range; NaN becomes the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Scalar parameters of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Attack,
    Decay,
    Sustain,
    Release,
    FilterCutoff,
    FilterResonance,
    DelayTime,
    DelayFeedback,
    DelayMix,
    MasterVolume,
}

impl Param {
    pub const ALL: [Param; 10] = [
        Param::Attack,
        Param::Decay,
        Param::Sustain,
        Param::Release,
        Param::FilterCutoff,
        Param::FilterResonance,
        Param::DelayTime,
        Param::DelayFeedback,
        Param::DelayMix,
        Param::MasterVolume,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Param::Attack => "attack",
            Param::Decay => "decay",
            Param::Sustain => "sustain",
            Param::Release => "release",
            Param::FilterCutoff => "filter_cutoff",
            Param::FilterResonance => "filter_resonance",
            Param::DelayTime => "delay_time",
            Param::DelayFeedback => "delay_feedback",
            Param::DelayMix => "delay_mix",
            Param::MasterVolume => "master_volume",
        }
    }

    /// Display unit.
    pub fn unit(&self) -> &'static str {
        match self {
            Param::Attack | Param::Decay | Param::Release | Param::DelayTime => "s",
            Param::FilterCutoff => "Hz",
            _ => "",
        }
    }

    /// Static range. The delay time's upper bound is further limited by the
    /// engine's delay buffer, see [`SynthParams::range`].
    pub fn range(&self) -> ParamRange {
        match self {
            Param::Attack => ParamRange::new(0.001, 5.0, 0.02),
            Param::Decay => ParamRange::new(0.001, 5.0, 0.2),
            Param::Sustain => ParamRange::new(0.0, 1.0, 0.6),
            Param::Release => ParamRange::new(0.001, 10.0, 0.3),
            Param::FilterCutoff => ParamRange::new(20.0, 20_000.0, 20_000.0),
            Param::FilterResonance => ParamRange::new(0.0, MAX_RESONANCE, 0.1),
            Param::DelayTime => ParamRange::new(0.0, MAX_DELAY_SECONDS, 0.3),
            Param::DelayFeedback => ParamRange::new(0.0, MAX_FEEDBACK, 0.3),
            Param::DelayMix => ParamRange::new(0.0, 1.0, 0.3),
            Param::MasterVolume => ParamRange::new(0.0, 1.0, 0.7),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Longest delay time any engine accepts, in seconds.
pub const MAX_DELAY_SECONDS: f32 = 10.0;

/// Copy of every parameter, taken by the audio thread once per block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub waveform: Waveform,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub filter_cutoff: f32,
    pub filter_resonance: f32,
    pub delay_time: f32,
    pub delay_feedback: f32,
    pub delay_mix: f32,
    pub master_volume: f32,
}

impl ParamSnapshot {
    pub fn adsr(&self) -> AdsrParams {
        AdsrParams::new(self.attack, self.decay, self.sustain, self.release)
    }

    pub fn delay(&self) -> DelayParams {
        DelayParams::new(self.delay_time, self.delay_feedback, self.delay_mix)
    }

    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Attack => self.attack,
            Param::Decay => self.decay,
            Param::Sustain => self.sustain,
            Param::Release => self.release,
            Param::FilterCutoff => self.filter_cutoff,
            Param::FilterResonance => self.filter_resonance,
            Param::DelayTime => self.delay_time,
            Param::DelayFeedback => self.delay_feedback,
            Param::DelayMix => self.delay_mix,
            Param::MasterVolume => self.master_volume,
        }
    }
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            waveform: Waveform::default(),
            attack: Param::Attack.range().default,
            decay: Param::Decay.range().default,
            sustain: Param::Sustain.range().default,
            release: Param::Release.range().default,
            filter_cutoff: Param::FilterCutoff.range().default,
            filter_resonance: Param::FilterResonance.range().default,
            delay_time: Param::DelayTime.range().default,
            delay_feedback: Param::DelayFeedback.range().default,
            delay_mix: Param::DelayMix.range().default,
            master_volume: Param::MasterVolume.range().default,
        }
    }
}

/// f32 stored as raw bits in an `AtomicU32`.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// The shared parameter store. One writer (control), one reader (audio).
#[derive(Debug)]
pub struct SynthParams {
    waveform: AtomicU8,
    values: [AtomicF32; Param::ALL.len()],
    max_delay_time: f32,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl SynthParams {
    /// Create a store with every parameter at its default. `max_delay_time`
    /// is the longest delay the engine's buffer can hold.
    pub fn new(max_delay_time: f32) -> Self {
        let max_delay_time = if max_delay_time.is_finite() {
            max_delay_time.clamp(0.0, MAX_DELAY_SECONDS)
        } else {
            MAX_DELAY_SECONDS
        };
        let params = Self {
            waveform: AtomicU8::new(Waveform::default().to_index()),
            values: Param::ALL.map(|p| AtomicF32::new(p.range().default)),
            max_delay_time,
        };
        // the default delay time may exceed a short buffer
        let delay = params.range(Param::DelayTime).clamp(params.get(Param::DelayTime));
        params.values[Param::DelayTime.index()].store(delay);
        params
    }

    /// Range of a parameter for this store.
    pub fn range(&self, param: Param) -> ParamRange {
        let range = param.range();
        match param {
            Param::DelayTime => ParamRange {
                max: self.max_delay_time,
                default: range.default.min(self.max_delay_time),
                ..range
            },
            _ => range,
        }
    }

    /// Clamp and store a value; returns what was stored.
    pub fn set(&self, param: Param, value: f32) -> f32 {
        let value = self.range(param).clamp(value);
        self.values[param.index()].store(value);
        value
    }

    pub fn get(&self, param: Param) -> f32 {
        self.values[param.index()].load()
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform.to_index(), Ordering::Relaxed);
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed))
    }

    /// Read every parameter. Wait-free; called by the audio thread.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            waveform: self.waveform(),
            attack: self.get(Param::Attack),
            decay: self.get(Param::Decay),
            sustain: self.get(Param::Sustain),
            release: self.get(Param::Release),
            filter_cutoff: self.get(Param::FilterCutoff),
            filter_resonance: self.get(Param::FilterResonance),
            delay_time: self.get(Param::DelayTime),
            delay_feedback: self.get(Param::DelayFeedback),
            delay_mix: self.get(Param::DelayMix),
            master_volume: self.get(Param::MasterVolume),
        }
    }

    /// Put every parameter back to its default.
    pub fn restore_defaults(&self) {
        for param in Param::ALL {
            self.set(param, self.range(param).default);
        }
        self.set_waveform(Waveform::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ranges() {
        let params = SynthParams::new(2.0);
        let snapshot = params.snapshot();
        assert_eq!(snapshot, ParamSnapshot::default());
        for param in Param::ALL {
            let range = params.range(param);
            let value = snapshot.get(param);
            assert!(
                (range.min..=range.max).contains(&value),
                "{} default {value} outside {range:?}",
                param.name()
            );
        }
    }

    #[test]
    fn writes_are_clamped() {
        let params = SynthParams::new(2.0);
        assert_eq!(params.set(Param::MasterVolume, 3.0), 1.0);
        assert_eq!(params.set(Param::Sustain, -0.5), 0.0);
        assert_eq!(params.set(Param::Attack, 0.0), 0.001);
        assert_eq!(params.set(Param::FilterCutoff, 1.0e6), 20_000.0);
        assert_eq!(params.set(Param::FilterResonance, 4.0), MAX_RESONANCE);
        assert_eq!(params.set(Param::DelayFeedback, 1.0), MAX_FEEDBACK);
        assert_eq!(params.set(Param::DelayTime, 60.0), 2.0);
        assert_eq!(params.set(Param::Release, f32::INFINITY), 10.0);
        assert_eq!(params.get(Param::MasterVolume), 1.0);
    }

    #[test]
    fn nan_restores_default() {
        let params = SynthParams::new(2.0);
        params.set(Param::DelayMix, 0.9);
        assert_eq!(params.set(Param::DelayMix, f32::NAN), 0.3);
        assert_eq!(params.get(Param::DelayMix), 0.3);
    }

    #[test]
    fn short_delay_buffer_limits_default() {
        let params = SynthParams::new(0.1);
        assert_eq!(params.get(Param::DelayTime), 0.1);
        assert_eq!(params.range(Param::DelayTime).max, 0.1);
    }

    #[test]
    fn waveform_is_last_write_wins() {
        let params = SynthParams::default();
        params.set_waveform(Waveform::Square);
        params.set_waveform(Waveform::Triangle);
        assert_eq!(params.waveform(), Waveform::Triangle);
        assert_eq!(params.snapshot().waveform, Waveform::Triangle);

        params.restore_defaults();
        assert_eq!(params.waveform(), Waveform::Sine);
        assert_eq!(params.snapshot(), ParamSnapshot::default());
    }
}
