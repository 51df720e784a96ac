use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::RenderCtx, Error};

/*
Audio Oscillator
================

An oscillator is the sound source of every voice. It generates a repeating
waveform at the note's frequency; the envelope and filter shape it afterwards.

Phase
-----

The oscillator keeps a single number: its position inside the current cycle,
normalized to [0, 1). One full cycle is 2π radians, so phase 0.25 is π/2.

    increment = frequency / sample_rate

Each sample we add the increment and wrap back into [0, 1). At 440 Hz and
48 kHz that is 0.00917 per sample, i.e. one cycle every ~109 samples.

Changing the frequency only changes the increment. The phase itself carries
on from where it was, so a retune mid-note never produces a jump in the
output. The phase is only reset when a note starts from silence.

Waveforms
---------

  Sine       sin(2π·phase). Pure tone, no harmonics.
  Square     +1 for the first half cycle, -1 for the second. Odd harmonics.
  Sawtooth   straight ramp from -1 to +1. All harmonics.
  Triangle   -1 → +1 → -1, symmetric. Odd harmonics falling off as 1/n².

  Square, sawtooth and triangle are rendered naively (no band-limiting), so
  their upper harmonics alias above Nyquist. The low-pass filter after the
  oscillator hides most of it for typical keyboard ranges.
*/

/// Oscillator waveform selection
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Lowercase name used by the control protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Evaluate the waveform at a normalized phase in [0, 1).
    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (std::f32::consts::TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }

    pub(crate) fn to_index(self) -> u8 {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Sawtooth => 2,
            Waveform::Triangle => 3,
        }
    }

    /// Unknown indices fall back to the default waveform.
    pub(crate) fn from_index(index: u8) -> Self {
        match index {
            1 => Waveform::Square,
            2 => Waveform::Sawtooth,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" => Ok(Waveform::Triangle),
            _ => Err(Error::UnknownWaveform(s.to_string())),
        }
    }
}

/// Phase accumulator driving one voice's waveform.
#[derive(Debug, Clone, Default)]
pub struct Oscillator {
    phase: f32,
}

impl Oscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Produce one sample at the current phase, then advance by one sample.
    #[inline]
    pub fn next_sample(&mut self, waveform: Waveform, ctx: &RenderCtx) -> f32 {
        let out = waveform.sample(self.phase);
        self.advance(ctx);
        out
    }

    /// Render a block of raw waveform into the buffer.
    pub fn render(&mut self, out: &mut [f32], waveform: Waveform, ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(waveform, ctx);
        }
    }

    #[inline]
    fn advance(&mut self, ctx: &RenderCtx) {
        let frequency = clamp_frequency(ctx.frequency, ctx.sample_rate);
        self.phase += frequency / ctx.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
    }

    /// Restart the cycle (note start from silence only).
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Current normalized phase in [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

/// Keep the rendered frequency inside [0, Nyquist).
#[inline]
fn clamp_frequency(frequency: f32, sample_rate: f32) -> f32 {
    if !frequency.is_finite() {
        return 0.0;
    }
    frequency.clamp(0.0, sample_rate * 0.4999)
}
