use std::f32::consts::PI;

use crate::dsp::RenderCtx;

/*
State-Variable Low-Pass Filter
==============================

Each voice runs its shaped oscillator output through a resonant low-pass:
frequencies below the cutoff pass, frequencies above it are attenuated at
12 dB/octave. Resonance adds a peak at the cutoff.

The filter is a topology-preserving transform (TPT) state-variable filter.
It keeps two integrator memories (`ic1eq`, `ic2eq`) between samples and is
well-behaved when cutoff and resonance move from block to block.

Coefficients
------------

    g = tan(π · cutoff / sample_rate)     (prewarped integrator gain)
    k = 2 - 2 · resonance                 (damping, k = 1/Q)

  resonance 0.0   → k = 2.0, Q = 0.5   (no peak, gentle rolloff)
  resonance 0.5   → k = 1.0, Q = 1.0   (slight peak)
  resonance 0.95  → k = 0.1, Q = 10    (strong, squelchy peak)

Stability Bounds
----------------

The TPT structure is stable for any g > 0 and k > 0. Two things still go
wrong at the edges: as k → 0 the peak gain (≈ Q) grows without bound and
the filter rings forever; as cutoff → Nyquist, tan() blows up. Both are
handled by clamping:

  resonance ∈ [0, 0.95]                    so Q ≤ 10
  cutoff    ∈ [20 Hz, 0.245 · sample_rate]  just below Nyquist/2
*/

/// Highest accepted resonance; keeps Q at or below 10.
pub const MAX_RESONANCE: f32 = 0.95;
/// Lowest accepted cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;
/// Highest accepted cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.245;

/// Per-block filter coefficients.
#[derive(Debug, Clone, Copy)]
pub struct FilterCoefficients {
    g: f32,
    k: f32,
    h: f32,
}

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,
}

impl Default for SVFilter {
    fn default() -> Self {
        Self::lowpass(20_000.0)
    }
}

impl SVFilter {
    pub fn lowpass(cutoff_hz: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: 1_000.0,
            resonance: 0.0,
        };
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.set_resonance(resonance);
        self
    }

    /// Clamp and compute coefficients for the current settings.
    pub fn coefficients(&self, ctx: &RenderCtx) -> FilterCoefficients {
        let max_cutoff = (ctx.sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
        let cutoff = self.cutoff_hz.clamp(MIN_CUTOFF_HZ, max_cutoff);
        let g = (PI * cutoff / ctx.sample_rate).tan();
        let k = 2.0 - 2.0 * self.resonance;
        let h = 1.0 / (1.0 + g * (g + k));
        FilterCoefficients { g, k, h }
    }

    /// Filter one sample, returning the low-pass output.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, c: &FilterCoefficients) -> f32 {
        let v3 = sample - self.ic2eq;
        let v1 = c.h * (self.ic1eq + c.g * v3);
        let v2 = self.ic2eq + c.g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        if !v2.is_finite() {
            self.reset();
            return 0.0;
        }
        v2
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let coefficients = self.coefficients(ctx);
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, &coefficients);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Set the cutoff in Hz. The upper bound depends on the sample rate and
    /// is applied when coefficients are computed.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff.is_finite() {
            self.cutoff_hz = cutoff.max(MIN_CUTOFF_HZ);
        } else if cutoff > 0.0 {
            self.cutoff_hz = f32::MAX;
        }
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        if resonance.is_nan() {
            return;
        }
        self.resonance = resonance.clamp(0.0, MAX_RESONANCE);
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }
}
