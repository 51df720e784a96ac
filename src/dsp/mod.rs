//! Low-level DSP primitives used by the voices and the mixer.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! making them safe to embed directly inside voice structs. They stay focused
//! on the signal-processing math; voice allocation and parameter plumbing live
//! in [`crate::synth`].

/// Feedback delay line with fractional reads.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Resonant state-variable low-pass filter.
pub mod filter;
/// Phase accumulator and the four basic waveforms.
pub mod oscillator;

pub use envelope::EnvelopeState;

/// Context passed to DSP primitives during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch to render (Hz)
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
}

impl RenderCtx {
    /// Create context from a frequency in Hz.
    ///
    /// Notes arrive as frequencies, never note numbers: the keyboard computes
    /// pitch itself, including microtonal transpose.
    pub fn from_freq(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            frequency,
        }
    }

    /// Highest frequency that can be rendered without folding over.
    #[inline]
    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }
}
