pub mod dsp; // Oscillator, envelope, filter and delay primitives
pub mod engine; // Control handle and audio-thread context
pub mod error;
pub mod io; // Render boundary, offline rendering, device driver
pub mod synth; // Voices, polyphony, parameters and note events

pub use dsp::oscillator::Waveform;
pub use engine::{EngineConfig, SynthHandle, SynthRenderer};
pub use error::{Error, Result};
pub use io::AudioRenderer;
pub use synth::{message::NoteEvent, params::ParamSnapshot};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
