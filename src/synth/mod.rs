// Purpose: Voice management, polyphony, parameters and note events
// This layer sits above the dsp primitives and below the engine handle

pub mod message;
pub mod params;
pub mod poly;
pub mod voice;

pub use message::{MessageReceiver, NoteEvent};
pub use params::{Param, ParamRange, ParamSnapshot, SynthParams};
pub use poly::PolySynth;
pub use voice::{Voice, VoiceState};
