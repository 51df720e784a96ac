//! Error types for the control side of the engine.
//!
//! Nothing here ever crosses the render boundary: the audio thread clamps and
//! saturates instead of failing. These errors surface on the control thread
//! (queue pressure, bad note frequencies) and from the device driver.

/// Errors reported by the control handle and the audio driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The note event queue is full; the newest event was dropped.
    #[error("note event queue is full, dropped {0}")]
    QueueFull(&'static str),

    /// A note frequency was not a finite, positive number.
    #[error("invalid note frequency: {0} Hz")]
    InvalidFrequency(f32),

    /// A waveform name did not match any known waveform.
    #[error("unknown waveform: {0:?}")]
    UnknownWaveform(String),

    /// No output device is available on the host.
    #[cfg(feature = "cpal")]
    #[error("no audio output device available")]
    NoDevice,

    /// The device does not offer a sample format the engine can render.
    #[cfg(feature = "cpal")]
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Querying the device's default stream configuration failed.
    #[cfg(feature = "cpal")]
    #[error("failed to fetch default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    /// Building the output stream failed.
    #[cfg(feature = "cpal")]
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// Starting the output stream failed.
    #[cfg(feature = "cpal")]
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
