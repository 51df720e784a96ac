//! cpal output driver.
//!
//! Opens the default output device, builds a renderer at the device's real
//! sample rate and feeds it from the device callback: mono blocks of at most
//! [`MAX_BLOCK_SIZE`] frames, copied to every channel.
//!
//! Stream errors are reported by cpal on its own thread. The driver records
//! them in a [`StreamStatus`] the control thread can poll; after a
//! disconnect the caller rebuilds everything with [`OutputDriver::reconnect`].

use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, StreamConfig,
};

use crate::{
    error::{Error, Result},
    io::{interleave, AudioRenderer},
    MAX_BLOCK_SIZE,
};

/// Health of the output stream as last reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Running,
    /// The device went away (unplugged, switched, suspended).
    Disconnected,
    /// Any other backend error.
    Failed,
}

impl StreamStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StreamStatus::Running,
            1 => StreamStatus::Disconnected,
            _ => StreamStatus::Failed,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            StreamStatus::Running => 0,
            StreamStatus::Disconnected => 1,
            StreamStatus::Failed => 2,
        }
    }
}

pub struct OutputDriver {
    stream: Option<cpal::Stream>,
    status: Arc<AtomicU8>,
    device_name: String,
    sample_rate: f32,
    channels: usize,
}

impl OutputDriver {
    /// Open the default device and start playing. `make_renderer` receives
    /// the device's sample rate.
    pub fn open<R, F>(make_renderer: F) -> Result<Self>
    where
        R: AudioRenderer + 'static,
        F: FnOnce(f32) -> R,
    {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let config = f32_config(&device)?;

        let sample_rate = config.sample_rate.0 as f32;
        let channels = config.channels.max(1) as usize;
        let mut renderer = make_renderer(sample_rate);
        let status = Arc::new(AtomicU8::new(StreamStatus::Running.to_u8()));

        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let error_status = Arc::clone(&status);
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frames in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let block = &mut render_buf[..frames.len() / channels];
                    renderer.render(block);
                    interleave(block, frames, channels);
                }
            },
            move |err| {
                let status = match err {
                    cpal::StreamError::DeviceNotAvailable => StreamStatus::Disconnected,
                    _ => StreamStatus::Failed,
                };
                tracing::error!(error = %err, ?status, "output stream error");
                error_status.store(status.to_u8(), Ordering::Release);
            },
            None,
        )?;
        stream.play()?;

        tracing::info!(
            device = %device_name,
            sample_rate,
            channels,
            "output stream started"
        );

        Ok(Self {
            stream: Some(stream),
            status,
            device_name,
            sample_rate,
            channels,
        })
    }

    /// Drop the current stream and open the default device again.
    pub fn reconnect<R, F>(&mut self, make_renderer: F) -> Result<()>
    where
        R: AudioRenderer + 'static,
        F: FnOnce(f32) -> R,
    {
        tracing::info!(device = %self.device_name, "reconnecting output");
        self.stream = None;
        match Self::open(make_renderer) {
            Ok(driver) => {
                *self = driver;
                Ok(())
            }
            Err(err) => {
                self.status.store(StreamStatus::Failed.to_u8(), Ordering::Release);
                tracing::error!(error = %err, "reconnect failed");
                Err(err)
            }
        }
    }

    pub fn status(&self) -> StreamStatus {
        StreamStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && self.status() == StreamStatus::Running
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// The device's default configuration, or the closest f32 one at the same
/// sample rate.
fn f32_config(device: &cpal::Device) -> Result<StreamConfig> {
    let default = device.default_output_config()?;
    if default.sample_format() == SampleFormat::F32 {
        return Ok(default.into());
    }

    let rate = default.sample_rate();
    device
        .supported_output_configs()
        .ok()
        .into_iter()
        .flatten()
        .find(|range| {
            range.sample_format() == SampleFormat::F32
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .map(|range| range.with_sample_rate(rate).into())
        .ok_or_else(|| Error::UnsupportedFormat(format!("{:?}", default.sample_format())))
}
