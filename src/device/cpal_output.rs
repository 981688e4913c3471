// src/device/cpal_output.rs
//
// Default system output through cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use log::{debug, error, info};

use crate::audio_buffer::AudioBuffer;
use crate::error::DeviceInitError;

use super::{AudioDevice, DeviceCallback};

/// Scratch frames preallocated per channel (grown if the device asks for more).
const SCRATCH_FRAMES: usize = 4096;

/// Output stream on the default device of the default host.
pub struct CpalDevice {
    /// The running stream (dropping it stops the callback thread)
    stream: Option<cpal::Stream>,
    sample_rate: Option<u32>,
}

impl CpalDevice {
    pub fn new() -> Self {
        Self {
            stream: None,
            sample_rate: None,
        }
    }

    /// Sample rate negotiated by the last successful `open`.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for CpalDevice {
    fn open(
        &mut self,
        output_channels: u16,
        mut callback: Box<dyn DeviceCallback>,
    ) -> Result<(), DeviceInitError> {
        if output_channels == 0 {
            return Err(DeviceInitError::InvalidChannelCount(output_channels));
        }
        if self.stream.is_some() {
            return Err(DeviceInitError::AlreadyOpen);
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceInitError::NoOutputDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| DeviceInitError::DefaultConfig(e.to_string()))?;

        let sample_format = supported.sample_format();
        let mut config: cpal::StreamConfig = supported.config();
        config.channels = output_channels;
        let sample_rate = config.sample_rate.0;

        info!(
            "Opening output stream: {} channels @ {} Hz ({:?})",
            output_channels, sample_rate, sample_format
        );

        // Delivered before the stream exists, so it cannot race a render
        callback.about_to_start(sample_rate as f64);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, callback)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, callback)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, callback)?,
            other => {
                return Err(DeviceInitError::UnsupportedSampleFormat(format!(
                    "{:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| DeviceInitError::PlayStream(e.to_string()))?;

        debug!("Audio stream started");

        self.stream = Some(stream);
        self.sample_rate = Some(sample_rate);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!("Failed to pause audio stream: {}", e);
            }
            // Dropping the stream joins the callback thread; the callback
            // (and the renderer it owns) is released with it.
            drop(stream);
            debug!("Audio stream closed");
        }
        self.sample_rate = None;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build an output stream for sample type `T`.
///
/// The callback renders into a planar scratch buffer which is then
/// interleaved and converted into the device's buffer.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: Box<dyn DeviceCallback>,
) -> Result<cpal::Stream, DeviceInitError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = vec![0.0; SCRATCH_FRAMES * channels];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                let needed = frames * channels;
                // Resize scratch if the device hands us an unusually large buffer
                if scratch.len() < needed {
                    scratch.resize(needed, 0.0);
                }

                let mut buffer = AudioBuffer::new(&mut scratch[..needed], channels);
                callback.render(&mut buffer, frames);
                buffer.interleave(data, T::from_sample);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| DeviceInitError::BuildStream(e.to_string()))
}
