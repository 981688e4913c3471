// src/device/mod.rs
//
// Contract with the audio device service.
//
// A device owns the output stream, picks the sample rate and buffer size,
// and calls back into a [`DeviceCallback`] on its own real-time thread.
// The generator only registers and unregisters that callback.

mod host;

#[cfg(feature = "cpal")]
mod cpal_output;

pub use host::{HostDevice, HostStream};

#[cfg(feature = "cpal")]
pub use cpal_output::CpalDevice;

use crate::audio_buffer::AudioBuffer;
use crate::error::DeviceInitError;

/// Entry points a device invokes on the audio thread.
///
/// Implementations:
/// - do NOT block
/// - do NOT allocate
/// - do NOT take locks
///
/// The device guarantees these never overlap for one stream.
pub trait DeviceCallback: Send {
    /// Fill `frames` frames of `output`.
    fn render(&mut self, output: &mut AudioBuffer, frames: usize);

    /// The stream is about to start running at `sample_rate` Hz.
    fn about_to_start(&mut self, sample_rate: f64);

    /// The stream has stopped.
    fn stopped(&mut self);
}

/// An output stream provider.
pub trait AudioDevice {
    /// Open an output stream with `output_channels` channels and register
    /// `callback` as its render target.
    ///
    /// On error nothing is registered and the callback is dropped.
    fn open(
        &mut self,
        output_channels: u16,
        callback: Box<dyn DeviceCallback>,
    ) -> Result<(), DeviceInitError>;

    /// Stop the stream and unregister the callback.
    ///
    /// When this returns the callback is guaranteed not to be running and
    /// will never be invoked again. Closing a closed device is a no-op.
    fn close(&mut self);

    /// Whether a callback is currently registered.
    fn is_open(&self) -> bool;
}
