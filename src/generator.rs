// src/generator.rs

use log::{debug, error, info};

use crate::bridge::{Controls, create_bridge};
use crate::config::GeneratorConfig;
use crate::device::AudioDevice;
use crate::error::DeviceInitError;

/// Sine-wave generator bound to one audio device.
///
/// Owned by whatever session object the host keeps; there is no global
/// instance. Parameter methods take `&self` and only touch atomics, so
/// they are safe to call while the device is rendering.
///
/// Before [`initialize`](Self::initialize) succeeds the accessors return
/// the configured initial values and `start`/`stop` only toggle the flag.
pub struct SignalGenerator<D: AudioDevice> {
    device: D,
    controls: Controls,
    config: GeneratorConfig,
    initialized: bool,
}

impl<D: AudioDevice> SignalGenerator<D> {
    pub fn new(device: D, config: GeneratorConfig) -> Self {
        let (controls, _) = create_bridge(&config);
        Self {
            device,
            controls,
            config,
            initialized: false,
        }
    }

    /// Open the output stream and register the render callback.
    ///
    /// On failure nothing is registered; the call may be retried.
    /// Calling it again after success is a no-op.
    pub fn initialize(&mut self) -> Result<(), DeviceInitError> {
        if self.initialized {
            debug!("Signal generator already initialized");
            return Ok(());
        }

        let renderer = self.controls.create_renderer();
        match self
            .device
            .open(self.config.output_channels, Box::new(renderer))
        {
            Ok(()) => {
                self.initialized = true;
                info!(
                    "Signal generator initialized ({} channels)",
                    self.config.output_channels
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize signal generator: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Start playback. Does not touch the device.
    pub fn start(&self) {
        self.controls.start();
    }

    /// Stop playback. The phase is preserved.
    pub fn stop(&self) {
        self.controls.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.controls.is_playing()
    }

    pub fn set_volume(&self, volume: f32) {
        self.controls.set_volume(volume);
    }

    pub fn get_volume(&self) -> f32 {
        self.controls.volume()
    }

    pub fn set_frequency(&self, frequency: f32) {
        self.controls.set_frequency(frequency);
    }

    pub fn get_frequency(&self) -> f32 {
        self.controls.frequency()
    }

    /// Control handle sharing this generator's parameters.
    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Stop playback and close the stream.
    ///
    /// Returns once the device guarantees the render callback will not run
    /// again. Safe to call repeatedly; `initialize` may be called afterwards.
    pub fn release(&mut self) {
        self.stop();
        if self.initialized {
            self.device.close();
            self.initialized = false;
            info!("Signal generator released");
        }
    }
}

impl<D: AudioDevice> Drop for SignalGenerator<D> {
    fn drop(&mut self) {
        self.release();
    }
}
