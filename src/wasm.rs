//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { SineGenerator, sinegen_init } from './sinegen.js';
//!
//! await init();
//! sinegen_init();
//!
//! const generator = new SineGenerator();
//! generator.initialize();
//! generator.about_to_start(sampleRate);
//! generator.set_frequency(440);
//! generator.start();
//!
//! // Inside AudioWorkletProcessor.process():
//! generator.render(outputs[0][0], outputs[0][1]);
//! ```

use wasm_bindgen::prelude::*;

use crate::config::{DEFAULT_FREQUENCY, DEFAULT_VOLUME, GeneratorConfig};
use crate::device::{HostDevice, HostStream};
use crate::generator::SignalGenerator;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn sinegen_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Generator
// ═══════════════════════════════════════════════════════════════════════════

/// Sine generator driven by an AudioWorklet.
#[wasm_bindgen]
pub struct SineGenerator {
    generator: SignalGenerator<HostDevice>,
    stream: HostStream,
}

#[wasm_bindgen]
impl SineGenerator {
    /// Create a generator with default settings (stereo, 0.5 volume, 440 Hz).
    #[wasm_bindgen(constructor)]
    pub fn new() -> SineGenerator {
        Self::with_values(DEFAULT_VOLUME, DEFAULT_FREQUENCY)
    }

    /// Create a generator with a custom initial volume and frequency.
    pub fn with_values(volume: f32, frequency: f32) -> SineGenerator {
        let config = GeneratorConfig {
            volume,
            frequency,
            ..Default::default()
        };
        let device = HostDevice::new();
        let stream = device.stream();

        SineGenerator {
            generator: SignalGenerator::new(device, config),
            stream,
        }
    }

    /// Register the render callback. Returns `false` on failure.
    pub fn initialize(&mut self) -> bool {
        self.generator.initialize().is_ok()
    }

    /// Unregister the render callback and stop playback.
    pub fn release(&mut self) {
        self.generator.release();
    }

    pub fn start(&self) {
        self.generator.start();
    }

    pub fn stop(&self) {
        self.generator.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.generator.is_playing()
    }

    pub fn set_volume(&self, volume: f32) {
        self.generator.set_volume(volume);
    }

    pub fn get_volume(&self) -> f32 {
        self.generator.get_volume()
    }

    pub fn set_frequency(&self, frequency: f32) {
        self.generator.set_frequency(frequency);
    }

    pub fn get_frequency(&self) -> f32 {
        self.generator.get_frequency()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AudioWorklet side
    // ─────────────────────────────────────────────────────────────────────────

    /// The AudioContext is running at `sample_rate` Hz.
    pub fn about_to_start(&self, sample_rate: f64) {
        self.stream.about_to_start(sample_rate);
    }

    /// The AudioContext was suspended or closed.
    pub fn stopped(&self) {
        self.stream.stopped();
    }

    /// Render one block into the worklet's left and right channel arrays.
    pub fn render(&self, left: &mut [f32], right: &mut [f32]) {
        self.stream.render_channels(&mut [left, right]);
    }

    /// Render one block into a single (mono) channel array.
    pub fn render_mono(&self, output: &mut [f32]) {
        self.stream.render_channels(&mut [output]);
    }
}

impl Default for SineGenerator {
    fn default() -> Self {
        Self::new()
    }
}
