// src/lib.rs
//
// Library entry point for FFI consumers (iOS/Swift, Android/JNI) and Rust hosts.

mod audio_buffer;
mod bridge;
mod config;
mod device;
mod error;
mod generator;
mod renderer;

pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;


// Re-export key types for Rust consumers
pub use audio_buffer::AudioBuffer;
pub use bridge::{Controls, create_bridge, phase_increment};
pub use config::{
    DEFAULT_FREQUENCY, DEFAULT_OUTPUT_CHANNELS, DEFAULT_SAMPLE_RATE, DEFAULT_VOLUME,
    GeneratorConfig, MAX_FREQUENCY, MAX_VOLUME, MIN_FREQUENCY, MIN_VOLUME,
};
pub use device::{AudioDevice, DeviceCallback, HostDevice, HostStream};
pub use error::DeviceInitError;
pub use generator::SignalGenerator;
pub use renderer::Renderer;

#[cfg(feature = "cpal")]
pub use device::CpalDevice;
