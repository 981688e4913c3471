// src/config.rs
//
// Generator configuration and parameter ranges.

/// Lowest accepted output volume.
pub const MIN_VOLUME: f32 = 0.0;
/// Highest accepted output volume.
pub const MAX_VOLUME: f32 = 1.0;
/// Lowest accepted frequency in Hz.
pub const MIN_FREQUENCY: f32 = 20.0;
/// Highest accepted frequency in Hz.
pub const MAX_FREQUENCY: f32 = 20_000.0;

pub const DEFAULT_VOLUME: f32 = 0.5;
pub const DEFAULT_FREQUENCY: f32 = 440.0;
pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;
pub const DEFAULT_OUTPUT_CHANNELS: u16 = 2;

/// Configuration for creating a signal generator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    /// Number of output channels requested from the device (e.g., 2 for stereo).
    pub output_channels: u16,
    /// Initial volume in [0.0, 1.0].
    pub volume: f32,
    /// Initial frequency in Hz.
    pub frequency: f32,
    /// Sample rate assumed until the device reports its own (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_channels: DEFAULT_OUTPUT_CHANNELS,
            volume: DEFAULT_VOLUME,
            frequency: DEFAULT_FREQUENCY,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Clamp a volume into [`MIN_VOLUME`, `MAX_VOLUME`]. NaN maps to the lower bound.
#[inline]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return MIN_VOLUME;
    }
    volume.clamp(MIN_VOLUME, MAX_VOLUME)
}

/// Clamp a frequency into [`MIN_FREQUENCY`, `MAX_FREQUENCY`]. NaN maps to the lower bound.
#[inline]
pub fn clamp_frequency(frequency: f32) -> f32 {
    if frequency.is_nan() {
        return MIN_FREQUENCY;
    }
    frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
}

/// A sample rate is usable if it is finite and positive.
#[inline]
pub fn is_valid_sample_rate(sample_rate: f64) -> bool {
    sample_rate.is_finite() && sample_rate > 0.0
}
