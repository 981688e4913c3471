//! Thread-safe bridge between the control thread and the audio thread.
//!
//! # Architecture
//!
//! - **Control thread** owns [`Controls`] and changes volume, frequency and
//!   the playing flag
//! - **Audio thread** owns the [`Renderer`] and reads those values once per buffer
//! - Communication uses independent atomics; there is no ordering guarantee
//!   across fields, so a change may land mid-buffer or on the next buffer
//!
//! # Usage
//!
//! ```ignore
//! let (controls, mut renderer) = create_bridge(&GeneratorConfig::default());
//!
//! // Control thread
//! controls.set_frequency(880.0);
//! controls.start();
//!
//! // Audio thread
//! renderer.about_to_start(48_000.0);
//! renderer.render(&mut buffer, frames);
//! ```

use std::f64::consts::TAU;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
};

use crate::config::{GeneratorConfig, clamp_frequency, clamp_volume, is_valid_sample_rate};
use crate::renderer::Renderer;

/// Per-sample phase advance for `frequency` at `sample_rate`, folded into
/// `[0, 2π)`.
///
/// Folding leaves `sin` unchanged and keeps a single wrap per sample enough
/// even when the device rate is at or below the frequency.
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f64) -> f64 {
    (TAU * frequency as f64 / sample_rate) % TAU
}

/// Lock-free parameter block shared by both halves of the bridge.
///
/// Floats are stored as bit patterns (no AtomicF32/AtomicF64 in std).
pub(crate) struct SharedParams {
    volume_bits: AtomicU32,
    frequency_bits: AtomicU32,
    playing: AtomicBool,
    sample_rate_bits: AtomicU64,
    phase_increment_bits: AtomicU64,
}

impl SharedParams {
    fn new(config: &GeneratorConfig) -> Self {
        let sample_rate = if is_valid_sample_rate(config.sample_rate) {
            config.sample_rate
        } else {
            crate::config::DEFAULT_SAMPLE_RATE
        };
        let frequency = clamp_frequency(config.frequency);

        Self {
            volume_bits: AtomicU32::new(clamp_volume(config.volume).to_bits()),
            frequency_bits: AtomicU32::new(frequency.to_bits()),
            playing: AtomicBool::new(false),
            sample_rate_bits: AtomicU64::new(sample_rate.to_bits()),
            phase_increment_bits: AtomicU64::new(
                phase_increment(frequency, sample_rate).to_bits(),
            ),
        }
    }

    #[inline]
    pub(crate) fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn frequency(&self) -> f32 {
        f32::from_bits(self.frequency_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn sample_rate(&self) -> f64 {
        f64::from_bits(self.sample_rate_bits.load(Ordering::SeqCst))
    }

    #[inline]
    pub(crate) fn phase_increment(&self) -> f64 {
        f64::from_bits(self.phase_increment_bits.load(Ordering::Acquire))
    }

    pub(crate) fn set_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.volume_bits.store(volume.to_bits(), Ordering::Relaxed);
        volume
    }

    pub(crate) fn set_frequency(&self, frequency: f32) -> f32 {
        let frequency = clamp_frequency(frequency);
        self.frequency_bits
            .store(frequency.to_bits(), Ordering::SeqCst);
        self.refresh_phase_increment();
        frequency
    }

    /// Returns the previous playing state.
    pub(crate) fn set_playing(&self, playing: bool) -> bool {
        self.playing.swap(playing, Ordering::AcqRel)
    }

    /// Store a device-reported sample rate. Invalid rates are ignored.
    pub(crate) fn set_sample_rate(&self, sample_rate: f64) {
        if !is_valid_sample_rate(sample_rate) {
            return;
        }
        self.sample_rate_bits
            .store(sample_rate.to_bits(), Ordering::SeqCst);
        self.refresh_phase_increment();
    }

    /// Recompute the phase increment from the latest frequency and sample rate.
    ///
    /// Frequency and sample rate have different writers (control thread and
    /// device start). The increment is re-derived until both inputs are
    /// unchanged across the store, so the last value written never pairs an
    /// old frequency with a new sample rate or vice versa.
    pub(crate) fn refresh_phase_increment(&self) {
        loop {
            let frequency = self.frequency_bits.load(Ordering::SeqCst);
            let sample_rate = self.sample_rate_bits.load(Ordering::SeqCst);

            let increment = phase_increment(f32::from_bits(frequency), f64::from_bits(sample_rate));
            self.phase_increment_bits
                .store(increment.to_bits(), Ordering::SeqCst);

            if self.frequency_bits.load(Ordering::SeqCst) == frequency
                && self.sample_rate_bits.load(Ordering::SeqCst) == sample_rate
            {
                break;
            }
        }
    }
}

/// Handle for the control thread.
///
/// Cheap to clone; every clone drives the same generator. All methods are
/// safe to call from any non-real-time thread, concurrently with rendering.
#[derive(Clone)]
pub struct Controls {
    params: Arc<SharedParams>,
}

/// Create a linked pair of handles for control and audio threads.
pub fn create_bridge(config: &GeneratorConfig) -> (Controls, Renderer) {
    let params = Arc::new(SharedParams::new(config));
    let renderer = Renderer::new(Arc::clone(&params));
    (Controls { params }, renderer)
}

// ═══════════════════════════════════════════════════════════════════
// Controls - Control Thread API
// ═══════════════════════════════════════════════════════════════════

impl Controls {
    /// Start playback. Idempotent.
    ///
    /// The phase increment is recomputed on the stopped -> playing edge in
    /// case the frequency changed while stopped.
    pub fn start(&self) {
        if !self.params.set_playing(true) {
            self.params.refresh_phase_increment();
        }
    }

    /// Stop playback. Idempotent; the phase is kept so a later start resumes mid-cycle.
    pub fn stop(&self) {
        self.params.set_playing(false);
    }

    pub fn is_playing(&self) -> bool {
        self.params.is_playing()
    }

    /// Set the output volume, clamped to [0, 1]. Returns the stored value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.params.set_volume(volume)
    }

    pub fn volume(&self) -> f32 {
        self.params.volume()
    }

    /// Set the frequency, clamped to [20, 20000] Hz. Returns the stored value.
    ///
    /// The renderer may see the new frequency and the new phase increment
    /// one buffer apart.
    pub fn set_frequency(&self, frequency: f32) -> f32 {
        self.params.set_frequency(frequency)
    }

    pub fn frequency(&self) -> f32 {
        self.params.frequency()
    }

    /// Most recently known device sample rate.
    pub fn sample_rate(&self) -> f64 {
        self.params.sample_rate()
    }

    /// Current per-sample phase advance in radians.
    pub fn phase_increment(&self) -> f64 {
        self.params.phase_increment()
    }

    /// Create a fresh renderer bound to these controls, with phase at zero.
    ///
    /// Used to hand a new callback to a device after a failed or closed stream.
    pub fn create_renderer(&self) -> Renderer {
        Renderer::new(Arc::clone(&self.params))
    }
}
