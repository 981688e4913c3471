// src/renderer.rs

use std::f64::consts::TAU;
use std::sync::Arc;

use crate::audio_buffer::AudioBuffer;
use crate::bridge::SharedParams;
use crate::device::DeviceCallback;

/// Audio-thread half of the generator.
///
/// This struct runs exclusively on the audio thread.
/// It must be allocation-free and lock-free.
/// Only the audio thread touches `phase`; control values arrive through
/// the shared atomics.
pub struct Renderer {
    params: Arc<SharedParams>,

    /// Running angle in [0, 2π)
    phase: f64,
}

impl Renderer {
    pub(crate) fn new(params: Arc<SharedParams>) -> Self {
        Self { params, phase: 0.0 }
    }

    /// Fill `frames` frames of `output` with the sine wave.
    ///
    /// The whole buffer is cleared first, so every early return leaves
    /// silence. While stopped the phase is left untouched. The same mono
    /// signal is written to every channel.
    pub fn render(&mut self, output: &mut AudioBuffer, frames: usize) {
        output.clear();

        if !self.params.is_playing() {
            return;
        }

        let volume = self.params.volume();
        let increment = self.params.phase_increment();
        let frames = frames.min(output.frames);

        let Some((first, rest)) = output.split_first_channel() else {
            return;
        };

        let mut phase = self.phase;
        for sample in first.iter_mut().take(frames) {
            *sample = phase.sin() as f32 * volume;
            phase += increment;
            // increment is always in [0, 2π)
            if phase >= TAU {
                phase -= TAU;
            }
        }
        self.phase = phase;

        let stride = first.len();
        if stride > 0 {
            for channel in rest.chunks_exact_mut(stride) {
                channel[..frames].copy_from_slice(&first[..frames]);
            }
        }
    }

    /// Stream is starting: take the device rate and restart the waveform at zero.
    pub fn about_to_start(&mut self, sample_rate: f64) {
        self.params.set_sample_rate(sample_rate);
        self.phase = 0.0;
    }

    /// Stream stopped: the next stream starts from zero phase.
    pub fn stopped(&mut self) {
        self.phase = 0.0;
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl DeviceCallback for Renderer {
    #[inline]
    fn render(&mut self, output: &mut AudioBuffer, frames: usize) {
        Renderer::render(self, output, frames);
    }

    fn about_to_start(&mut self, sample_rate: f64) {
        Renderer::about_to_start(self, sample_rate);
    }

    fn stopped(&mut self) {
        Renderer::stopped(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Controls, create_bridge};
    use crate::config::GeneratorConfig;

    const EPSILON: f32 = 1e-5;

    fn setup(frequency: f32, volume: f32, sample_rate: f64) -> (Controls, Renderer) {
        let (controls, mut renderer) = create_bridge(&GeneratorConfig::default());
        controls.set_frequency(frequency);
        controls.set_volume(volume);
        renderer.about_to_start(sample_rate);
        (controls, renderer)
    }

    fn render_stereo(renderer: &mut Renderer, frames: usize) -> Vec<f32> {
        let mut data = vec![0.5; frames * 2];
        let mut buffer = AudioBuffer::new(&mut data, 2);
        renderer.render(&mut buffer, frames);
        data
    }

    #[test]
    fn test_silence_when_stopped() {
        let (_controls, mut renderer) = setup(440.0, 1.0, 48_000.0);

        let data = render_stereo(&mut renderer, 256);
        assert!(data.iter().all(|&s| s == 0.0));
        assert_eq!(renderer.phase(), 0.0);
    }

    #[test]
    fn test_silence_keeps_phase() {
        let (controls, mut renderer) = setup(440.0, 1.0, 48_000.0);
        controls.start();
        render_stereo(&mut renderer, 37);
        let phase = renderer.phase();

        controls.stop();
        let data = render_stereo(&mut renderer, 128);
        assert!(data.iter().all(|&s| s == 0.0));
        assert_eq!(renderer.phase(), phase);
    }

    #[test]
    fn test_440hz_at_44100() {
        let (controls, mut renderer) = setup(440.0, 1.0, 44_100.0);
        controls.start();

        let increment = controls.phase_increment();
        assert!((increment - 0.06268937721).abs() < 1e-9);

        let data = render_stereo(&mut renderer, 128);
        let left = &data[..128];

        assert_eq!(left[0], 0.0);
        assert!((left[1] - 0.0627).abs() < 1e-4);
        assert!((left[100] - (100.0 * increment).sin() as f32).abs() < EPSILON);
        assert!(left[100] < 0.0);

        // 101 increments pass 2π, the phase has wrapped
        let wrapped = 101.0 * increment - TAU;
        assert!((left[101] - wrapped.sin() as f32).abs() < EPSILON);
    }

    #[test]
    fn test_all_channels_identical() {
        let (controls, mut renderer) = setup(1000.0, 0.8, 48_000.0);
        controls.start();

        let frames = 64;
        let mut data = vec![0.0; frames * 4];
        let mut buffer = AudioBuffer::new(&mut data, 4);
        renderer.render(&mut buffer, frames);

        for ch in 1..4 {
            assert_eq!(buffer.channel(ch), buffer.channel(0));
        }
        assert!(buffer.channel(0).iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_consecutive_buffers_are_continuous() {
        let (controls, mut renderer) = setup(440.0, 0.5, 48_000.0);
        controls.start();
        let increment = controls.phase_increment();

        let mut samples = Vec::new();
        for _ in 0..8 {
            let data = render_stereo(&mut renderer, 64);
            samples.extend_from_slice(&data[..64]);
        }

        for (i, &sample) in samples.iter().enumerate() {
            let expected = ((i as f64 * increment) % TAU).sin() as f32 * 0.5;
            assert!((sample - expected).abs() < EPSILON, "sample {} differs", i);
        }
    }

    #[test]
    fn test_phase_stays_in_range() {
        let (controls, mut renderer) = setup(20_000.0, 1.0, 44_100.0);
        controls.start();

        for _ in 0..50 {
            render_stereo(&mut renderer, 97);
            assert!(renderer.phase() >= 0.0 && renderer.phase() < TAU);
        }
    }

    #[test]
    fn test_phase_stays_in_range_when_rate_below_frequency() {
        let (controls, mut renderer) = setup(20_000.0, 1.0, 8_000.0);
        controls.start();

        let data = render_stereo(&mut renderer, 64);
        assert!(renderer.phase() >= 0.0 && renderer.phase() < TAU);

        // Same samples as the unfolded advance of 5π per frame
        for (n, &sample) in data[..64].iter().enumerate() {
            let expected = (n as f64 * 2.5 * TAU).sin() as f32;
            assert!((sample - expected).abs() < EPSILON);
        }
    }

    #[test]
    fn test_about_to_start_resets_phase() {
        let (controls, mut renderer) = setup(440.0, 1.0, 44_100.0);
        controls.start();
        render_stereo(&mut renderer, 50);
        assert!(renderer.phase() > 0.0);

        renderer.about_to_start(48_000.0);
        assert_eq!(renderer.phase(), 0.0);
        assert_eq!(controls.sample_rate(), 48_000.0);
        assert!((controls.phase_increment() - TAU * 440.0 / 48_000.0).abs() < 1e-12);

        let data = render_stereo(&mut renderer, 4);
        assert_eq!(data[0], 0.0);
    }

    #[test]
    fn test_stopped_resets_phase() {
        let (controls, mut renderer) = setup(440.0, 1.0, 44_100.0);
        controls.start();
        render_stereo(&mut renderer, 50);

        renderer.stopped();
        assert_eq!(renderer.phase(), 0.0);
    }

    #[test]
    fn test_stop_start_resumes_mid_phase() {
        let (controls, mut reference) = setup(440.0, 1.0, 44_100.0);
        controls.start();
        let continuous = render_stereo(&mut reference, 65);

        let (controls, mut renderer) = setup(440.0, 1.0, 44_100.0);
        controls.start();
        render_stereo(&mut renderer, 64);
        controls.stop();
        render_stereo(&mut renderer, 32);
        controls.start();
        let resumed = render_stereo(&mut renderer, 1);

        assert!((resumed[0] - continuous[64]).abs() < EPSILON);
        assert_ne!(resumed[0], 0.0);
    }

    #[test]
    fn test_frames_larger_than_buffer() {
        let (controls, mut renderer) = setup(440.0, 1.0, 44_100.0);
        controls.start();

        let mut data = vec![0.0; 16];
        let mut buffer = AudioBuffer::new(&mut data, 2);
        renderer.render(&mut buffer, 1024);

        let expected = 8.0 * controls.phase_increment();
        assert!((renderer.phase() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_volume_applies_on_next_buffer() {
        let (controls, mut renderer) = setup(440.0, 1.0, 44_100.0);
        controls.start();
        render_stereo(&mut renderer, 10);

        controls.set_volume(0.0);
        let data = render_stereo(&mut renderer, 10);
        assert!(data.iter().all(|&s| s == 0.0));
    }
}
