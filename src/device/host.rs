// src/device/host.rs
//
// Device driven by the embedding host's own audio callback.
//
// Used when the platform audio stack lives outside Rust (AVAudioEngine
// source node, Android Oboe, a Web AudioWorklet) and for tests. The host
// calls [`HostStream`] from its real-time thread; the generator registers
// its callback through [`HostDevice`] on the control thread.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering},
};

use spin::Mutex;

use crate::audio_buffer::AudioBuffer;
use crate::config::DEFAULT_SAMPLE_RATE;
use crate::error::DeviceInitError;

use super::{AudioDevice, DeviceCallback};

/// Scratch frames preallocated per channel for split-channel rendering.
const SCRATCH_FRAMES: usize = 4096;

struct Slot {
    callback: Option<Box<dyn DeviceCallback>>,
    /// Planar scratch for hosts that hand over separate channel pointers
    scratch: Vec<f32>,
}

struct HostShared {
    /// Callback slot. The audio thread only ever `try_lock`s it and falls
    /// back to silence; the control thread holds it for open/close only.
    slot: Mutex<Slot>,

    running: AtomicBool,
    /// Mirrors `slot.callback.is_some()` without taking the lock
    registered: AtomicBool,
    /// Set when a stream start has not yet been delivered to the callback
    start_pending: AtomicBool,
    /// Set when a stream stop has not yet been delivered to the callback
    stop_pending: AtomicBool,
    sample_rate_bits: AtomicU64,
    channels: AtomicU16,
}

/// Control-thread side of a host-driven device.
pub struct HostDevice {
    shared: Arc<HostShared>,

    #[cfg(test)]
    fail_next_open: Option<DeviceInitError>,
}

/// Audio-thread side of a host-driven device.
///
/// Cheap to clone. Every method is non-blocking and allocation-free
/// (except for growing the scratch buffer past its preallocated size).
#[derive(Clone)]
pub struct HostStream {
    shared: Arc<HostShared>,
}

impl HostDevice {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(HostShared {
                slot: Mutex::new(Slot {
                    callback: None,
                    scratch: vec![0.0; SCRATCH_FRAMES * 2],
                }),
                running: AtomicBool::new(false),
                registered: AtomicBool::new(false),
                start_pending: AtomicBool::new(false),
                stop_pending: AtomicBool::new(false),
                sample_rate_bits: AtomicU64::new(DEFAULT_SAMPLE_RATE.to_bits()),
                channels: AtomicU16::new(0),
            }),
            #[cfg(test)]
            fail_next_open: None,
        }
    }

    /// Handle for the host's audio callback.
    pub fn stream(&self) -> HostStream {
        HostStream {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Make the next `open` fail with `error`.
    #[cfg(test)]
    pub(crate) fn fail_next_open(&mut self, error: DeviceInitError) {
        self.fail_next_open = Some(error);
    }

    #[cfg(test)]
    fn take_injected_failure(&mut self) -> Option<DeviceInitError> {
        self.fail_next_open.take()
    }

    #[cfg(not(test))]
    fn take_injected_failure(&mut self) -> Option<DeviceInitError> {
        None
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for HostDevice {
    fn open(
        &mut self,
        output_channels: u16,
        callback: Box<dyn DeviceCallback>,
    ) -> Result<(), DeviceInitError> {
        if output_channels == 0 {
            return Err(DeviceInitError::InvalidChannelCount(output_channels));
        }

        if let Some(error) = self.take_injected_failure() {
            return Err(error);
        }

        let mut slot = self.shared.slot.lock();
        if slot.callback.is_some() {
            return Err(DeviceInitError::AlreadyOpen);
        }

        self.shared
            .channels
            .store(output_channels, Ordering::Relaxed);

        // A fresh callback has no stop to catch up on. If the host stream is
        // already running, deliver the start before the first render.
        self.shared.stop_pending.store(false, Ordering::Release);
        if self.shared.running.load(Ordering::Acquire) {
            self.shared.start_pending.store(true, Ordering::Release);
        }

        slot.callback = Some(callback);
        self.shared.registered.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&mut self) {
        let callback = {
            let mut slot = self.shared.slot.lock();
            self.shared.registered.store(false, Ordering::Release);
            slot.callback.take()
        };

        if let Some(mut callback) = callback {
            if self.shared.running.load(Ordering::Acquire) {
                callback.stopped();
            }
        }
        self.shared.start_pending.store(false, Ordering::Release);
        self.shared.stop_pending.store(false, Ordering::Release);
    }

    fn is_open(&self) -> bool {
        self.shared.registered.load(Ordering::Acquire)
    }
}

impl Drop for HostDevice {
    fn drop(&mut self) {
        self.close();
    }
}

// ═══════════════════════════════════════════════════════════════════
// HostStream - Audio Thread API
// ═══════════════════════════════════════════════════════════════════

impl HostStream {
    /// The host stream is starting at `sample_rate` Hz.
    pub fn about_to_start(&self, sample_rate: f64) {
        self.shared
            .sample_rate_bits
            .store(sample_rate.to_bits(), Ordering::Relaxed);
        self.shared.running.store(true, Ordering::Release);
        self.shared.start_pending.store(true, Ordering::Release);
        self.try_deliver_pending();
    }

    /// The host stream has stopped.
    ///
    /// If the slot is busy the notification is queued and delivered before
    /// the next start or render.
    pub fn stopped(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.start_pending.store(false, Ordering::Release);
        self.shared.stop_pending.store(true, Ordering::Release);
        self.try_deliver_pending();
    }

    /// Render into a planar buffer. Writes silence if nothing is registered.
    pub fn render(&self, output: &mut AudioBuffer) {
        let frames = output.frames;

        let Some(mut slot) = self.shared.slot.try_lock() else {
            output.clear();
            return;
        };
        let Some(callback) = slot.callback.as_mut() else {
            output.clear();
            return;
        };

        self.deliver_pending(&mut **callback);
        callback.render(output, frames);
    }

    /// Render into separate per-channel slices (e.g., left and right pointers
    /// from a host callback). The frame count is the shortest slice.
    pub fn render_channels(&self, outputs: &mut [&mut [f32]]) {
        let channels = outputs.len();
        let frames = outputs.iter().map(|ch| ch.len()).min().unwrap_or(0);

        let rendered = self.with_rendered(channels, frames, |buffer| {
            for (ch, out) in outputs.iter_mut().enumerate() {
                out[..frames].copy_from_slice(buffer.channel(ch));
                out[frames..].fill(0.0);
            }
        });

        if !rendered {
            for out in outputs.iter_mut() {
                out.fill(0.0);
            }
        }
    }

    /// Render into an interleaved buffer `[L0, R0, L1, R1, ...]`.
    pub fn render_interleaved(&self, output: &mut [f32], channels: usize) {
        if channels == 0 {
            output.fill(0.0);
            return;
        }
        let frames = output.len() / channels;

        let rendered = self.with_rendered(channels, frames, |buffer| {
            buffer.interleave(output, |s| s);
        });

        if !rendered {
            output.fill(0.0);
        } else {
            output[frames * channels..].fill(0.0);
        }
    }

    /// Whether the host has reported the stream as running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Channel count requested by the registered callback, 0 if never opened.
    pub fn channels(&self) -> u16 {
        self.shared.channels.load(Ordering::Relaxed)
    }

    /// Last sample rate reported by the host.
    pub fn sample_rate(&self) -> f64 {
        f64::from_bits(self.shared.sample_rate_bits.load(Ordering::Relaxed))
    }

    fn try_deliver_pending(&self) {
        if let Some(mut slot) = self.shared.slot.try_lock() {
            if let Some(callback) = slot.callback.as_mut() {
                self.deliver_pending(&mut **callback);
            }
        }
    }

    /// Deliver queued lifecycle notifications, stop before start.
    fn deliver_pending(&self, callback: &mut dyn DeviceCallback) {
        if self.shared.stop_pending.swap(false, Ordering::AcqRel) {
            callback.stopped();
        }
        if self.shared.start_pending.swap(false, Ordering::AcqRel) {
            callback.about_to_start(self.sample_rate());
        }
    }

    /// Render `frames` frames into the scratch buffer and hand it to `f`.
    ///
    /// Returns `false` without calling `f` if the slot is busy or empty.
    fn with_rendered(
        &self,
        channels: usize,
        frames: usize,
        f: impl FnOnce(&AudioBuffer),
    ) -> bool {
        if channels == 0 {
            return false;
        }
        let Some(mut guard) = self.shared.slot.try_lock() else {
            return false;
        };
        let Slot { callback, scratch } = &mut *guard;
        let Some(callback) = callback.as_mut() else {
            return false;
        };

        let needed = channels * frames;
        if scratch.len() < needed {
            scratch.resize(needed, 0.0);
        }

        self.deliver_pending(&mut **callback);

        let mut buffer = AudioBuffer::new(&mut scratch[..needed], channels);
        callback.render(&mut buffer, frames);
        f(&buffer);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what the device asked of it.
    #[derive(Default)]
    struct Probe {
        starts: Arc<AtomicU64>,
        stops: Arc<AtomicU64>,
    }

    impl DeviceCallback for Probe {
        fn render(&mut self, output: &mut AudioBuffer, frames: usize) {
            for ch in 0..output.channels {
                output.channel_mut(ch)[..frames].fill(ch as f32 + 1.0);
            }
        }

        fn about_to_start(&mut self, _sample_rate: f64) {
            self.starts.fetch_add(1, Ordering::Relaxed);
        }

        fn stopped(&mut self) {
            self.stops.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_render_without_callback_is_silent() {
        let device = HostDevice::new();
        let stream = device.stream();

        let mut data = vec![1.0; 8];
        let mut buffer = AudioBuffer::new(&mut data, 2);
        stream.render(&mut buffer);
        assert!(data.iter().all(|&s| s == 0.0));

        let mut left = [1.0; 4];
        let mut right = [1.0; 4];
        stream.render_channels(&mut [&mut left[..], &mut right[..]]);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn test_open_rejects_zero_channels() {
        let mut device = HostDevice::new();
        let result = device.open(0, Box::new(Probe::default()));

        assert_eq!(result, Err(DeviceInitError::InvalidChannelCount(0)));
        assert!(!device.is_open());
    }

    #[test]
    fn test_open_twice_fails() {
        let mut device = HostDevice::new();
        device.open(2, Box::new(Probe::default())).unwrap();

        let result = device.open(2, Box::new(Probe::default()));
        assert_eq!(result, Err(DeviceInitError::AlreadyOpen));
        assert!(device.is_open());
    }

    #[test]
    fn test_lifecycle_forwarding() {
        let probe = Probe::default();
        let starts = Arc::clone(&probe.starts);
        let stops = Arc::clone(&probe.stops);

        let mut device = HostDevice::new();
        let stream = device.stream();
        device.open(2, Box::new(probe)).unwrap();

        stream.about_to_start(48_000.0);
        assert_eq!(starts.load(Ordering::Relaxed), 1);
        assert!(stream.is_running());

        stream.stopped();
        assert_eq!(stops.load(Ordering::Relaxed), 1);

        stream.about_to_start(48_000.0);
        device.close();
        assert_eq!(stops.load(Ordering::Relaxed), 2);
        assert!(!device.is_open());
    }

    #[test]
    fn test_open_on_running_stream_delivers_start() {
        let probe = Probe::default();
        let starts = Arc::clone(&probe.starts);

        let mut device = HostDevice::new();
        let stream = device.stream();
        stream.about_to_start(44_100.0);

        device.open(2, Box::new(probe)).unwrap();
        assert_eq!(starts.load(Ordering::Relaxed), 0);

        let mut data = vec![0.0; 8];
        stream.render(&mut AudioBuffer::new(&mut data, 2));
        assert_eq!(starts.load(Ordering::Relaxed), 1);

        stream.render(&mut AudioBuffer::new(&mut data, 2));
        assert_eq!(starts.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_stop_while_slot_busy_is_queued() {
        let probe = Probe::default();
        let starts = Arc::clone(&probe.starts);
        let stops = Arc::clone(&probe.stops);

        let mut device = HostDevice::new();
        let stream = device.stream();
        device.open(2, Box::new(probe)).unwrap();
        stream.about_to_start(48_000.0);

        // Control thread holds the slot while the host stops
        {
            let _slot = device.shared.slot.lock();
            stream.stopped();
        }
        assert_eq!(stops.load(Ordering::Relaxed), 0);

        stream.about_to_start(48_000.0);
        assert_eq!(stops.load(Ordering::Relaxed), 1);
        assert_eq!(starts.load(Ordering::Relaxed), 2);

        // Missed stop is also caught up by the next render
        {
            let _slot = device.shared.slot.lock();
            stream.stopped();
        }
        let mut data = vec![0.0; 8];
        stream.render(&mut AudioBuffer::new(&mut data, 2));
        assert_eq!(stops.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_stale_stop_not_delivered_to_new_callback() {
        let probe = Probe::default();
        let stops = Arc::clone(&probe.stops);

        let mut device = HostDevice::new();
        let stream = device.stream();
        stream.about_to_start(48_000.0);
        stream.stopped();

        device.open(2, Box::new(probe)).unwrap();
        let mut data = vec![0.0; 8];
        stream.render(&mut AudioBuffer::new(&mut data, 2));
        assert_eq!(stops.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_is_open_is_lock_free() {
        let mut device = HostDevice::new();
        let stream = device.stream();
        device.open(2, Box::new(Probe::default())).unwrap();

        // Polling registration never takes the slot
        {
            let _slot = device.shared.slot.lock();
            assert!(device.is_open());
        }

        let mut data = vec![0.0; 8];
        stream.render(&mut AudioBuffer::new(&mut data, 2));
        assert_eq!(data, [1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]);

        device.close();
        assert!(!device.is_open());
    }

    #[test]
    fn test_render_channels_and_interleaved() {
        let mut device = HostDevice::new();
        let stream = device.stream();
        device.open(2, Box::new(Probe::default())).unwrap();

        let mut left = [0.0; 3];
        let mut right = [0.0; 5];
        stream.render_channels(&mut [&mut left[..], &mut right[..]]);
        assert_eq!(left, [1.0; 3]);
        assert_eq!(right, [2.0, 2.0, 2.0, 0.0, 0.0]);

        let mut interleaved = [9.0; 7];
        stream.render_interleaved(&mut interleaved, 2);
        assert_eq!(interleaved, [1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_scratch_grows_for_large_buffers() {
        let mut device = HostDevice::new();
        let stream = device.stream();
        device.open(2, Box::new(Probe::default())).unwrap();

        let mut left = vec![0.0; SCRATCH_FRAMES * 2];
        let mut right = vec![0.0; SCRATCH_FRAMES * 2];
        stream.render_channels(&mut [&mut left[..], &mut right[..]]);
        assert!(left.iter().all(|&s| s == 1.0));
        assert!(right.iter().all(|&s| s == 2.0));
    }
}
