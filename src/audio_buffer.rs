// src/audio_buffer.rs

/// Planar view over caller-owned output samples.
///
/// Layout is channel-major: `[ch0 f0..fN, ch1 f0..fN, ...]`.
#[derive(Debug)]
pub struct AudioBuffer<'a> {
    pub channels: usize,
    pub frames: usize,
    pub data: &'a mut [f32],
}

impl<'a> AudioBuffer<'a> {
    /// Create a new AudioBuffer wrapping existing data.
    ///
    /// Trailing samples that do not fill a whole frame are ignored.
    #[inline]
    pub fn new(data: &'a mut [f32], channels: usize) -> Self {
        let frames = if channels == 0 { 0 } else { data.len() / channels };
        Self {
            channels,
            frames,
            data,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.frames;
        &self.data[start..start + self.frames]
    }

    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.frames;
        &mut self.data[start..start + self.frames]
    }

    /// Split into the first channel and the remaining channels.
    ///
    /// Returns `None` for a buffer without channels.
    #[inline]
    pub fn split_first_channel(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        if self.channels == 0 {
            return None;
        }
        let used = self.channels * self.frames;
        Some(self.data[..used].split_at_mut(self.frames))
    }

    /// Write the planar contents into an interleaved buffer `[L0, R0, L1, R1, ...]`,
    /// converting each sample with `convert`.
    ///
    /// Writes `min(self.frames, out.len() / channels)` frames.
    #[inline]
    pub fn interleave<T>(&self, out: &mut [T], convert: impl Fn(f32) -> T) {
        if self.channels == 0 {
            return;
        }
        for (frame, slot) in out
            .chunks_exact_mut(self.channels)
            .take(self.frames)
            .enumerate()
        {
            for (ch, sample) in slot.iter_mut().enumerate() {
                *sample = convert(self.data[ch * self.frames + frame]);
            }
        }
    }
}
