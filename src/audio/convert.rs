//! Conversion of native-format capture audio to mono 16kHz PCM16.
//!
//! Pure functions: the recognition worker calls these once per read cycle.

use crate::defaults;
use crate::error::{RelayError, Result};

/// Native format of a capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl CaptureFormat {
    /// Interleaved sample count covering `ms` milliseconds at this format.
    pub fn samples_for_ms(&self, ms: u32) -> usize {
        (self.sample_rate as usize) * (self.channels as usize) * (ms as usize) / 1000
    }
}

/// Converts interleaved native-format samples to mono samples at the
/// recognizer's target rate.
#[derive(Debug, Clone, Copy)]
pub struct FormatConverter {
    format: CaptureFormat,
    target_rate: u32,
}

impl FormatConverter {
    /// Creates a converter for the given native format, targeting the
    /// default recognition rate.
    pub fn new(format: CaptureFormat) -> Self {
        Self::with_target_rate(format, defaults::TARGET_SAMPLE_RATE)
    }

    /// Creates a converter with an explicit target rate.
    pub fn with_target_rate(format: CaptureFormat, target_rate: u32) -> Self {
        Self {
            format,
            target_rate,
        }
    }

    /// Converts one block of interleaved samples to mono at the target rate.
    ///
    /// Stereo input is mixed with equal weights (0.5/0.5). More than two
    /// channels is unsupported and returns `UnsupportedChannelCount`.
    pub fn to_mono_target(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let mono = match self.format.channels {
            1 => samples.to_vec(),
            2 => samples
                .chunks_exact(2)
                .map(|frame| 0.5 * frame[0] + 0.5 * frame[1])
                .collect(),
            n => {
                return Err(RelayError::UnsupportedChannelCount { channels: n });
            }
        };

        if self.format.sample_rate == self.target_rate {
            Ok(mono)
        } else {
            Ok(resample(&mono, self.format.sample_rate, self.target_rate))
        }
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;

            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Clamps samples to [-1, 1] and scales to signed 16-bit.
pub fn pack_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Peak absolute amplitude of a block, for the near-silence heuristic.
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |max, &s| max.max(s.abs()))
}
