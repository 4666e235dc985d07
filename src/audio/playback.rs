//! Synchronous audio playback for synthesized speech.
//!
//! The synthesis worker decodes each WAV result and plays it to completion
//! before touching the next utterance, so utterances never overlap.

use crate::error::{RelayError, Result};
use std::io::Cursor;
use std::sync::atomic::AtomicBool;

/// Trait for playback endpoints consumed by the synthesis worker.
pub trait PlaybackSink: Send {
    /// Decodes a WAV payload and plays it, blocking until playback
    /// completes. Returns early, releasing the device, when `running`
    /// clears mid-clip.
    fn play_wav(&mut self, wav: &[u8], running: &AtomicBool) -> Result<()>;
}

/// A decoded mono audio clip.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Mono samples in [-1, 1].
    pub samples: Vec<f32>,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
}

/// Decodes a WAV payload into mono f32 samples.
///
/// Stereo sources are mixed with equal weights. Supports 16-bit integer and
/// 32-bit float encodings, which covers common synthesis output.
///
/// # Errors
/// Returns `RelayError::Playback` for malformed or empty payloads.
pub fn decode_wav(wav: &[u8]) -> Result<DecodedClip> {
    let mut reader = hound::WavReader::new(Cursor::new(wav)).map_err(|e| RelayError::Playback {
        message: format!("Failed to parse WAV payload: {}", e),
    })?;

    let spec = reader.spec();
    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / -(i16::MIN as f32)))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| RelayError::Playback {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| RelayError::Playback {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
        (fmt, bits) => {
            return Err(RelayError::Playback {
                message: format!("Unsupported WAV encoding: {:?}/{} bit", fmt, bits),
            });
        }
    };

    if interleaved.is_empty() {
        return Err(RelayError::Playback {
            message: "WAV payload contains no samples".to_string(),
        });
    }

    let samples = match spec.channels {
        1 => interleaved,
        2 => interleaved
            .chunks_exact(2)
            .map(|frame| 0.5 * frame[0] + 0.5 * frame[1])
            .collect(),
        n => {
            return Err(RelayError::Playback {
                message: format!("Unsupported WAV channel count: {}", n),
            });
        }
    };

    Ok(DecodedClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Mock playback sink for testing.
///
/// Records every played payload in order without touching any device.
#[derive(Debug, Default)]
pub struct MockPlayback {
    played: Vec<Vec<u8>>,
    fail: bool,
}

impl MockPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every `play_wav` call to fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Payloads played so far, in playback order.
    pub fn played(&self) -> &[Vec<u8>] {
        &self.played
    }
}

impl PlaybackSink for MockPlayback {
    fn play_wav(&mut self, wav: &[u8], _running: &AtomicBool) -> Result<()> {
        if self.fail {
            return Err(RelayError::Playback {
                message: "mock playback failure".to_string(),
            });
        }
        self.played.push(wav.to_vec());
        Ok(())
    }
}

#[cfg(feature = "cpal-audio")]
pub use cpal_impl::CpalPlayback;

#[cfg(feature = "cpal-audio")]
mod cpal_impl {
    use super::{DecodedClip, PlaybackSink, decode_wav};
    use crate::audio::convert;
    use crate::defaults;
    use crate::error::{RelayError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    /// Playback endpoint bound to one output device for a session.
    ///
    /// Prefers a virtual cable device ("CABLE Input"/"VB-Audio") when no
    /// explicit name is configured, falling back to the system default.
    pub struct CpalPlayback {
        device: cpal::Device,
        config: cpal::StreamConfig,
    }

    impl CpalPlayback {
        /// Opens the named output device, a preferred virtual cable, or the
        /// system default, in that order.
        ///
        /// # Errors
        /// Returns `AudioDeviceNotFound` when an explicitly named device is
        /// absent, `Playback` when no output device exists at all.
        pub fn new(device_name: Option<&str>) -> Result<Self> {
            let device = crate::audio::with_suppressed_stderr(|| {
                let host = cpal::default_host();

                if let Some(name) = device_name {
                    let devices = host.output_devices().map_err(|e| RelayError::Playback {
                        message: format!("Failed to enumerate output devices: {}", e),
                    })?;
                    for dev in devices {
                        if let Ok(dev_name) = dev.name()
                            && dev_name == name
                        {
                            return Ok(dev);
                        }
                    }
                    return Err(RelayError::AudioDeviceNotFound {
                        device: name.to_string(),
                    });
                }

                // No explicit selection: look for a virtual cable endpoint
                if let Ok(devices) = host.output_devices() {
                    for dev in devices {
                        if let Ok(dev_name) = dev.name()
                            && defaults::PREFERRED_OUTPUT_DEVICES
                                .iter()
                                .any(|p| dev_name.contains(p))
                        {
                            return Ok(dev);
                        }
                    }
                }

                host.default_output_device()
                    .ok_or_else(|| RelayError::Playback {
                        message: "No output device available".to_string(),
                    })
            })?;

            let default_config =
                device
                    .default_output_config()
                    .map_err(|e| RelayError::Playback {
                        message: format!("Failed to query output config: {}", e),
                    })?;

            Ok(Self {
                config: default_config.into(),
                device,
            })
        }

        /// Plays a decoded clip, blocking until the device drains it or
        /// `running` clears.
        fn play_clip(&self, clip: &DecodedClip, running: &AtomicBool) -> Result<()> {
            let device_rate = self.config.sample_rate.0;
            let channels = self.config.channels as usize;
            let samples: Arc<Vec<f32>> = Arc::new(convert::resample(
                &clip.samples,
                clip.sample_rate,
                device_rate,
            ));

            let finished = Arc::new(AtomicBool::new(false));
            let finished_cb = Arc::clone(&finished);
            let samples_cb = Arc::clone(&samples);
            let mut position = 0usize;

            let stream = self
                .device
                .build_output_stream(
                    &self.config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for frame in data.chunks_mut(channels) {
                            let sample = if position < samples_cb.len() {
                                let s = samples_cb[position];
                                position += 1;
                                s
                            } else {
                                finished_cb.store(true, Ordering::Relaxed);
                                0.0
                            };
                            for out in frame.iter_mut() {
                                *out = sample;
                            }
                        }
                    },
                    |err| {
                        eprintln!("revoice: audio playback error: {}", err);
                    },
                    None,
                )
                .map_err(|e| RelayError::Playback {
                    message: format!("Failed to build output stream: {}", e),
                })?;

            stream.play().map_err(|e| RelayError::Playback {
                message: format!("Failed to start playback: {}", e),
            })?;

            // Wait for the callback to run out of samples, bounded by the
            // clip duration plus a margin in case the device stalls. A
            // session stop abandons the rest of the clip immediately.
            let duration_ms = samples.len() as u64 * 1000 / u64::from(device_rate.max(1));
            let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);
            while !finished.load(Ordering::Relaxed) && running.load(Ordering::Relaxed) {
                if Instant::now() >= deadline {
                    break;
                }
                std::thread::sleep(Duration::from_millis(10));
            }

            drop(stream);
            Ok(())
        }
    }

    impl PlaybackSink for CpalPlayback {
        fn play_wav(&mut self, wav: &[u8], running: &AtomicBool) -> Result<()> {
            let clip = decode_wav(wav)?;
            self.play_clip(&clip, running)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn mono_spec(rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn test_decode_mono_pcm16() {
        let wav = wav_bytes(mono_spec(22050), &[0, i16::MAX, i16::MIN]);
        let clip = decode_wav(&wav).unwrap();

        assert_eq!(clip.sample_rate, 22050);
        assert_eq!(clip.samples.len(), 3);
        assert_eq!(clip.samples[0], 0.0);
        assert!((clip.samples[1] - (i16::MAX as f32 / 32768.0)).abs() < 1e-6);
        assert!((clip.samples[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_stereo_mixes_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            ..mono_spec(16000)
        };
        // L = 16384, R = 0 → mixed ≈ 0.25
        let wav = wav_bytes(spec, &[16384, 0]);
        let clip = decode_wav(&wav).unwrap();

        assert_eq!(clip.samples.len(), 1);
        assert!((clip.samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_wav(b"not a wav file").is_err());
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let wav = wav_bytes(mono_spec(16000), &[]);
        match decode_wav(&wav) {
            Err(RelayError::Playback { message }) => {
                assert!(message.contains("no samples"));
            }
            _ => panic!("Expected Playback error for empty WAV"),
        }
    }

    #[test]
    fn test_mock_playback_records_order() {
        let running = AtomicBool::new(true);
        let mut sink = MockPlayback::new();
        sink.play_wav(b"first", &running).unwrap();
        sink.play_wav(b"second", &running).unwrap();

        assert_eq!(sink.played().len(), 2);
        assert_eq!(sink.played()[0], b"first");
        assert_eq!(sink.played()[1], b"second");
    }

    #[test]
    fn test_mock_playback_failure() {
        let mut sink = MockPlayback::new().with_failure();
        assert!(sink.play_wav(b"anything", &AtomicBool::new(true)).is_err());
    }
}
