//! Audio capture sources.
//!
//! The platform-driven capture callback writes native-format samples into a
//! [`RingCaptureBuffer`]; the recognition worker drains it in fixed-duration
//! blocks. The `CaptureSource` trait allows swapping the real CPAL device
//! for a mock in tests.

use crate::audio::convert::CaptureFormat;
use crate::error::Result;

/// Trait for capture devices feeding the recognition pipeline.
///
/// Implementations buffer captured audio internally (bounded,
/// discard-oldest) so `drain` never blocks and never waits on hardware.
pub trait CaptureSource: Send {
    /// Starts the capture stream.
    fn start(&mut self) -> Result<()>;

    /// Stops the capture stream and releases the device.
    fn stop(&mut self) -> Result<()>;

    /// Native format of the captured audio.
    fn format(&self) -> CaptureFormat;

    /// Removes up to `max_samples` interleaved samples from the capture
    /// buffer. Returns an empty vector when nothing has arrived yet.
    fn drain(&mut self, max_samples: usize) -> Vec<f32>;
}

/// Mock capture source for testing.
///
/// Yields pre-configured blocks, one per `drain` call, then empties.
pub struct MockCaptureSource {
    format: CaptureFormat,
    blocks: std::collections::VecDeque<Vec<f32>>,
    started: bool,
    stopped: std::sync::Arc<std::sync::atomic::AtomicBool>,
    fail_start: bool,
}

impl MockCaptureSource {
    /// Creates a mock at 16kHz mono with no queued audio.
    pub fn new() -> Self {
        Self {
            format: CaptureFormat {
                sample_rate: crate::defaults::TARGET_SAMPLE_RATE,
                channels: 1,
            },
            blocks: std::collections::VecDeque::new(),
            started: false,
            stopped: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
            fail_start: false,
        }
    }

    /// Sets the reported native format.
    pub fn with_format(mut self, format: CaptureFormat) -> Self {
        self.format = format;
        self
    }

    /// Queues a block to be returned by one `drain` call.
    pub fn with_block(mut self, samples: Vec<f32>) -> Self {
        self.blocks.push_back(samples);
        self
    }

    /// Configures `start` to fail.
    pub fn with_start_failure(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// True once `start` has been called successfully.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True once `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Shared flag set by `stop`, observable after the mock is moved into
    /// a worker.
    pub fn stopped_handle(&self) -> std::sync::Arc<std::sync::atomic::AtomicBool> {
        std::sync::Arc::clone(&self.stopped)
    }
}

impl Default for MockCaptureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for MockCaptureSource {
    fn start(&mut self) -> Result<()> {
        if self.fail_start {
            return Err(crate::error::RelayError::AudioCapture {
                message: "mock capture start failure".to_string(),
            });
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped
            .store(true, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    fn format(&self) -> CaptureFormat {
        self.format
    }

    fn drain(&mut self, max_samples: usize) -> Vec<f32> {
        match self.blocks.pop_front() {
            Some(mut block) => {
                if block.len() > max_samples {
                    let rest = block.split_off(max_samples);
                    self.blocks.push_front(rest);
                }
                block
            }
            None => Vec::new(),
        }
    }
}

#[cfg(feature = "cpal-audio")]
pub use cpal_impl::{CpalCaptureSource, list_input_devices, list_output_devices};

#[cfg(feature = "cpal-audio")]
mod cpal_impl {
    use super::{CaptureFormat, CaptureSource};
    use crate::audio::ring_buffer::RingCaptureBuffer;
    use crate::audio::with_suppressed_stderr;
    use crate::defaults;
    use crate::error::{RelayError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{Arc, Mutex};

    /// List active audio input endpoints by display name.
    ///
    /// # Errors
    /// Returns `RelayError::AudioCapture` if device enumeration fails.
    pub fn list_input_devices() -> Result<Vec<String>> {
        let (host, devices) = with_suppressed_stderr(|| {
            let host = cpal::default_host();
            let devices = host.input_devices();
            (host, devices)
        });
        let _ = host; // keep host alive while iterating devices
        let devices = devices.map_err(|e| RelayError::AudioCapture {
            message: format!("Failed to enumerate input devices: {}", e),
        })?;

        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    /// List active audio output endpoints by display name.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let (host, devices) = with_suppressed_stderr(|| {
            let host = cpal::default_host();
            let devices = host.output_devices();
            (host, devices)
        });
        let _ = host;
        let devices = devices.map_err(|e| RelayError::AudioCapture {
            message: format!("Failed to enumerate output devices: {}", e),
        })?;

        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    /// Wrapper for cpal::Stream to make it Send.
    ///
    /// SAFETY: the stream is only accessed from one thread at a time; the
    /// capture source owns it exclusively and its methods are called
    /// synchronously.
    struct SendableStream(cpal::Stream);

    unsafe impl Send for SendableStream {}

    /// Shared-mode capture at the device's native format.
    ///
    /// The data callback writes interleaved f32 samples into a bounded ring
    /// buffer (5s, discard-oldest) and returns immediately; it never blocks
    /// and never raises to the audio subsystem.
    pub struct CpalCaptureSource {
        device: cpal::Device,
        format: CaptureFormat,
        sample_format: cpal::SampleFormat,
        stream_config: cpal::StreamConfig,
        stream: Option<SendableStream>,
        ring: Arc<Mutex<RingCaptureBuffer>>,
    }

    impl CpalCaptureSource {
        /// Opens the named input device, or the system default when `None`.
        ///
        /// # Errors
        /// Returns `AudioDeviceNotFound` when no device matches the
        /// selection, `AudioCapture` when the native config cannot be read.
        pub fn new(device_name: Option<&str>) -> Result<Self> {
            let device = with_suppressed_stderr(|| {
                let host = cpal::default_host();

                if let Some(name) = device_name {
                    let devices = host.input_devices().map_err(|e| RelayError::AudioCapture {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                    for dev in devices {
                        if let Ok(dev_name) = dev.name()
                            && dev_name == name
                        {
                            return Ok(dev);
                        }
                    }

                    Err(RelayError::AudioDeviceNotFound {
                        device: name.to_string(),
                    })
                } else {
                    host.default_input_device()
                        .ok_or_else(|| RelayError::AudioDeviceNotFound {
                            device: "default".to_string(),
                        })
                }
            })?;

            let default_config =
                device
                    .default_input_config()
                    .map_err(|e| RelayError::AudioCapture {
                        message: format!("Failed to query default input config: {}", e),
                    })?;

            let format = CaptureFormat {
                sample_rate: default_config.sample_rate().0,
                channels: default_config.channels(),
            };

            let ring = RingCaptureBuffer::for_format(
                format.sample_rate,
                format.channels,
                defaults::CAPTURE_BUFFER_SECS,
            );

            Ok(Self {
                device,
                format,
                sample_format: default_config.sample_format(),
                stream_config: default_config.into(),
                stream: None,
                ring: Arc::new(Mutex::new(ring)),
            })
        }

        fn build_stream(&self) -> Result<cpal::Stream> {
            use cpal::SampleFormat;

            let err_callback = |err| {
                eprintln!("revoice: audio stream error: {}", err);
            };

            match self.sample_format {
                SampleFormat::F32 => {
                    let ring = Arc::clone(&self.ring);
                    self.device
                        .build_input_stream(
                            &self.stream_config,
                            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                                if let Ok(mut buf) = ring.lock() {
                                    buf.push_slice(data);
                                }
                            },
                            err_callback,
                            None,
                        )
                        .map_err(|e| RelayError::AudioCapture {
                            message: format!("Failed to build f32 input stream: {}", e),
                        })
                }
                SampleFormat::I16 => {
                    let ring = Arc::clone(&self.ring);
                    self.device
                        .build_input_stream(
                            &self.stream_config,
                            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                                let floats: Vec<f32> =
                                    data.iter().map(|&s| s as f32 / -(i16::MIN as f32)).collect();
                                if let Ok(mut buf) = ring.lock() {
                                    buf.push_slice(&floats);
                                }
                            },
                            err_callback,
                            None,
                        )
                        .map_err(|e| RelayError::AudioCapture {
                            message: format!("Failed to build i16 input stream: {}", e),
                        })
                }
                fmt => Err(RelayError::AudioCapture {
                    message: format!("Unsupported native sample format: {:?}", fmt),
                }),
            }
        }
    }

    impl CaptureSource for CpalCaptureSource {
        fn start(&mut self) -> Result<()> {
            if self.stream.is_some() {
                return Ok(()); // Already started
            }

            let stream = self.build_stream()?;
            stream.play().map_err(|e| RelayError::AudioCapture {
                message: format!("Failed to start audio stream: {}", e),
            })?;
            self.stream = Some(SendableStream(stream));
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            if let Some(stream) = self.stream.take() {
                stream.0.pause().map_err(|e| RelayError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
            }
            Ok(())
        }

        fn format(&self) -> CaptureFormat {
            self.format
        }

        fn drain(&mut self, max_samples: usize) -> Vec<f32> {
            match self.ring.lock() {
                Ok(mut buf) => buf.drain(max_samples),
                Err(_) => Vec::new(),
            }
        }
    }

}
