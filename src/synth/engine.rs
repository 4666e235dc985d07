//! External synthesis engine invocation.
//!
//! Each utterance runs one short-lived `espeak-ng` process: text on stdin,
//! WAV on stdout. The process is bounded by a hard timeout so a wedged
//! synthesizer cannot stall the queue forever.

use crate::defaults;
use crate::error::{RelayError, Result};
use crate::synth::voice::VoiceSelector;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Trait for text-to-speech backends consumed by the synthesis worker.
pub trait SynthesisEngine: Send {
    /// Synthesizes `text` with the given voice and returns the WAV payload.
    fn synthesize(&mut self, text: &str, voice: VoiceSelector) -> Result<Vec<u8>>;
}

/// espeak-ng subprocess backend.
pub struct EspeakEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl EspeakEngine {
    /// Locates the synthesis binary: an explicit path wins, then a copy next
    /// to the running executable, then the bare name for PATH lookup.
    pub fn new(binary: Option<PathBuf>) -> Self {
        let binary = binary.unwrap_or_else(|| {
            let local = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join(defaults::SYNTH_BINARY)));
            match local {
                Some(path) if path.is_file() => path,
                _ => PathBuf::from(defaults::SYNTH_BINARY),
            }
        });
        Self {
            binary,
            timeout: Duration::from_secs(defaults::SYNTH_TIMEOUT_SECS),
        }
    }

    /// Overrides the synthesis timeout. Used by tests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolved binary path.
    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }

    fn run(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.binary)
            .arg("--stdout")
            .arg("-v")
            .arg(voice)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RelayError::SynthesisToolNotFound {
                        tool: self.binary.display().to_string(),
                    }
                } else {
                    RelayError::Synthesis {
                        message: format!("Failed to spawn {}: {}", self.binary.display(), e),
                    }
                }
            })?;

        // Write the text and close stdin so the process can finish.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .and_then(|_| stdin.write_all(b"\n"))
                .map_err(|e| RelayError::Synthesis {
                    message: format!("Failed to write synthesis input: {}", e),
                })?;
        }

        // Drain stdout/stderr off-thread so a large WAV cannot deadlock the
        // pipe while we poll for exit.
        let mut stdout = child.stdout.take();
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(out) = stdout.as_mut() {
                let _ = out.read_to_end(&mut buf);
            }
            buf
        });
        let mut stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(err) = stderr.as_mut() {
                let _ = err.read_to_string(&mut buf);
            }
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(RelayError::Synthesis {
                            message: format!(
                                "Synthesis timed out after {}s",
                                self.timeout.as_secs()
                            ),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    return Err(RelayError::Synthesis {
                        message: format!("Failed to wait for synthesis process: {}", e),
                    });
                }
            }
        };

        let wav = stdout_reader.join().unwrap_or_default();
        let diagnostics = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(RelayError::Synthesis {
                message: format!(
                    "Synthesis process exited with {}: {}",
                    status,
                    diagnostics.trim()
                ),
            });
        }
        if wav.is_empty() {
            return Err(RelayError::Synthesis {
                message: "Synthesis produced no audio".to_string(),
            });
        }

        Ok(wav)
    }
}

impl SynthesisEngine for EspeakEngine {
    fn synthesize(&mut self, text: &str, voice: VoiceSelector) -> Result<Vec<u8>> {
        self.run(text, voice.voice_id())
    }
}

/// Mock synthesis engine for testing.
///
/// Records every request and returns a small valid WAV payload.
pub struct MockSynthesisEngine {
    requests: Vec<(String, VoiceSelector)>,
    fail: bool,
}

impl MockSynthesisEngine {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            fail: false,
        }
    }

    /// Configures every `synthesize` call to fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> &[(String, VoiceSelector)] {
        &self.requests
    }

    /// Builds the WAV payload returned for `text`.
    pub fn wav_for(text: &str) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: defaults::TARGET_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for (i, _) in text.bytes().enumerate() {
                writer.write_sample((i as i16) * 100).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }
}

impl Default for MockSynthesisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthesisEngine for MockSynthesisEngine {
    fn synthesize(&mut self, text: &str, voice: VoiceSelector) -> Result<Vec<u8>> {
        if self.fail {
            return Err(RelayError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }
        self.requests.push((text.to_string(), voice));
        Ok(Self::wav_for(text))
    }
}
