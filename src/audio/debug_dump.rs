//! Diagnostic recording of the exact stream fed to the recognizer.
//!
//! When enabled, one WAV artifact is (re)created per session next to the
//! running process and every converted mono 16kHz PCM16 block is appended
//! to it. Recording is best-effort: open and write failures are logged and
//! never propagate into the pipeline.

use crate::defaults;
use std::path::{Path, PathBuf};

/// Appends post-conversion PCM16 blocks to a session WAV artifact.
pub struct DebugRecorder {
    writer: Option<hound::WavWriter<std::io::BufWriter<std::fs::File>>>,
    path: PathBuf,
}

impl DebugRecorder {
    /// Opens the dump file at the default location, overwriting any
    /// artifact left by a previous session.
    ///
    /// Returns `None` (after logging) when the file cannot be created;
    /// the session proceeds without a recording.
    pub fn open_default() -> Option<Self> {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::open(dir.join(defaults::DEBUG_DUMP_FILE))
    }

    /// Opens the dump file at an explicit path, overwriting it.
    pub fn open(path: PathBuf) -> Option<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: defaults::TARGET_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        if path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            eprintln!(
                "revoice: failed to remove previous dump {}: {}",
                path.display(),
                e
            );
        }

        match hound::WavWriter::create(&path, spec) {
            Ok(writer) => Some(Self {
                writer: Some(writer),
                path,
            }),
            Err(e) => {
                eprintln!(
                    "revoice: failed to open debug dump {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Appends one PCM16 block and flushes. Failures are logged only.
    pub fn write_block(&mut self, pcm: &[i16]) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        for &sample in pcm {
            if let Err(e) = writer.write_sample(sample) {
                eprintln!("revoice: debug dump write failed: {}", e);
                self.writer = None;
                return;
            }
        }
        if let Err(e) = writer.flush() {
            eprintln!("revoice: debug dump flush failed: {}", e);
            self.writer = None;
        }
    }

    /// Path of the artifact being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finalizes the WAV header. Called on session stop.
    pub fn finalize(mut self) {
        if let Some(writer) = self.writer.take()
            && let Err(e) = writer.finalize()
        {
            eprintln!("revoice: failed to finalize debug dump: {}", e);
        }
    }
}
