//! Default tuning constants for revoice.
//!
//! Shared across configuration types and the pipeline workers to keep the
//! timing/threshold values in one place.

/// Canonical sample rate handed to the recognizer, in Hz.
///
/// 16kHz mono PCM16 is the standard input format for streaming speech
/// recognition models.
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Duration of one recognition read cycle, in milliseconds.
///
/// Each cycle drains this much audio from the capture buffer, converts it
/// and feeds it to the recognizer. At 16kHz this is 1280 samples — small
/// enough for responsive partial results, large enough to keep the
/// per-block recognizer overhead low.
pub const BLOCK_DURATION_MS: u32 = 80;

/// Capture ring buffer capacity, in seconds of native-format audio.
///
/// When the recognition worker falls behind, the oldest audio is discarded
/// so latency stays bounded.
pub const CAPTURE_BUFFER_SECS: u32 = 5;

/// Peak-amplitude threshold below which a block counts as near silence.
///
/// Diagnostic only: a status warning is raised for each quiet block, but
/// the audio is still fed to the recognizer.
pub const NEAR_SILENCE_THRESHOLD: f32 = 0.005;

/// Minimum interval between publishing identical partial results, in ms.
pub const PARTIAL_DEBOUNCE_MS: u64 = 400;

/// Minimum partial-result length (chars) before it is voiced.
///
/// Shorter partials still appear in the transcript view but are not worth
/// synthesizing — they are usually noise fragments.
pub const MIN_SYNTH_PARTIAL_CHARS: usize = 4;

/// Minimum utterance length (chars, after trimming) accepted by the
/// synthesis queue.
pub const MIN_UTTERANCE_CHARS: usize = 2;

/// Recognition worker backoff when no captured audio is available, in ms.
pub const IDLE_BACKOFF_MS: u64 = 10;

/// Recognition worker backoff after a per-block error, in ms.
pub const ERROR_BACKOFF_MS: u64 = 200;

/// Synthesis worker backoff when the utterance queue is empty, in ms.
pub const SYNTH_IDLE_BACKOFF_MS: u64 = 20;

/// Deadline for one external synthesis process invocation, in seconds.
pub const SYNTH_TIMEOUT_SECS: u64 = 5;

/// Per-worker join deadline during pipeline shutdown, in ms.
///
/// Workers that do not exit within this interval are detached; remaining
/// resources are released regardless.
pub const WORKER_JOIN_MS: u64 = 500;

/// Default external synthesis binary name.
pub const SYNTH_BINARY: &str = "espeak-ng";

/// Default models directory, relative to the working directory.
pub const MODELS_DIR: &str = "models";

/// Diagnostic dump file name, written next to the running process.
///
/// Contains exactly the mono 16kHz PCM16 stream handed to the recognizer.
pub const DEBUG_DUMP_FILE: &str = "debug_input_16k_mono.wav";

/// Output device name fragments preferred for playback.
///
/// Virtual cable endpoints, so the synthesized voice can be routed into
/// other applications. Falls back to the default output device.
pub const PREFERRED_OUTPUT_DEVICES: &[&str] = &["CABLE Input", "VB-Audio"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_duration_covers_target_rate() {
        // 80ms at 16kHz must be a whole number of samples
        let samples = TARGET_SAMPLE_RATE * BLOCK_DURATION_MS / 1000;
        assert_eq!(samples, 1280);
    }

    #[test]
    fn partial_gate_is_stricter_than_queue_gate() {
        assert!(MIN_SYNTH_PARTIAL_CHARS >= MIN_UTTERANCE_CHARS);
    }
}
