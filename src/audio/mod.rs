//! Audio capture, conversion, playback and diagnostics.

pub mod capture;
pub mod convert;
pub mod debug_dump;
pub mod playback;
pub mod ring_buffer;

pub use capture::{CaptureSource, MockCaptureSource};
pub use convert::{CaptureFormat, FormatConverter};
pub use debug_dump::DebugRecorder;
pub use playback::{MockPlayback, PlaybackSink};
pub use ring_buffer::RingCaptureBuffer;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers when
/// probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2
/// (stderr). Safe as long as no other thread is concurrently manipulating
/// fd 2.
#[cfg(feature = "cpal-audio")]
pub(crate) fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}
