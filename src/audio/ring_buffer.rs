//! Bounded capture ring buffer with a discard-oldest overflow policy.
//!
//! The capture callback pushes interleaved native-format samples; the
//! recognition worker drains them in fixed-duration blocks. Writes never
//! block and never fail — when the buffer is full the oldest audio is
//! dropped, trading completeness for bounded latency.

use std::collections::VecDeque;

/// Fixed-capacity sample buffer fed by the audio capture callback.
///
/// Not internally synchronized; wrap in `Arc<Mutex<..>>` to share between
/// the capture callback and the recognition worker.
pub struct RingCaptureBuffer {
    buf: VecDeque<f32>,
    capacity: usize,
    dropped: u64,
}

impl RingCaptureBuffer {
    /// Creates a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Creates a buffer sized for `secs` seconds of interleaved audio at
    /// the given native format.
    pub fn for_format(sample_rate: u32, channels: u16, secs: u32) -> Self {
        Self::new((sample_rate as usize) * (channels as usize) * (secs as usize))
    }

    /// Appends samples, discarding the oldest buffered audio on overflow.
    pub fn push_slice(&mut self, samples: &[f32]) {
        // An oversized write keeps only its newest `capacity` samples
        let samples = if samples.len() > self.capacity {
            self.dropped += (samples.len() - self.capacity) as u64;
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        let overflow = (self.buf.len() + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.buf.drain(..overflow);
            self.dropped += overflow as u64;
        }
        self.buf.extend(samples.iter().copied());
    }

    /// Removes and returns up to `max` samples from the front.
    pub fn drain(&mut self, max: usize) -> Vec<f32> {
        let n = max.min(self.buf.len());
        self.buf.drain(..n).collect()
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples discarded due to overflow since creation.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped
    }

    /// Discards all buffered samples.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain_in_order() {
        let mut ring = RingCaptureBuffer::new(8);
        ring.push_slice(&[1.0, 2.0, 3.0]);
        ring.push_slice(&[4.0]);

        assert_eq!(ring.len(), 4);
        assert_eq!(ring.drain(2), vec![1.0, 2.0]);
        assert_eq!(ring.drain(10), vec![3.0, 4.0]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_overflow_discards_oldest() {
        let mut ring = RingCaptureBuffer::new(4);
        ring.push_slice(&[1.0, 2.0, 3.0, 4.0]);
        ring.push_slice(&[5.0, 6.0]);

        assert_eq!(ring.len(), 4, "Buffer must not grow beyond capacity");
        assert_eq!(ring.drain(4), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ring.dropped_samples(), 2);
    }

    #[test]
    fn test_write_at_capacity_keeps_newest() {
        let mut ring = RingCaptureBuffer::new(3);
        ring.push_slice(&[1.0, 2.0, 3.0]);
        // Buffer is full; a new write must still land
        ring.push_slice(&[9.0]);

        let contents = ring.drain(3);
        assert_eq!(contents, vec![2.0, 3.0, 9.0]);
    }

    #[test]
    fn test_oversized_write_keeps_tail() {
        let mut ring = RingCaptureBuffer::new(3);
        ring.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(ring.len(), 3);
        assert_eq!(ring.drain(3), vec![3.0, 4.0, 5.0]);
        assert_eq!(ring.dropped_samples(), 2);
    }

    #[test]
    fn test_for_format_capacity() {
        let ring = RingCaptureBuffer::for_format(48000, 2, 5);
        assert_eq!(ring.capacity(), 48000 * 2 * 5);
    }

    #[test]
    fn test_drain_on_empty_returns_nothing() {
        let mut ring = RingCaptureBuffer::new(4);
        assert!(ring.drain(4).is_empty());
    }

    #[test]
    fn test_clear() {
        let mut ring = RingCaptureBuffer::new(4);
        ring.push_slice(&[1.0, 2.0]);
        ring.clear();
        assert!(ring.is_empty());
    }
}
