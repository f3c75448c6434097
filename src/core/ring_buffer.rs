//! The lock-free sample ring between the audio callback and the analysis loop.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::base::{Res, Void};

/// A fixed-capacity, lossy, single-producer single-consumer sample store.
///
/// The audio callback appends blocks with [`write`](Self::write); the analysis loop copies out
/// the most recent window with [`snapshot_recent`](Self::snapshot_recent). Writes overwrite the
/// oldest samples and never fail, so the producer can never be blocked.
pub struct RingBuffer {
    buf: UnsafeCell<Box<[f32]>>,
    written: AtomicUsize,
}

// Safety: single producer, single consumer. The written count is published with Release and
// read with Acquire, so a snapshot observes a consistent recent suffix boundary. A snapshot
// racing the producer can read a handful of mid-overwrite samples; the RMS-gated reader
// tolerates that, and the algorithm is robust to a few stale samples per window.
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a zero-filled ring of the given capacity in samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: UnsafeCell::new(vec![0.0; capacity].into_boxed_slice()),
            written: AtomicUsize::new(0),
        }
    }

    /// Returns the ring capacity in samples.
    pub fn capacity(&self) -> usize {
        unsafe { &*self.buf.get() }.len()
    }

    /// Returns the total number of samples ever written.
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Acquire)
    }

    /// Appends samples, overwriting the oldest on wrap.
    ///
    /// A block longer than the capacity keeps only its last `capacity` values. Producer side
    /// only: no locks, no allocation.
    pub fn write(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }

        let buf = unsafe { &mut *self.buf.get() };
        let capacity = buf.len();
        let total = self.written.load(Ordering::Relaxed);

        let skip = samples.len().saturating_sub(capacity);
        for (offset, &sample) in samples[skip..].iter().enumerate() {
            buf[(total + skip + offset) % capacity] = sample;
        }

        self.written.store(total + samples.len(), Ordering::Release);
    }

    /// Copies the most recently written samples into `dst`, oldest first.
    ///
    /// Fails when `dst` is longer than the capacity. Before the ring has filled, the head of
    /// the result holds the initial zeros; callers gate on RMS rather than fill level.
    pub fn snapshot_into(&self, dst: &mut [f32]) -> Void {
        let buf = unsafe { &*self.buf.get() };
        let capacity = buf.len();
        let n = dst.len();

        if n > capacity {
            return Err(anyhow::Error::msg(format!("Snapshot of {n} samples exceeds the ring capacity of {capacity}.")));
        }

        let total = self.written.load(Ordering::Acquire);

        // Slots that predate the first write read as the initial zeros.
        let missing = n.saturating_sub(total);
        dst[..missing].fill(0.0);

        for (offset, slot) in dst.iter_mut().enumerate().skip(missing) {
            *slot = buf[(total + offset - n) % capacity];
        }

        Ok(())
    }

    /// Returns a fresh copy of the `n` most recently written samples, oldest first.
    pub fn snapshot_recent(&self, n: usize) -> Res<Vec<f32>> {
        let mut samples = vec![0.0; n];
        self.snapshot_into(&mut samples)?;

        Ok(samples)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ramp(start: usize, len: usize) -> Vec<f32> {
        (start..start + len).map(|v| v as f32).collect()
    }

    #[test]
    fn test_write_and_read() {
        let ring = RingBuffer::new(10);
        ring.write(&ramp(0, 5));

        assert_eq!(ring.snapshot_recent(5).unwrap(), ramp(0, 5));
        assert_eq!(ring.snapshot_recent(3).unwrap(), ramp(2, 3));
    }

    #[test]
    fn test_wrap_around() {
        let ring = RingBuffer::new(5);
        ring.write(&[0.0, 1.0, 2.0]);
        ring.write(&[3.0, 4.0, 5.0]);

        assert_eq!(ring.snapshot_recent(5).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(ring.snapshot_recent(3).unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_oversized_write_keeps_tail() {
        let ring = RingBuffer::new(5);
        ring.write(&ramp(0, 10));

        assert_eq!(ring.snapshot_recent(5).unwrap(), ramp(5, 5));
        assert_eq!(ring.written(), 10);
    }

    #[test]
    fn test_exact_capacity_roundtrip() {
        let ring = RingBuffer::new(8);
        ring.write(&ramp(0, 8));

        assert_eq!(ring.snapshot_recent(8).unwrap(), ramp(0, 8));
    }

    #[test]
    fn test_double_capacity_roundtrip() {
        let ring = RingBuffer::new(6);
        ring.write(&ramp(0, 12));

        assert_eq!(ring.snapshot_recent(6).unwrap(), ramp(6, 6));
    }

    #[test]
    fn test_zero_head_before_fill() {
        let ring = RingBuffer::new(8);
        ring.write(&[1.0, 2.0]);

        assert_eq!(ring.snapshot_recent(4).unwrap(), vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_snapshot_larger_than_capacity_fails() {
        let ring = RingBuffer::new(4);

        assert!(ring.snapshot_recent(5).is_err());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let ring = RingBuffer::new(4);
        ring.write(&[1.0, 2.0, 3.0, 4.0]);

        let before = ring.snapshot_recent(4).unwrap();
        ring.write(&[9.0, 9.0]);

        assert_eq!(before, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ring.snapshot_recent(4).unwrap(), vec![3.0, 4.0, 9.0, 9.0]);
    }
}
