use bytes::{Bytes, BytesMut};

/// Accumulates already-encoded wire frames between ticks. Frames arrive
/// pre-length-prefixed (see `imageboard_protocol::frame::encode`), so
/// `write` is a plain append — the buffer never has to know a frame's
/// internal shape beyond where each one ends, which it tracks only so a
/// capped flush can stop on a frame boundary rather than slicing into
/// one.
///
/// Owned exclusively by its Feed's loop; not `Sync`, not meant to be.
#[derive(Default)]
pub struct MessageBuffer {
    buf: BytesMut,
    /// Cumulative end offset of each frame written since the last flush.
    boundaries: Vec<usize>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an already-framed message. The caller is responsible for
    /// having length-prefixed it.
    pub fn write(&mut self, frame: Bytes) {
        self.buf.extend_from_slice(&frame);
        self.boundaries.push(self.buf.len());
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the accumulated bytes and empties the buffer. `None` if
    /// nothing was written since the last flush.
    pub fn flush(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            return None;
        }

        self.boundaries.clear();
        Some(std::mem::take(&mut self.buf).freeze())
    }

    /// Like [`flush`](Self::flush), but honors an optional soft cap on
    /// the returned batch's size by returning only as many *whole*
    /// frames as fit under the cap, leaving the remainder buffered for
    /// the next tick. Always returns at least one frame when the buffer
    /// is non-empty, even if that single frame alone exceeds the cap —
    /// the cap bounds batching, it does not drop or split a frame.
    /// `None` cap behaves exactly like `flush`.
    pub fn flush_capped(&mut self, max_bytes: Option<usize>) -> Option<Bytes> {
        let Some(cap) = max_bytes else {
            return self.flush();
        };

        if self.buf.is_empty() {
            return None;
        }

        let split_at = self
            .boundaries
            .iter()
            .copied()
            .take_while(|&end| end <= cap)
            .last()
            .unwrap_or(self.boundaries[0]);

        if split_at >= self.buf.len() {
            return self.flush();
        }

        let emitted = self.buf.split_to(split_at).freeze();
        let remaining = self.boundaries.split_off(
            self.boundaries
                .iter()
                .position(|&end| end == split_at)
                .map(|i| i + 1)
                .unwrap_or(1),
        );
        self.boundaries = remaining.into_iter().map(|end| end - split_at).collect();

        Some(emitted)
    }
}
