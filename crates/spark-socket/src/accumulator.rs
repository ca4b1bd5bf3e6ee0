use std::collections::VecDeque;

use bytes::{Buf, Bytes};

/// A FIFO of received chunks with a suspending `ensure`. Chunks are never
/// copied on push or on partial consumption — `take`/`view` slice existing
/// `Bytes` (cheap, reference-counted) rather than flattening into one
/// contiguous buffer, so a caller reading across many small socket reads
/// doesn't pay for a reassembly copy it may not need.
#[derive(Default)]
pub struct StreamAccumulator {
    chunks: VecDeque<Bytes>,
    buffered_len: usize,
    eof: bool,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.buffered_len += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Marks that the underlying source reached EOF; no more chunks will
    /// ever be pushed. `ensure` uses this to stop waiting instead of
    /// suspending forever on a source that will never produce more.
    pub fn mark_eof(&mut self) {
        self.eof = true;
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn buffered_len(&self) -> usize {
        self.buffered_len
    }

    /// True once at least `n` bytes are buffered, or the source has reached
    /// EOF (in which case the caller should stop waiting and consume
    /// whatever is left, however short of `n` that is).
    pub fn is_ready(&self, n: usize) -> bool {
        self.buffered_len >= n || self.eof
    }

    /// Removes and returns up to `n` bytes as a sequence of zero-copy
    /// slices of the original chunks. Returns fewer than `n` bytes only at
    /// EOF with less buffered than requested.
    pub fn take(&mut self, n: usize) -> Vec<Bytes> {
        let mut out = Vec::new();
        let mut remaining = n.min(self.buffered_len);

        while remaining > 0 {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            if front.len() <= remaining {
                remaining -= front.len();
                self.buffered_len -= front.len();
                out.push(self.chunks.pop_front().unwrap());
            } else {
                let piece = front.split_to(remaining);
                self.buffered_len -= piece.len();
                out.push(piece);
                remaining = 0;
            }
        }

        out
    }

    /// Convenience over [`take`](Self::take) for callers that want one
    /// contiguous `Bytes` rather than a fragment list; copies only when the
    /// requested span straddles more than one underlying chunk.
    pub fn take_contiguous(&mut self, n: usize) -> Bytes {
        let fragments = self.take(n);
        match fragments.len() {
            0 => Bytes::new(),
            1 => fragments.into_iter().next().unwrap(),
            _ => {
                let total: usize = fragments.iter().map(Bytes::len).sum();
                let mut combined = bytes::BytesMut::with_capacity(total);
                for fragment in fragments {
                    combined.extend_from_slice(fragment.chunk());
                }
                combined.freeze()
            }
        }
    }

    /// Drains every remaining byte, e.g. when a line splitter hits EOF with
    /// a trailing partial line it has decided to drop.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.buffered_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_spans_multiple_pushed_chunks_without_copying_whole_chunks() {
        let mut acc = StreamAccumulator::new();
        acc.push(Bytes::from_static(b"hel"));
        acc.push(Bytes::from_static(b"lo wor"));
        acc.push(Bytes::from_static(b"ld"));
        assert_eq!(acc.buffered_len(), 11);

        let taken = acc.take_contiguous(11);
        assert_eq!(&taken[..], b"hello world");
        assert_eq!(acc.buffered_len(), 0);
    }

    #[test]
    fn take_splits_a_chunk_when_the_request_lands_mid_chunk() {
        let mut acc = StreamAccumulator::new();
        acc.push(Bytes::from_static(b"abcdef"));
        let first = acc.take_contiguous(3);
        assert_eq!(&first[..], b"abc");
        let second = acc.take_contiguous(3);
        assert_eq!(&second[..], b"def");
    }

    #[test]
    fn is_ready_respects_eof_short_of_requested_length() {
        let mut acc = StreamAccumulator::new();
        acc.push(Bytes::from_static(b"ab"));
        assert!(!acc.is_ready(10));
        acc.mark_eof();
        assert!(acc.is_ready(10));
        let taken = acc.take_contiguous(10);
        assert_eq!(&taken[..], b"ab");
    }
}
