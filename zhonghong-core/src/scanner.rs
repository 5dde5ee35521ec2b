//! Frame synchronization over a raw byte stream
//!
//! Socket reads do not respect frame boundaries: one read may hold several
//! frames, half a frame, or garbage left over from line noise. [`scan`] walks
//! a buffer and yields every frame whose checksum verifies:
//!
//! 1. Fewer than six bytes left: stop, the rest is unconsumed.
//! 2. Header codes unknown: drop one byte and retry (resynchronization).
//! 3. Not enough bytes for the announced frame: stop, the rest is unconsumed.
//! 4. Checksum bad: skip the whole announced frame without re-scanning it.
//!
//! [`FrameBuffer`] keeps the unconsumed tail between reads so a frame split
//! across two reads is still recovered.

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::{
    checksum,
    constants::{MAX_PENDING_BYTES, MIN_FRAME_SCAN},
    header::Header,
};

/// Scan `data` for complete, checksum-valid frames
///
/// # Examples
///
/// ```
/// use zhonghong_core::scanner;
///
/// let mut data = vec![0x13, 0x37];
/// data.extend_from_slice(&[0x01, 0x50, 0x02, 0x01, 0x01, 0x01, 0x01, 0x57]);
///
/// let mut frames = scanner::scan(&data);
/// assert_eq!(frames.next(), Some(&data[2..]));
/// assert_eq!(frames.next(), None);
/// assert!(frames.remainder().is_empty());
/// ```
pub fn scan(data: &[u8]) -> Frames<'_> {
    Frames {
        rest: data,
        skipped_bytes: 0,
        dropped_frames: 0,
    }
}

/// Lazy iterator over the valid frames of a buffer
///
/// Stateless between buffers: create a new one per read.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    rest: &'a [u8],
    skipped_bytes: usize,
    dropped_frames: usize,
}

impl<'a> Frames<'a> {
    /// Bytes not consumed yet
    ///
    /// Once the iterator returned `None` this is the partial frame (or short
    /// tail) the scan stopped at.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }

    /// Bytes discarded one at a time while resynchronizing
    pub fn skipped_bytes(&self) -> usize {
        self.skipped_bytes
    }

    /// Frames discarded because their checksum did not verify
    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        loop {
            if self.rest.len() <= MIN_FRAME_SCAN {
                return None;
            }

            let header = match Header::decode(self.rest) {
                Ok(header) => header,
                Err(e) => {
                    trace!("Header unknown ({}), skipping byte 0x{:02X}", e, self.rest[0]);
                    self.rest = &self.rest[1..];
                    self.skipped_bytes += 1;
                    continue;
                }
            };

            let total = header.frame_len();
            if self.rest.len() < total {
                trace!(
                    needed = total,
                    available = self.rest.len(),
                    "Partial frame, waiting for more data"
                );
                return None;
            }

            let (frame, rest) = self.rest.split_at(total);
            self.rest = rest;

            if checksum::verify(frame) {
                return Some(frame);
            }

            debug!("Checksum error, dropping frame: {}", hex::encode(frame));
            self.dropped_frames += 1;
        }
    }
}

/// Frame scanner that carries unconsumed bytes across reads
///
/// # Examples
///
/// ```
/// use zhonghong_core::FrameBuffer;
///
/// let frame = [0x01, 0x50, 0x02, 0x01, 0x01, 0x01, 0x01, 0x57];
/// let mut buffer = FrameBuffer::new();
///
/// assert!(buffer.push(&frame[..3]).is_empty());
/// let frames = buffer.push(&frame[3..]);
/// assert_eq!(&frames[0][..], &frame[..]);
/// ```
#[derive(Debug)]
pub struct FrameBuffer {
    pending: BytesMut,
    max_pending: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }

    /// Create a buffer that holds at most `max_pending` unconsumed bytes
    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            pending: BytesMut::with_capacity(max_pending.min(MAX_PENDING_BYTES)),
            max_pending,
        }
    }

    /// Append one read and take every frame now complete
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.pending.extend_from_slice(data);

        let (frames, consumed) = {
            let mut scan = scan(&self.pending);
            let frames: Vec<Bytes> = scan.by_ref().map(Bytes::copy_from_slice).collect();

            if scan.skipped_bytes() > 0 || scan.dropped_frames() > 0 {
                debug!(
                    skipped_bytes = scan.skipped_bytes(),
                    dropped_frames = scan.dropped_frames(),
                    "Resynchronized stream"
                );
            }

            (frames, self.pending.len() - scan.remainder().len())
        };

        self.pending.advance(consumed);

        if self.pending.len() > self.max_pending {
            warn!(
                "Discarding {} unconsumed bytes (limit {})",
                self.pending.len(),
                self.max_pending
            );
            self.pending.clear();
        }

        frames
    }

    /// Number of bytes waiting for the next read
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop buffered bytes (e.g. after reconnecting)
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codes::StatusKind,
        message::Message,
        record::{Record, StatusRecord},
    };
    use pretty_assertions::assert_eq;
    use zhonghong_types::{Address, Attribute, FanMode, Operation, Switch};

    fn status_frame(outdoor: u8, indoor: u8, room: u8) -> Vec<u8> {
        let record = StatusRecord {
            address: Address::new(outdoor, indoor),
            switch: Switch::On,
            target_temperature: 24,
            operation: Operation::Cool,
            fan_mode: FanMode::Mid,
            room_temperature: room,
            error_code: 0,
            reserved: [0, 0],
        };
        Message::response(
            Header::status(1, StatusKind::One, 1),
            vec![Record::Status(record)],
        )
        .encode()
        .to_vec()
    }

    fn echo_frame() -> Vec<u8> {
        Message::response(
            Header::new(1, crate::CtlCode::Control(Attribute::Power(Switch::Off)), 1),
            vec![Record::Address(Address::new(1, 2))],
        )
        .encode()
        .to_vec()
    }

    #[test]
    fn test_concatenated_frames_in_order() {
        let frames = [status_frame(1, 1, 20), echo_frame(), status_frame(1, 2, 21)];
        let data = frames.concat();

        let mut scan = scan(&data);
        let found: Vec<&[u8]> = scan.by_ref().collect();

        assert_eq!(found.len(), 3);
        for (found, expected) in found.iter().zip(frames.iter()) {
            assert_eq!(*found, expected.as_slice());
        }
        assert!(scan.remainder().is_empty());
    }

    #[test]
    fn test_garbage_prefix_resynchronizes() {
        let frame = status_frame(1, 2, 26);
        let mut data = vec![0x00, 0xFF, 0x13, 0x50, 0x07];
        data.extend_from_slice(&frame);

        let mut scan = scan(&data);
        assert_eq!(scan.next(), Some(frame.as_slice()));
        assert_eq!(scan.next(), None);
        assert_eq!(scan.skipped_bytes(), 5);
    }

    #[test]
    fn test_truncated_tail_is_unconsumed() {
        let first = status_frame(1, 1, 20);
        let second = status_frame(1, 2, 21);
        let mut data = first.clone();
        data.extend_from_slice(&second[..9]);

        let mut scan = scan(&data);
        assert_eq!(scan.next(), Some(first.as_slice()));
        assert_eq!(scan.next(), None);
        assert_eq!(scan.remainder(), &second[..9]);
    }

    #[test]
    fn test_short_buffer_is_unconsumed() {
        let data = [0x01, 0x50, 0x01, 0x00, 0x52];
        let mut scan = scan(&data);

        assert_eq!(scan.next(), None);
        assert_eq!(scan.remainder(), &data[..]);
    }

    #[test]
    fn test_bad_checksum_skipped_but_cursor_advances() {
        let mut bad = status_frame(1, 1, 20);
        let last = bad.len() - 1;
        bad[last] = bad[last].wrapping_add(1);
        let good = status_frame(1, 2, 21);

        let data = [bad, good.clone()].concat();
        let mut scan = scan(&data);

        assert_eq!(scan.next(), Some(good.as_slice()));
        assert_eq!(scan.next(), None);
        assert_eq!(scan.dropped_frames(), 1);
        assert_eq!(scan.skipped_bytes(), 0);
    }

    #[test]
    fn test_frame_buffer_recovers_split_frame() {
        let frame = status_frame(1, 2, 26);
        let mut buffer = FrameBuffer::new();

        assert!(buffer.push(&frame[..6]).is_empty());
        assert_eq!(buffer.pending(), 6);

        let frames = buffer.push(&frame[6..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], frame.as_slice());
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_frame_buffer_split_across_many_reads() {
        let data = [status_frame(1, 1, 20), echo_frame(), status_frame(1, 2, 21)].concat();
        let mut buffer = FrameBuffer::new();

        let mut found = Vec::new();
        for chunk in data.chunks(4) {
            found.extend(buffer.push(chunk));
        }

        assert_eq!(found.len(), 3);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_frame_buffer_limit() {
        let frame = status_frame(1, 2, 26);
        let mut buffer = FrameBuffer::with_limit(4);

        // The partial frame exceeds the limit and is discarded
        assert!(buffer.push(&frame[..8]).is_empty());
        assert_eq!(buffer.pending(), 0);
    }
}
