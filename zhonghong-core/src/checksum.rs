//! Frame checksum
//!
//! The checksum is the plain sum of every header and payload byte, truncated
//! to its low 8 bits. It is appended as the last byte of each frame.

use tracing::trace;

/// Calculate the checksum over header and payload bytes
///
/// # Examples
///
/// ```
/// use zhonghong_core::checksum;
///
/// assert_eq!(checksum::calculate(&[0x01, 0x50, 0x01, 0x01, 0x01, 0x02]), 0x56);
/// assert_eq!(checksum::calculate(&[0xFF, 0x02]), 0x01);
/// ```
pub fn calculate(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Verify a complete frame whose last byte is the checksum
///
/// An empty slice never verifies.
pub fn verify(frame: &[u8]) -> bool {
    let Some((received, body)) = frame.split_last() else {
        return false;
    };

    let calculated = calculate(body);

    trace!(
        len = frame.len(),
        calculated = format!("0x{:02X}", calculated),
        received = format!("0x{:02X}", received),
        "Verified checksum"
    );

    calculated == *received
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(calculate(&[]), 0);
    }

    #[test]
    fn test_checksum_wraps_at_256() {
        assert_eq!(calculate(&[0x80, 0x80]), 0x00);
        assert_eq!(calculate(&[0xFF; 4]), 0xFC);
    }

    #[test]
    fn test_verify_all_zero_frame() {
        assert!(verify(&[0, 0, 0, 0, 0]));
        assert!(!verify(&[0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_verify_empty_frame() {
        assert!(!verify(&[]));
    }

    #[test]
    fn test_verify_status_frame() {
        let frame = [0x01, 0x50, 0x01, 0x01, 1, 2, 1, 24, 1, 2, 26, 0, 0, 0, 0x8C];
        assert_eq!(calculate(&frame[..14]), 0x8C);
        assert!(verify(&frame));
    }

    proptest! {
        #[test]
        fn prop_single_byte_flip_is_detected(
            body in proptest::collection::vec(any::<u8>(), 1..64),
            index in any::<proptest::sample::Index>(),
            delta in 1u8..=255,
        ) {
            let mut frame = body.clone();
            frame.push(calculate(&body));
            prop_assert!(verify(&frame));

            let i = index.index(body.len());
            frame[i] = frame[i].wrapping_add(delta);
            prop_assert!(!verify(&frame));
        }
    }
}
