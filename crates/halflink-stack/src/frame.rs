//! Frame encoder/decoder.
//!
//! Every byte sequence exchanged with a data path is framed the same way:
//!
//! ```text
//! [preamble bytes][payload bytes][1 checksum byte]
//! ```
//!
//! The checksum covers the payload only, not the preamble. The receive
//! pipeline strips the preamble during demodulation, so [`decode`] sees
//! `payload ++ checksum`.
//!
//! Decoding never errors: a checksum mismatch or the reserved keep-alive
//! payload yields "no valid payload", because integrity failures on a lossy
//! RF link are routine, not exceptional.

use bytes::{BufMut, BytesMut};

/// Reserved keep-alive payload.
///
/// The transmit pipeline emits this filler when it has nothing to send;
/// both radios must share the value. Alternating-bit bytes keep the
/// receiver's clock recovery trained between real frames.
pub const DUMMY_PAYLOAD: [u8; 4] = [0x00, 0x55, 0x00, 0x55];

/// Arithmetic checksum: wrapping byte sum mod 256.
///
/// Changing any single byte changes the sum by a nonzero delta smaller
/// than the modulus, so every single-byte corruption is detected.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Encode a payload into the checksummed frame body: `payload ++ checksum`.
///
/// The preamble is prefixed by the outbound endpoint at send time, keeping
/// it out of the checksum.
///
/// # Example
///
/// ```
/// use halflink_stack::frame::encode;
///
/// assert_eq!(encode(&[1, 2, 3]), vec![1, 2, 3, 6]);
/// ```
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(payload.len() + 1);
    buf.put_slice(payload);
    buf.put_u8(checksum(payload));
    buf.to_vec()
}

/// Encode a complete wire frame: `preamble ++ payload ++ checksum`.
///
/// This is what the transmit pipeline radiates; [`encode`] plus the
/// endpoint's preamble prefix produce the same bytes.
///
/// # Example
///
/// ```
/// use halflink_stack::frame::encode_frame;
///
/// assert_eq!(encode_frame(&[0xAA], &[1, 2, 3]), vec![0xAA, 1, 2, 3, 6]);
/// ```
pub fn encode_frame(preamble: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(preamble.len() + payload.len() + 1);
    buf.put_slice(preamble);
    buf.put_slice(payload);
    buf.put_u8(checksum(payload));
    buf.to_vec()
}

/// Result of decoding a received frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A valid payload.
    Payload(Vec<u8>),
    /// The trailing checksum did not match; the frame was corrupted in flight.
    ChecksumMismatch,
    /// A valid frame carrying the reserved keep-alive filler.
    KeepAlive,
    /// Too short to carry a checksum byte.
    Truncated,
}

/// Decode a received frame body (`payload ++ checksum`), reporting why a
/// frame was dropped.
///
/// Use [`decode`] when only the payload matters.
pub fn decode_verbose(raw: &[u8]) -> FrameOutcome {
    let Some((&received, payload)) = raw.split_last() else {
        return FrameOutcome::Truncated;
    };
    let computed = checksum(payload);
    if computed != received {
        tracing::debug!(
            computed,
            received,
            len = raw.len(),
            "checksum mismatch, dropping frame"
        );
        return FrameOutcome::ChecksumMismatch;
    }
    if payload == DUMMY_PAYLOAD {
        return FrameOutcome::KeepAlive;
    }
    FrameOutcome::Payload(payload.to_vec())
}

/// Decode a received frame body, returning the payload if it is valid and
/// carries real data.
///
/// Returns `None` on checksum mismatch, the keep-alive filler, or a
/// truncated frame -- all silently dropped by design.
pub fn decode(raw: &[u8]) -> Option<Vec<u8>> {
    match decode_verbose(raw) {
        FrameOutcome::Payload(payload) => Some(payload),
        _ => None,
    }
}

/// Decode a received frame body as text, best-effort.
///
/// Any failure -- a dropped frame or invalid UTF-8 -- yields an empty
/// string rather than an error.
pub fn decode_as_text(raw: &[u8]) -> String {
    match decode(raw) {
        Some(payload) => String::from_utf8(payload).unwrap_or_default(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[1, 2, 3]), 6);
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
    }

    #[test]
    fn encode_appends_checksum() {
        assert_eq!(encode(&[1, 2, 3]), vec![1, 2, 3, 6]);
        assert_eq!(encode(&[]), vec![0]);
    }

    #[test]
    fn encode_frame_prefixes_preamble() {
        // The documented wire scenario: preamble 0xAA, payload [1,2,3].
        let wire = encode_frame(&[0xAA], &[1, 2, 3]);
        assert_eq!(wire, vec![0xAA, 1, 2, 3, checksum(&[1, 2, 3])]);
    }

    #[test]
    fn decode_round_trips_encode() {
        let payloads: &[&[u8]] = &[b"hello", &[0x00], &[0xFF; 32], b"", &[7, 0, 7, 0, 7]];
        for payload in payloads {
            assert_eq!(decode(&encode(payload)).as_deref(), Some(*payload));
        }
    }

    #[test]
    fn decode_rejects_any_single_corrupted_byte() {
        let body = encode(&[1, 2, 3, 4, 5]);
        for i in 0..body.len() {
            let mut corrupted = body.clone();
            corrupted[i] = corrupted[i].wrapping_add(1);
            assert_eq!(
                decode(&corrupted),
                None,
                "corruption at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn decode_rejects_incremented_checksum() {
        let mut body = encode(&[1, 2, 3]);
        let last = body.len() - 1;
        body[last] = body[last].wrapping_add(1);
        assert_eq!(decode(&body), None);
    }

    #[test]
    fn decode_filters_keep_alive() {
        let body = encode(&DUMMY_PAYLOAD);
        assert_eq!(decode(&body), None);
        assert_eq!(decode_verbose(&body), FrameOutcome::KeepAlive);
    }

    #[test]
    fn decode_empty_input_is_truncated() {
        assert_eq!(decode_verbose(&[]), FrameOutcome::Truncated);
        assert_eq!(decode(&[]), None);
    }

    #[test]
    fn decode_single_zero_byte_is_empty_payload() {
        // One byte is checksum-only; the empty payload sums to zero.
        assert_eq!(decode(&[0x00]), Some(vec![]));
        assert_eq!(decode(&[0x01]), None);
    }

    #[test]
    fn decode_verbose_reports_mismatch() {
        let mut body = encode(b"data");
        body[0] ^= 0x80;
        assert_eq!(decode_verbose(&body), FrameOutcome::ChecksumMismatch);
    }

    #[test]
    fn decode_as_text_round_trip() {
        let body = encode(b"status ok");
        assert_eq!(decode_as_text(&body), "status ok");
    }

    #[test]
    fn decode_as_text_invalid_utf8_is_empty() {
        let body = encode(&[0xC3, 0x28]);
        assert_eq!(decode_as_text(&body), "");
    }

    #[test]
    fn decode_as_text_dropped_frame_is_empty() {
        let mut body = encode(b"status ok");
        body[0] ^= 0xFF;
        assert_eq!(decode_as_text(&body), "");
    }
}
