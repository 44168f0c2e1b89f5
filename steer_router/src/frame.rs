//! Fixed-shape wire frame: `0x80 0x81 SRC TYPE LEN DATA[LEN] CRC`.
//!
//! `CRC` is the 8-bit wraparound sum of every byte from `SRC` through the
//! last data byte, inclusive. Frames with a bad magic, a LEN that doesn't
//! match the remaining bytes, or a bad CRC are dropped silently by the
//! caller (and counted) — [`parse`] reports which, but never panics on
//! malformed input.

use steer_common::consts::{FRAME_MAGIC, MAX_PAYLOAD_LEN};

pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

/// A validated frame, immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub src: u8,
    pub type_id: u8,
    pub data: Payload,
}

/// Why a byte sequence was rejected by [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    TooShort,
    BadMagic,
    LenMismatch,
    BadCrc,
    PayloadTooLarge,
}

fn checksum(src: u8, type_id: u8, len: u8, data: &[u8]) -> u8 {
    let mut sum = src.wrapping_add(type_id).wrapping_add(len);
    for &b in data {
        sum = sum.wrapping_add(b);
    }
    sum
}

impl Frame {
    pub fn new(src: u8, type_id: u8, data: &[u8]) -> Result<Self, FrameError> {
        let mut payload = Payload::new();
        payload
            .extend_from_slice(data)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            src,
            type_id,
            data: payload,
        })
    }

    /// Serialize to wire bytes, computing and appending the CRC.
    pub fn to_bytes(&self) -> heapless::Vec<u8, { MAX_PAYLOAD_LEN + 6 }> {
        let len = self.data.len() as u8;
        let mut out = heapless::Vec::new();
        let _ = out.extend_from_slice(&FRAME_MAGIC);
        let _ = out.push(self.src);
        let _ = out.push(self.type_id);
        let _ = out.push(len);
        let _ = out.extend_from_slice(&self.data);
        let _ = out.push(checksum(self.src, self.type_id, len, &self.data));
        out
    }
}

/// Parse one frame from `bytes`. Returns `Ok` only when magic, LEN, and CRC
/// all check out.
pub fn parse(bytes: &[u8]) -> Result<Frame, FrameError> {
    if bytes.len() < 6 {
        return Err(FrameError::TooShort);
    }
    if bytes[0] != FRAME_MAGIC[0] || bytes[1] != FRAME_MAGIC[1] {
        return Err(FrameError::BadMagic);
    }
    let src = bytes[2];
    let type_id = bytes[3];
    let len = bytes[4];
    let expected_total = 6usize + len as usize;
    if bytes.len() != expected_total {
        return Err(FrameError::LenMismatch);
    }
    let data = &bytes[5..5 + len as usize];
    let crc = bytes[5 + len as usize];
    if checksum(src, type_id, len, data) != crc {
        return Err(FrameError::BadCrc);
    }
    Frame::new(src, type_id, data).map_err(|_| FrameError::PayloadTooLarge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_fields() {
        let frame = Frame::new(0x7F, 254, &[1, 2, 3, 4]).unwrap();
        let bytes = frame.to_bytes();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = Frame::new(1, 200, &[]).unwrap().to_bytes();
        bytes[0] = 0x00;
        assert_eq!(parse(&bytes), Err(FrameError::BadMagic));
    }

    #[test]
    fn rejects_len_mismatch() {
        let bytes = Frame::new(1, 200, &[1, 2, 3]).unwrap().to_bytes();
        assert_eq!(parse(&bytes[..bytes.len() - 1]), Err(FrameError::LenMismatch));
    }

    #[test]
    fn rejects_bad_crc() {
        let mut bytes = Frame::new(1, 200, &[9, 9]).unwrap().to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_eq!(parse(&bytes), Err(FrameError::BadCrc));
    }

    #[test]
    fn too_short_is_rejected_without_panicking() {
        assert_eq!(parse(&[0x80, 0x81]), Err(FrameError::TooShort));
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_payload_round_trips(
            src: u8,
            type_id: u8,
            data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..=32),
        ) {
            let frame = Frame::new(src, type_id, &data).unwrap();
            let bytes = frame.to_bytes();
            let parsed = parse(&bytes).unwrap();
            proptest::prop_assert_eq!(parsed, frame);
        }

        #[test]
        fn corrupted_single_byte_is_never_accepted(
            src: u8,
            type_id: u8,
            data in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..=16),
            corrupt_idx in 0usize..32,
            flip: u8,
        ) {
            proptest::prop_assume!(flip != 0);
            let frame = Frame::new(src, type_id, &data).unwrap();
            let mut bytes = frame.to_bytes();
            let idx = corrupt_idx % bytes.len();
            bytes[idx] ^= flip;
            // Flipping any single byte changes either the magic, the
            // implied length, or the checksum — parse must reject it.
            proptest::prop_assert!(parse(&bytes).is_err());
        }
    }
}
