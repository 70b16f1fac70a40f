//! Bitcoin Core's internal VARINT (serialize.h `ReadVarInt`/`WriteVarInt`).
//!
//! Unlike CompactSize this is MSB-first base-128, and every continuation byte
//! adds one to the accumulator before the next shift. That offset makes each
//! value have exactly one encoding, so `0x80 0x00` is 128, not 0.

use crate::error::FormatError;

/// Decode one varint from the start of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn read_varint(data: &[u8]) -> Result<(u64, usize), FormatError> {
    let mut n: u64 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if n > (u64::MAX >> 7) {
            return Err(FormatError::VarintOverflow);
        }
        n = (n << 7) | u64::from(byte & 0x7F);

        if byte & 0x80 != 0 {
            if n == u64::MAX {
                return Err(FormatError::VarintOverflow);
            }
            n += 1;
        } else {
            return Ok((n, i + 1));
        }
    }

    Err(FormatError::TruncatedVarint { len: data.len() })
}

/// Decode a varint that must span all of `data`.
pub fn read_varint_exact(data: &[u8], field: &'static str) -> Result<u64, FormatError> {
    let (value, consumed) = read_varint(data)?;
    if consumed != data.len() {
        return Err(FormatError::TrailingBytes {
            field,
            consumed,
            len: data.len(),
        });
    }
    Ok(value)
}

/// Append the varint encoding of `n` to `out`.
pub fn write_varint(mut n: u64, out: &mut Vec<u8>) {
    // Built least-significant group first, then reversed.
    let mut tmp = [0u8; 10];
    let mut len = 0;
    loop {
        tmp[len] = (n & 0x7F) as u8 | if len > 0 { 0x80 } else { 0x00 };
        if n <= 0x7F {
            break;
        }
        n = (n >> 7) - 1;
        len += 1;
    }
    out.extend(tmp[..=len].iter().rev());
}

pub fn encode_varint(n: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    write_varint(n, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_varint_single_byte() {
        assert_eq!(read_varint(&[0x00]).unwrap(), (0, 1));
        assert_eq!(read_varint(&[0x7F]).unwrap(), (127, 1));
    }

    #[test]
    fn test_read_varint_continuation_adds_one() {
        // Plain base-128 would read these as 0 and 127 * 128 + 127.
        assert_eq!(read_varint(&[0x80, 0x00]).unwrap(), (128, 2));
        assert_eq!(read_varint(&[0xFF, 0x7F]).unwrap(), (16511, 2));
        assert_eq!(read_varint(&[0x80, 0x80, 0x00]).unwrap(), (16512, 3));
    }

    #[test]
    fn test_read_varint_stops_at_terminator() {
        // Trailing bytes are left for the caller.
        assert_eq!(read_varint(&[0x81, 0x00, 0xAA, 0xBB]).unwrap(), (256, 2));
    }

    #[test]
    fn test_read_varint_truncated() {
        assert_eq!(read_varint(&[]), Err(FormatError::TruncatedVarint { len: 0 }));
        assert_eq!(
            read_varint(&[0x80, 0x80]),
            Err(FormatError::TruncatedVarint { len: 2 })
        );
    }

    #[test]
    fn test_read_varint_overflow() {
        let data = [0xFFu8; 11];
        assert_eq!(read_varint(&data), Err(FormatError::VarintOverflow));
    }

    #[test]
    fn test_read_varint_exact_rejects_leftovers() {
        assert_eq!(read_varint_exact(&[0x05], "vout").unwrap(), 5);
        assert_eq!(
            read_varint_exact(&[0x05, 0x00], "vout"),
            Err(FormatError::TrailingBytes { field: "vout", consumed: 1, len: 2 })
        );
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(127), vec![0x7F]);
        assert_eq!(encode_varint(128), vec![0x80, 0x00]);
        assert_eq!(encode_varint(255), vec![0x80, 0x7F]);
        assert_eq!(encode_varint(16511), vec![0xFF, 0x7F]);
        assert_eq!(encode_varint(16512), vec![0x80, 0x80, 0x00]);
    }

    #[test]
    fn test_u64_max_round_trips() {
        let encoded = encode_varint(u64::MAX);
        assert_eq!(read_varint(&encoded).unwrap(), (u64::MAX, encoded.len()));
    }

    proptest! {
        #[test]
        fn prop_varint_round_trip(n in any::<u64>()) {
            let encoded = encode_varint(n);
            prop_assert_eq!(read_varint(&encoded).unwrap(), (n, encoded.len()));
            prop_assert_eq!(read_varint_exact(&encoded, "n").unwrap(), n);
        }

        #[test]
        fn prop_varint_ignores_suffix(n in any::<u64>(), suffix in proptest::collection::vec(any::<u8>(), 0..8)) {
            let mut encoded = encode_varint(n);
            let len = encoded.len();
            encoded.extend_from_slice(&suffix);
            prop_assert_eq!(read_varint(&encoded).unwrap(), (n, len));
        }
    }
}
