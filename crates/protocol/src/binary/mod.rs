//! Binary serialization infrastructure for the container header
//!
//! Lengths are written as unsigned LEB128 varints: seven bits per byte,
//! least significant group first, high bit set on every byte but the last.

use std::io::{self, Read, Write};

pub mod traits;

pub use traits::{BinaryRead, BinaryWrite};

/// Longest LEB128 encoding of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Read a u8 from a reader
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read exactly N bytes into a fixed-size array
pub fn read_array<R: Read, const N: usize>(reader: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a minimally encoded LEB128 u64
///
/// Fails with `UnexpectedEof` when the input ends mid-varint and with
/// `InvalidData` when the encoding is longer than ten bytes, overflows u64,
/// or carries redundant trailing zero groups.
pub fn read_varint<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = read_u8(reader)?;
        let group = u64::from(byte & 0x7F);

        // The tenth byte holds only the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && group > 1 {
            return Err(invalid_varint("varint overflows u64"));
        }
        value |= group << (7 * i);

        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(invalid_varint("varint is not minimally encoded"));
            }
            return Ok(value);
        }
    }
    Err(invalid_varint("varint longer than 10 bytes"))
}

/// Write a u64 as LEB128
pub fn write_varint<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_varint(value, &mut buf);
    writer.write_all(&buf[..len])
}

/// Number of bytes `value` occupies as LEB128
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

fn encode_varint(mut value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | 0x80;
        i += 1;
    }
}

fn invalid_varint(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Write a u8 to a writer
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

/// Write bytes to a writer
pub fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn test_u8_roundtrip() {
        let mut buf = Vec::new();
        write_u8(&mut buf, 0x42).unwrap();
        assert_eq!(buf, vec![0x42]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_u8(&mut cursor).unwrap(), 0x42);
    }

    #[test]
    fn test_read_array() {
        let mut cursor = Cursor::new(b"OTDF\x01".to_vec());
        let magic: [u8; 4] = read_array(&mut cursor).unwrap();
        assert_eq!(&magic, b"OTDF");
        assert_eq!(read_u8(&mut cursor).unwrap(), 0x01);
    }

    #[test]
    fn test_varint_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(1), vec![0x01]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
        assert_eq!(encode(16_384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_varint_len_matches_encoding() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            assert_eq!(varint_len(value), encode(value).len(), "value {}", value);
        }
    }

    #[test]
    fn test_varint_truncated() {
        let err = read_varint(&mut Cursor::new(vec![0x80, 0x80])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err = read_varint(&mut Cursor::new(Vec::new())).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_varint_rejects_non_minimal() {
        let err = read_varint(&mut Cursor::new(vec![0x80, 0x00])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = read_varint(&mut Cursor::new(vec![0x81, 0x80, 0x00])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_varint_rejects_overflow_and_overlong() {
        let mut overflow = vec![0xFF; 9];
        overflow.push(0x02);
        let err = read_varint(&mut Cursor::new(overflow)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let overlong = vec![0x80; 11];
        let err = read_varint(&mut Cursor::new(overlong)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_varint_max_roundtrip() {
        let mut cursor = Cursor::new(encode(u64::MAX));
        assert_eq!(read_varint(&mut cursor).unwrap(), u64::MAX);
    }

    proptest! {
        #[test]
        fn varint_roundtrip(value in any::<u64>()) {
            let bytes = encode(value);
            let mut cursor = Cursor::new(&bytes);
            prop_assert_eq!(read_varint(&mut cursor).unwrap(), value);
            prop_assert_eq!(cursor.position() as usize, bytes.len());
        }
    }
}
