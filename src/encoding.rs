//! Bitcoin wire primitives: fixed-width little-endian integers, CompactSize
//! lengths, the base-128 `VARINT` used by UTXO hashing, and 256-bit hashes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::DecodeError;

/// Upper bound for any length prefix we are willing to decode.
pub const MAX_SIZE: u64 = 0x0200_0000;

/// A 256-bit hash kept in internal (little-endian) byte order.
/// `Display` and hex conversions use the reversed, human-facing order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        let mut display = self.0;
        display.reverse();
        hex::encode(display)
    }

    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        let mut bytes = hex::decode(s.trim()).map_err(|_| DecodeError::InvalidHex)?;
        if bytes.len() != 32 {
            return Err(DecodeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        bytes.reverse();
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl FromStr for Hash256 {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    Hash256(out)
}

/* -------------------- writers -------------------- */

pub fn put_u8(dst: &mut Vec<u8>, x: u8) {
    dst.push(x);
}

pub fn put_u16(dst: &mut Vec<u8>, x: u16) {
    dst.extend_from_slice(&x.to_le_bytes());
}

pub fn put_u32(dst: &mut Vec<u8>, x: u32) {
    dst.extend_from_slice(&x.to_le_bytes());
}

pub fn put_i32(dst: &mut Vec<u8>, x: i32) {
    dst.extend_from_slice(&x.to_le_bytes());
}

pub fn put_u64(dst: &mut Vec<u8>, x: u64) {
    dst.extend_from_slice(&x.to_le_bytes());
}

pub fn put_hash(dst: &mut Vec<u8>, h: &Hash256) {
    dst.extend_from_slice(&h.0);
}

/// CompactSize length prefix (1, 3, 5 or 9 bytes).
pub fn put_compact_size(dst: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => put_u8(dst, n as u8),
        0xfd..=0xffff => {
            put_u8(dst, 0xfd);
            put_u16(dst, n as u16);
        }
        0x1_0000..=0xffff_ffff => {
            put_u8(dst, 0xfe);
            put_u32(dst, n as u32);
        }
        _ => {
            put_u8(dst, 0xff);
            put_u64(dst, n);
        }
    }
}

/// CompactSize length followed by the raw bytes.
pub fn put_var_bytes(dst: &mut Vec<u8>, bytes: &[u8]) {
    put_compact_size(dst, bytes.len() as u64);
    dst.extend_from_slice(bytes);
}

/// MSB-first base-128 integer where every continuation digit is offset by one,
/// so each value has exactly one encoding.
pub fn put_varint(dst: &mut Vec<u8>, mut n: u64) {
    let mut tmp = [0u8; 10];
    let mut len = 0;
    loop {
        tmp[len] = (n & 0x7f) as u8 | if len > 0 { 0x80 } else { 0x00 };
        if n <= 0x7f {
            break;
        }
        n = (n >> 7) - 1;
        len += 1;
    }
    dst.extend(tmp[..=len].iter().rev());
}

/* -------------------- reader -------------------- */

/// Cursor over a byte slice with bounds-checked reads.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash(&mut self) -> Result<Hash256, DecodeError> {
        Ok(Hash256(self.read_array()?))
    }

    pub fn read_compact_size(&mut self) -> Result<u64, DecodeError> {
        let n = match self.read_u8()? {
            0xfd => {
                let v = u64::from(self.read_u16()?);
                if v < 0xfd {
                    return Err(DecodeError::NonCanonicalCompactSize);
                }
                v
            }
            0xfe => {
                let v = u64::from(self.read_u32()?);
                if v < 0x1_0000 {
                    return Err(DecodeError::NonCanonicalCompactSize);
                }
                v
            }
            0xff => {
                let v = self.read_u64()?;
                if v < 0x1_0000_0000 {
                    return Err(DecodeError::NonCanonicalCompactSize);
                }
                v
            }
            small => u64::from(small),
        };
        if n > MAX_SIZE {
            return Err(DecodeError::OversizedLength(n));
        }
        Ok(n)
    }

    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_compact_size()?;
        self.read_bytes(len as usize)
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut n: u64 = 0;
        loop {
            let byte = self.read_u8()?;
            if n > (u64::MAX >> 7) {
                return Err(DecodeError::VarIntOverflow);
            }
            n = (n << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 == 0 {
                return Ok(n);
            }
            n = n.checked_add(1).ok_or(DecodeError::VarIntOverflow)?;
        }
    }

    /// Fails if any unread bytes remain.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_is_byte_reversed() {
        let mut raw = [0u8; 32];
        raw[0] = 0x01;
        raw[31] = 0xff;
        let h = Hash256(raw);
        let hex = h.to_hex();
        assert!(hex.starts_with("ff"));
        assert!(hex.ends_with("01"));
        assert_eq!(Hash256::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn hash_from_hex_rejects_wrong_length() {
        assert_eq!(
            Hash256::from_hex("abcd"),
            Err(DecodeError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
        assert_eq!(Hash256::from_hex("zz"), Err(DecodeError::InvalidHex));
    }

    #[test]
    fn sha256d_of_empty_input() {
        // sha256(sha256(""))
        assert_eq!(
            hex::encode(sha256d(b"").0),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn compact_size_boundaries() {
        let cases: [(u64, &str); 5] = [
            (0, "00"),
            (0xfc, "fc"),
            (0xfd, "fdfd00"),
            (0xffff, "fdffff"),
            (0x1_0000, "fe00000100"),
        ];
        for (n, expected) in cases {
            let mut buf = Vec::new();
            put_compact_size(&mut buf, n);
            assert_eq!(hex::encode(&buf), expected, "n={n}");
            let mut r = Reader::new(&buf);
            assert_eq!(r.read_compact_size().unwrap(), n);
            r.finish().unwrap();
        }
    }

    #[test]
    fn compact_size_rejects_non_canonical() {
        let mut r = Reader::new(&[0xfd, 0x10, 0x00]);
        assert_eq!(
            r.read_compact_size(),
            Err(DecodeError::NonCanonicalCompactSize)
        );
    }

    #[test]
    fn varint_known_encodings() {
        let cases: [(u64, &str); 6] = [
            (0, "00"),
            (0x7f, "7f"),
            (0x80, "8000"),
            (0x1234, "a334"),
            (0xffff, "82fe7f"),
            (0x1_0000, "82ff00"),
        ];
        for (n, expected) in cases {
            let mut buf = Vec::new();
            put_varint(&mut buf, n);
            assert_eq!(hex::encode(&buf), expected, "n={n}");
            assert_eq!(Reader::new(&buf).read_varint().unwrap(), n);
        }
    }

    #[test]
    fn reader_reports_eof_and_trailing_bytes() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert_eq!(
            r.read_u32(),
            Err(DecodeError::UnexpectedEof {
                needed: 4,
                remaining: 3
            })
        );
        let mut r = Reader::new(&[1, 2, 3]);
        r.read_u8().unwrap();
        assert_eq!(r.finish(), Err(DecodeError::TrailingBytes(2)));
    }
}
