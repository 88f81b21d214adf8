//! Compact difficulty targets and the nonce search.
//!
//! A header satisfies proof-of-work when its hash, read as a 256-bit
//! little-endian number, is at most the target expanded from `bits`.

use log::{debug, warn};

use super::block::BlockHeader;
use crate::encoding::Hash256;
use crate::errors::{ChainError, ChainResult};

/// Every 32-bit nonce.
pub const FULL_NONCE_RANGE: u64 = u32::MAX as u64 + 1;

/// A 256-bit target held big-endian so byte order matches numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target([u8; 32]);

impl Target {
    /// Expand the compact `bits` form (8-bit exponent, 23-bit mantissa, sign
    /// bit). Negative, overflowing and zero targets are rejected.
    pub fn from_compact(bits: u32) -> ChainResult<Self> {
        let size = (bits >> 24) as i64;
        let word = bits & 0x007f_ffff;
        if word != 0 && bits & 0x0080_0000 != 0 {
            return Err(ChainError::InvalidCompactBits(bits));
        }

        let mantissa = [(word >> 16) as u8, (word >> 8) as u8, word as u8];
        let mut out = [0u8; 32];
        for (i, byte) in mantissa.iter().enumerate() {
            // byte position counted from the least significant end
            let pos = size - 3 + (2 - i as i64);
            if pos < 0 {
                continue;
            }
            if pos > 31 {
                if *byte != 0 {
                    return Err(ChainError::InvalidCompactBits(bits));
                }
                continue;
            }
            out[31 - pos as usize] = *byte;
        }

        if out == [0u8; 32] {
            return Err(ChainError::InvalidCompactBits(bits));
        }
        Ok(Self(out))
    }

    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        let mut be = hash.0;
        be.reverse();
        be <= self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

pub fn check_proof_of_work(header: &BlockHeader) -> ChainResult<bool> {
    let target = Target::from_compact(header.bits)?;
    Ok(target.is_met_by(&header.hash()))
}

/// Search the whole nonce space starting from zero.
pub fn solve(header: BlockHeader) -> ChainResult<BlockHeader> {
    solve_within(header, FULL_NONCE_RANGE)
}

/// Try at most `max_attempts` nonces, counting up from zero.
pub fn solve_within(mut header: BlockHeader, max_attempts: u64) -> ChainResult<BlockHeader> {
    let target = Target::from_compact(header.bits)?;
    header.nonce = 0;

    let mut attempts: u64 = 0;
    while attempts < max_attempts {
        attempts += 1;
        if target.is_met_by(&header.hash()) {
            debug!("POW - solved nonce={} after {} attempts", header.nonce, attempts);
            return Ok(header);
        }
        match header.nonce.checked_add(1) {
            Some(next) => header.nonce = next,
            None => break,
        }
    }

    warn!("POW - no nonce found for bits={:#010x} in {} attempts", header.bits, attempts);
    Err(ChainError::NonceExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::sha256d;

    fn header(bits: u32) -> BlockHeader {
        BlockHeader {
            version: 0x2000_0000,
            prev_block_hash: sha256d(b"parent"),
            merkle_root: sha256d(b"merkle"),
            time: 1_598_887_952,
            bits,
            nonce: 0,
        }
    }

    #[test]
    fn compact_expansion() {
        assert_eq!(
            Target::from_compact(0x207f_ffff).unwrap().to_hex(),
            format!("7fffff{}", "00".repeat(29))
        );
        assert_eq!(
            Target::from_compact(0x1d00_ffff).unwrap().to_hex(),
            format!("00000000ffff{}", "00".repeat(26))
        );
        assert_eq!(
            Target::from_compact(0x0500_9234).unwrap().to_hex(),
            format!("{}92340000", "00".repeat(28))
        );
        assert_eq!(
            Target::from_compact(0x0112_3456).unwrap().to_hex(),
            format!("{}12", "00".repeat(31))
        );
    }

    #[test]
    fn compact_rejects_negative_zero_and_overflow() {
        for bits in [0x0492_3456, 0x0000_0000, 0x0100_3456, 0xff12_3456, 0x2201_0000] {
            assert!(
                matches!(Target::from_compact(bits), Err(ChainError::InvalidCompactBits(b)) if b == bits),
                "bits={bits:#x}"
            );
        }
    }

    #[test]
    fn target_comparison_uses_little_endian_hash() {
        let target = Target::from_compact(0x207f_ffff).unwrap();
        let mut low = [0xffu8; 32];
        low[31] = 0x7f;
        low[30] = 0xff;
        low[29] = 0xff;
        // 0x7fffff ffff..ff is above a target of 0x7fffff 00..00
        assert!(!target.is_met_by(&Hash256(low)));
        let mut high = [0u8; 32];
        high[31] = 0x7f;
        assert!(target.is_met_by(&Hash256(high)));
        high[31] = 0x80;
        assert!(!target.is_met_by(&Hash256(high)));
    }

    #[test]
    fn solve_meets_permissive_target() {
        let solved = solve(header(0x207f_ffff)).unwrap();
        assert!(check_proof_of_work(&solved).unwrap());
        assert!(solved.nonce < 64);
    }

    #[test]
    fn solve_restarts_from_zero() {
        let mut h = header(0x207f_ffff);
        h.nonce = 12345;
        let solved = solve(h).unwrap();
        assert_eq!(solved, solve(header(0x207f_ffff)).unwrap());
    }

    #[test]
    fn strict_target_reports_exhaustion() {
        // target of 1: no realistic hash satisfies it
        let err = solve_within(header(0x0300_0001), 16).unwrap_err();
        assert!(matches!(err, ChainError::NonceExhausted { attempts: 16 }));
    }

    #[test]
    fn invalid_bits_fail_before_searching() {
        assert!(matches!(
            solve(header(0x0492_3456)),
            Err(ChainError::InvalidCompactBits(_))
        ));
    }
}
