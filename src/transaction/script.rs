use std::fmt;

use crate::wallet::RecipientKey;

pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1: u8 = 0x51;
    pub const OP_16: u8 = 0x60;
    pub const OP_CHECKSIG: u8 = 0xac;
}

use opcodes::*;

/// Raw script bytes with a small builder for the pushes a coinbase needs.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn push_opcode(mut self, op: u8) -> Self {
        self.0.push(op);
        self
    }

    /// Push `data` using the shortest push-data prefix for its length.
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.0.push(len as u8);
        } else if len <= 0xff {
            self.0.push(OP_PUSHDATA1);
            self.0.push(len as u8);
        } else if len <= 0xffff {
            self.0.push(OP_PUSHDATA2);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(OP_PUSHDATA4);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
        self
    }

    /// `<pubkey> OP_CHECKSIG`
    pub fn pay_to_pubkey(key: &RecipientKey) -> Self {
        Self::new()
            .push_slice(key.as_bytes())
            .push_opcode(OP_CHECKSIG)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

/// Minimal signed little-endian encoding used for numbers on the script stack.
/// Zero encodes to the empty vector.
pub fn encode_script_num(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let negative = value < 0;
    let mut abs = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Inverse of [`encode_script_num`]. Rejects anything wider than 8 bytes.
pub fn decode_script_num(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() {
        return Some(0);
    }
    if bytes.len() > 8 {
        return None;
    }
    let mut magnitude: u64 = 0;
    for (i, b) in bytes.iter().enumerate() {
        magnitude |= u64::from(*b) << (8 * i);
    }
    let sign_bit = 0x80u64 << (8 * (bytes.len() - 1));
    if magnitude & sign_bit != 0 {
        let abs = magnitude & !sign_bit;
        i64::try_from(abs).ok().map(|v| -v)
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// How a block height is pushed at the front of a coinbase script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeightPush {
    /// Heights 1..=16 as the single opcode `OP_1 + height - 1`.
    SmallInt(u8),
    /// Everything else as a length-prefixed script number.
    ScriptNum(Vec<u8>),
}

impl HeightPush {
    pub fn for_height(height: u32) -> Self {
        match height {
            1..=16 => HeightPush::SmallInt(OP_1 + (height - 1) as u8),
            _ => HeightPush::ScriptNum(encode_script_num(i64::from(height))),
        }
    }

    /// The exact bytes a coinbase script must start with.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9);
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            HeightPush::SmallInt(op) => out.push(*op),
            HeightPush::ScriptNum(num) => {
                out.push(num.len() as u8);
                out.extend_from_slice(num);
            }
        }
    }
}

/// Coinbase unlocking script: height push followed by a fixed tag push.
pub fn encode_coinbase_script(height: u32, tag: &[u8]) -> Script {
    let mut bytes = Vec::with_capacity(6 + 1 + tag.len());
    HeightPush::for_height(height).write_to(&mut bytes);
    Script::from_bytes(bytes).push_slice(tag)
}

/// Recover the height pushed at the front of a coinbase script. Lenient about
/// non-minimal pushes; consensus checks compare [`HeightPush::to_bytes`].
pub fn decode_coinbase_height(script: &[u8]) -> Option<u32> {
    let first = *script.first()?;
    match first {
        OP_0 => Some(0),
        OP_1..=OP_16 => Some(u32::from(first - OP_1) + 1),
        0x01..=0x08 => {
            let num = script.get(1..1 + first as usize)?;
            decode_script_num(num).and_then(|v| u32::try_from(v).ok())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TAG: &[u8] = b"/EB32.0/";

    #[test]
    fn script_num_known_values() {
        assert_eq!(encode_script_num(0), Vec::<u8>::new());
        assert_eq!(encode_script_num(17), vec![0x11]);
        assert_eq!(encode_script_num(127), vec![0x7f]);
        assert_eq!(encode_script_num(128), vec![0x80, 0x00]);
        assert_eq!(encode_script_num(255), vec![0xff, 0x00]);
        assert_eq!(encode_script_num(256), vec![0x00, 0x01]);
        assert_eq!(encode_script_num(-1), vec![0x81]);
        assert_eq!(encode_script_num(-128), vec![0x80, 0x80]);
        assert_eq!(encode_script_num(486_604_799), vec![0xff, 0xff, 0x00, 0x1d]);
    }

    #[test]
    fn small_heights_use_a_single_opcode() {
        assert_eq!(HeightPush::for_height(1), HeightPush::SmallInt(OP_1));
        assert_eq!(HeightPush::for_height(16), HeightPush::SmallInt(OP_16));
        assert_eq!(HeightPush::for_height(17), HeightPush::ScriptNum(vec![0x11]));
    }

    #[test]
    fn coinbase_script_layout() {
        assert_eq!(
            hex::encode(encode_coinbase_script(1, TAG).as_bytes()),
            "51082f454233322e302f"
        );
        assert_eq!(
            hex::encode(encode_coinbase_script(17, TAG).as_bytes()),
            "0111082f454233322e302f"
        );
        assert_eq!(
            hex::encode(encode_coinbase_script(128, TAG).as_bytes()),
            "028000082f454233322e302f"
        );
    }

    #[test]
    fn push_slice_prefixes() {
        assert_eq!(Script::new().push_slice(&[0xaa; 75]).as_bytes()[0], 75);
        let s = Script::new().push_slice(&[0xaa; 76]);
        assert_eq!(&s.as_bytes()[..2], &[OP_PUSHDATA1, 76]);
        let s = Script::new().push_slice(&[0xaa; 300]);
        assert_eq!(&s.as_bytes()[..3], &[OP_PUSHDATA2, 0x2c, 0x01]);
    }

    #[test]
    fn decode_rejects_truncated_push() {
        assert_eq!(decode_coinbase_height(&[0x03, 0x01]), None);
        assert_eq!(decode_coinbase_height(&[]), None);
    }

    proptest! {
        #[test]
        fn coinbase_height_round_trips(height in 1u32..=2_000_000) {
            let script = encode_coinbase_script(height, TAG);
            prop_assert_eq!(decode_coinbase_height(script.as_bytes()), Some(height));
        }

        #[test]
        fn coinbase_scripts_are_injective(a in 1u32..=100_000, b in 1u32..=100_000) {
            prop_assume!(a != b);
            prop_assert_ne!(encode_coinbase_script(a, TAG), encode_coinbase_script(b, TAG));
        }

        #[test]
        fn script_num_round_trips(v in -(1i64 << 40)..(1i64 << 40)) {
            prop_assert_eq!(decode_script_num(&encode_script_num(v)), Some(v));
        }
    }
}
