use crate::encoding::{Hash256, Reader, put_compact_size, put_hash, put_i32, put_u32, sha256d};
use crate::errors::DecodeError;
use crate::transaction::Transaction;

/// The 80-byte header that proof-of-work commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 80;

    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        put_i32(dst, self.version);
        put_hash(dst, &self.prev_block_hash);
        put_hash(dst, &self.merkle_root);
        put_u32(dst, self.time);
        put_u32(dst, self.bits);
        put_u32(dst, self.nonce);
    }

    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut buf = Vec::with_capacity(Self::SIZE);
        self.encode_to(&mut buf);
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(&buf);
        out
    }

    pub fn hash(&self) -> Hash256 {
        sha256d(&self.serialize())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            version: r.read_i32()?,
            prev_block_hash: r.read_hash()?,
            merkle_root: r.read_hash()?,
            time: r.read_u32()?,
            bits: r.read_u32()?,
            nonce: r.read_u32()?,
        })
    }
}

/// A header plus its ordered transactions, coinbase first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn compute_merkle_root(&self) -> Hash256 {
        let txids: Vec<Hash256> = self.transactions.iter().map(|t| t.txid()).collect();
        merkle_root(&txids)
    }

    pub fn has_valid_merkle_root(&self) -> bool {
        self.header.merkle_root == self.compute_merkle_root()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BlockHeader::SIZE + 1 + self.transactions.len() * 128);
        self.header.encode_to(&mut out);
        put_compact_size(&mut out, self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode_to(&mut out);
        }
        out
    }

    /// Parse a complete block; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);
        let header = BlockHeader::decode(&mut r)?;
        let count = r.read_compact_size()?;
        let mut transactions = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            transactions.push(Transaction::decode(&mut r)?);
        }
        r.finish()?;
        Ok(Self {
            header,
            transactions,
        })
    }
}

/// Pairwise double-SHA256 tree over txids, duplicating the last entry of odd
/// levels. A single leaf is its own root; no leaves give the zero hash.
pub fn merkle_root(txids: &[Hash256]) -> Hash256 {
    if txids.is_empty() {
        return Hash256::ZERO;
    }
    let mut level: Vec<Hash256> = txids.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = level[level.len() - 1];
            level.push(last);
        }
        level = level
            .chunks(2)
            .map(|pair| {
                let mut buf = [0u8; 64];
                buf[..32].copy_from_slice(pair[0].as_bytes());
                buf[32..].copy_from_slice(pair[1].as_bytes());
                sha256d(&buf)
            })
            .collect();
    }
    level[0]
}
