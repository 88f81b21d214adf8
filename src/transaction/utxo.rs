use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::encoding::{Hash256, put_hash, put_var_bytes, put_varint, sha256d};

use super::model::{Transaction, TxOutput};

/// Identifies a specific transaction output by its txid and index.
/// Ordering is by txid bytes (internal order), then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    /// The reference carried by every coinbase input.
    pub const fn null() -> Self {
        Self {
            txid: Hash256::ZERO,
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_zero() && self.vout == u32::MAX
    }
}

/// An unspent output plus the context it was created in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub output: TxOutput,
    pub height: u32,
    pub is_coinbase: bool,
}

/// UTXO set kept in outpoint order so that hashing it is deterministic.
#[derive(Debug, Default)]
pub struct UtxoSet {
    map: BTreeMap<OutPoint, Coin>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, outpoint: OutPoint, coin: Coin) {
        self.map.insert(outpoint, coin);
    }

    /// Spend (remove) a single outpoint. Returns the removed coin if it existed.
    pub fn spend(&mut self, outpoint: &OutPoint) -> Option<Coin> {
        self.map.remove(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.map.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.map.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &Coin)> {
        self.map.iter()
    }

    pub fn total_value(&self) -> u128 {
        self.map.values().map(|c| c.output.value as u128).sum()
    }

    /// Add every output of `tx` as a coin created at `height`.
    pub fn add_tx_outputs(&mut self, tx: &Transaction, height: u32) {
        let is_coinbase = tx.is_coinbase();
        for (i, out) in tx.outputs().iter().enumerate() {
            let op = OutPoint {
                txid: tx.txid(),
                vout: i as u32,
            };
            self.insert(
                op,
                Coin {
                    output: out.clone(),
                    height,
                    is_coinbase,
                },
            );
        }
    }

    /// Digest over the whole set, committed to `best_block`.
    ///
    /// Coins are grouped per txid. Each group writes the txid, a header code
    /// `height * 2 + coinbase`, then `index + 1`, script and value for every
    /// output, closed by a zero.
    pub fn serialized_hash(&self, best_block: &Hash256) -> Hash256 {
        let mut ss = Vec::with_capacity(32 + self.map.len() * 80);
        put_hash(&mut ss, best_block);

        let mut current: Option<Hash256> = None;
        for (op, coin) in &self.map {
            if current != Some(op.txid) {
                if current.is_some() {
                    put_varint(&mut ss, 0);
                }
                put_hash(&mut ss, &op.txid);
                put_varint(
                    &mut ss,
                    u64::from(coin.height) * 2 + u64::from(coin.is_coinbase),
                );
                current = Some(op.txid);
            }
            put_varint(&mut ss, u64::from(op.vout) + 1);
            put_var_bytes(&mut ss, coin.output.script_pubkey.as_bytes());
            put_varint(&mut ss, coin.output.value);
        }
        if current.is_some() {
            put_varint(&mut ss, 0);
        }

        sha256d(&ss)
    }
}
