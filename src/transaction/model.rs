use crate::encoding::{
    Hash256, Reader, put_hash, put_i32, put_u32, put_u64, put_var_bytes, put_compact_size,
    sha256d,
};
use crate::errors::DecodeError;

use super::Amount;
use super::script::Script;
use super::utxo::OutPoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// The output being spent; null for a coinbase.
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: Amount,
    pub script_pubkey: Script,
}

/// An immutable transaction. The txid is computed once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    version: i32,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    lock_time: u32,
    txid: Hash256,
}

impl Transaction {
    pub fn new(version: i32, inputs: Vec<TxInput>, outputs: Vec<TxOutput>, lock_time: u32) -> Self {
        let mut tx = Self {
            version,
            inputs,
            outputs,
            lock_time,
            txid: Hash256::ZERO,
        };
        tx.txid = sha256d(&tx.serialize());
        tx
    }

    pub fn txid(&self) -> Hash256 {
        self.txid
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    pub fn total_output_value(&self) -> u128 {
        self.outputs.iter().map(|o| o.value as u128).sum()
    }

    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        put_i32(dst, self.version);
        put_compact_size(dst, self.inputs.len() as u64);
        for input in &self.inputs {
            put_hash(dst, &input.prevout.txid);
            put_u32(dst, input.prevout.vout);
            put_var_bytes(dst, input.script_sig.as_bytes());
            put_u32(dst, input.sequence);
        }
        put_compact_size(dst, self.outputs.len() as u64);
        for output in &self.outputs {
            put_u64(dst, output.value);
            put_var_bytes(dst, output.script_pubkey.as_bytes());
        }
        put_u32(dst, self.lock_time);
    }

    /// Wire serialization; the txid is the double SHA-256 of these bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        self.encode_to(&mut out);
        out
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let version = r.read_i32()?;
        let n_in = r.read_compact_size()?;
        let mut inputs = Vec::with_capacity(n_in.min(1024) as usize);
        for _ in 0..n_in {
            let txid = r.read_hash()?;
            let vout = r.read_u32()?;
            let script_sig = Script::from_bytes(r.read_var_bytes()?.to_vec());
            let sequence = r.read_u32()?;
            inputs.push(TxInput {
                prevout: OutPoint { txid, vout },
                script_sig,
                sequence,
            });
        }
        let n_out = r.read_compact_size()?;
        let mut outputs = Vec::with_capacity(n_out.min(1024) as usize);
        for _ in 0..n_out {
            let value = r.read_u64()?;
            let script_pubkey = Script::from_bytes(r.read_var_bytes()?.to_vec());
            outputs.push(TxOutput {
                value,
                script_pubkey,
            });
        }
        let lock_time = r.read_u32()?;
        Ok(Self::new(version, inputs, outputs, lock_time))
    }
}
