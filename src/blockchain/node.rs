use log::{debug, info, warn};

use super::block::{Block, BlockHeader};
use super::oracle::{ConsensusOracle, SubmitOutcome};
use super::params::ChainParams;
use super::pow::check_proof_of_work;
use crate::encoding::Hash256;
use crate::errors::ChainResult;
use crate::transaction::{HeightPush, UtxoSet};

/// One connected block, as the node remembers it.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    pub hash: Hash256,
    pub header: BlockHeader,
    pub height: u32,
}

/// In-memory regtest node: a single active chain plus its UTXO set.
///
/// Only blocks that extend the tip and hold nothing but a coinbase are
/// supported; everything else is rejected with a reason string.
#[derive(Debug)]
pub struct RegtestNode {
    params: ChainParams,
    chain: Vec<ChainEntry>,
    utxo: UtxoSet,
}

impl RegtestNode {
    /// Start from the network's genesis block. Its coinbase is not spendable
    /// and never enters the UTXO set.
    pub fn new(params: ChainParams) -> Self {
        let genesis = params.genesis_block();
        let entry = ChainEntry {
            hash: genesis.hash(),
            header: genesis.header,
            height: 0,
        };
        info!("NODE - {} genesis {}", params.network, entry.hash);
        Self {
            params,
            chain: vec![entry],
            utxo: UtxoSet::new(),
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// The chain always holds at least the genesis entry.
    pub fn tip(&self) -> &ChainEntry {
        &self.chain[self.chain.len() - 1]
    }

    pub fn height(&self) -> u32 {
        self.tip().height
    }

    pub fn utxo(&self) -> &UtxoSet {
        &self.utxo
    }

    pub fn block_hash_at(&self, height: u32) -> Option<Hash256> {
        self.chain.get(height as usize).map(|e| e.hash)
    }

    /// Median of the last `median_time_span` block times, tip included.
    pub fn median_time_past(&self) -> u32 {
        let span = self.params.median_time_span.max(1);
        let start = self.chain.len().saturating_sub(span);
        let mut times: Vec<u32> = self.chain[start..].iter().map(|e| e.header.time).collect();
        times.sort_unstable();
        times[times.len() / 2]
    }

    /// The node's notion of "now": the virtual clock start or the tip time,
    /// whichever is later. Wall-clock time plays no part.
    pub fn adjusted_time(&self) -> u32 {
        self.tip().header.time.max(self.params.initial_mock_time)
    }

    /// Validate `block` against the tip and connect it.
    pub fn process_block(&mut self, block: &Block) -> Result<(), &'static str> {
        let height = self.check_block(block)?;
        let hash = block.hash();

        for tx in &block.transactions {
            self.utxo.add_tx_outputs(tx, height);
        }
        self.chain.push(ChainEntry {
            hash,
            header: block.header,
            height,
        });
        debug!(
            "NODE - connected block #{} {} (utxo_size={})",
            height,
            hash,
            self.utxo.len()
        );
        Ok(())
    }

    fn check_block(&self, block: &Block) -> Result<u32, &'static str> {
        let hash = block.hash();
        if self.chain.iter().any(|e| e.hash == hash) {
            return Err("duplicate");
        }

        let tip = self.tip();
        if block.header.prev_block_hash != tip.hash {
            if self.chain.iter().any(|e| e.hash == block.header.prev_block_hash) {
                return Err("bad-prevblk-not-tip");
            }
            return Err("prev-blk-not-found");
        }
        let height = tip.height + 1;

        if block.header.bits != self.params.pow_limit_bits {
            return Err("bad-diffbits");
        }
        match check_proof_of_work(&block.header) {
            Ok(true) => {}
            Ok(false) => return Err("high-hash"),
            Err(_) => return Err("bad-diffbits"),
        }
        if block.header.time <= self.median_time_past() {
            return Err("time-too-old");
        }
        let latest = self.adjusted_time().saturating_add(self.params.max_future_block_time);
        if block.header.time > latest {
            return Err("time-too-new");
        }

        let coinbase = match block.coinbase() {
            Some(tx) if tx.is_coinbase() => tx,
            _ => return Err("bad-cb-missing"),
        };
        if block.transactions.len() > 1 {
            return Err("bad-blk-txns");
        }
        if !block.has_valid_merkle_root() {
            return Err("bad-txnmrklroot");
        }

        let script_sig = coinbase.inputs()[0].script_sig.as_bytes();
        if !(2..=100).contains(&script_sig.len()) {
            return Err("bad-cb-length");
        }
        if height >= self.params.bip34_height
            && !script_sig.starts_with(&HeightPush::for_height(height).to_bytes())
        {
            return Err("bad-cb-height");
        }
        if coinbase.total_output_value() > u128::from(self.params.reward.subsidy(height)) {
            return Err("bad-cb-amount");
        }

        Ok(height)
    }
}

impl ConsensusOracle for RegtestNode {
    fn submit_block(&mut self, raw_block: &[u8]) -> ChainResult<SubmitOutcome> {
        let block = match Block::from_bytes(raw_block) {
            Ok(block) => block,
            Err(e) => {
                warn!("NODE - block decode failed: {e}");
                return Ok(SubmitOutcome::Rejected(format!("block decode failed: {e}")));
            }
        };
        match self.process_block(&block) {
            Ok(()) => Ok(SubmitOutcome::Accepted),
            Err(reason) => {
                warn!("NODE - rejected block {}: {}", block.hash(), reason);
                Ok(SubmitOutcome::Rejected(reason.to_string()))
            }
        }
    }

    fn best_block_hash(&self) -> ChainResult<Hash256> {
        Ok(self.tip().hash)
    }

    fn chain_height(&self) -> ChainResult<u32> {
        Ok(self.height())
    }

    fn utxo_set_digest(&self) -> ChainResult<Hash256> {
        Ok(self.utxo.serialized_hash(&self.tip().hash))
    }
}
