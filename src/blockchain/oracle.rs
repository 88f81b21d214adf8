use crate::encoding::Hash256;
use crate::errors::ChainResult;

/// Verdict on a submitted block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// The node's rejection reason, e.g. `high-hash`.
    Rejected(String),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// The authority that validates blocks and reports chain state.
pub trait ConsensusOracle {
    fn submit_block(&mut self, raw_block: &[u8]) -> ChainResult<SubmitOutcome>;
    fn best_block_hash(&self) -> ChainResult<Hash256>;
    fn chain_height(&self) -> ChainResult<u32>;
    fn utxo_set_digest(&self) -> ChainResult<Hash256>;
}
