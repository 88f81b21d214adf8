use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::block::{Block, BlockHeader};
use super::oracle::{ConsensusOracle, SubmitOutcome};
use super::params::ChainParams;
use super::pow;
use crate::encoding::Hash256;
use crate::errors::{ChainError, ChainResult};
use crate::transaction::build_coinbase;
use crate::wallet::RecipientKey;

/// Build and solve a coinbase-only block on top of `parent`.
pub fn assemble_block(
    height: u32,
    parent: Hash256,
    time: u32,
    recipient: &RecipientKey,
    params: &ChainParams,
) -> ChainResult<Block> {
    let coinbase = build_coinbase(height, recipient, params)?;
    let header = BlockHeader {
        version: params.block_version,
        prev_block_hash: parent,
        merkle_root: coinbase.txid(),
        time,
        bits: params.pow_limit_bits,
        nonce: 0,
    };
    let header = pow::solve(header)?;
    Ok(Block {
        header,
        transactions: vec![coinbase],
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverPhase {
    Idle,
    Advancing,
    Done,
}

/// Everything carried from one generated block to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverState {
    pub tip: Hash256,
    /// Height of the next block to build.
    pub height: u32,
    /// Virtual timestamp of the next block.
    pub time: u32,
}

impl DriverState {
    pub fn new(tip: Hash256, height: u32, time: u32) -> Self {
        Self { tip, height, time }
    }

    /// The state after a block on top of `self`, with `tip` as the new tip.
    pub fn next(self, tip: Hash256) -> ChainResult<Self> {
        match (self.height.checked_add(1), self.time.checked_add(1)) {
            (Some(height), Some(time)) => Ok(Self { tip, height, time }),
            _ => Err(ChainError::InvalidInput(format!(
                "cannot advance past height {} at time {}",
                self.height, self.time
            ))),
        }
    }
}

/// Build the block for `state`, submit it and confirm the tip moved.
/// Returns the successor state; `state` itself is never modified.
pub fn advance_state<O: ConsensusOracle + ?Sized>(
    state: DriverState,
    params: &ChainParams,
    recipient: &RecipientKey,
    oracle: &mut O,
) -> ChainResult<DriverState> {
    // fail before submitting anything if there is no successor
    let successor = state.next(state.tip)?;
    let block = assemble_block(state.height, state.tip, state.time, recipient, params)?;

    if let SubmitOutcome::Rejected(reason) = oracle.submit_block(&block.serialize())? {
        warn!(
            "DRIVER - block #{} {} rejected: {}",
            state.height,
            block.hash(),
            reason
        );
        return Err(ChainError::BlockRejected {
            height: state.height,
            reason,
        });
    }

    let tip = oracle.best_block_hash()?;
    if tip == state.tip {
        return Err(ChainError::TipUnchanged {
            height: state.height,
            tip,
        });
    }
    debug!(
        "DRIVER - block #{} accepted (hash={}, nonce={}, time={})",
        state.height, tip, block.header.nonce, state.time
    );
    Ok(DriverState { tip, ..successor })
}

fn next_height(chain_height: u32) -> ChainResult<u32> {
    chain_height
        .checked_add(1)
        .ok_or_else(|| ChainError::InvalidInput(format!("chain height {chain_height} is at the limit")))
}

/// Generates blocks one at a time against a consensus oracle.
#[derive(Debug, Clone)]
pub struct ChainDriver {
    params: ChainParams,
    recipient: RecipientKey,
    state: DriverState,
    phase: DriverPhase,
    target_height: Option<u32>,
}

impl ChainDriver {
    pub fn new(params: ChainParams, recipient: RecipientKey, start: DriverState) -> Self {
        Self {
            params,
            recipient,
            state: start,
            phase: DriverPhase::Idle,
            target_height: None,
        }
    }

    /// Seed tip and height from the oracle, the clock from the params.
    pub fn from_oracle<O: ConsensusOracle + ?Sized>(
        params: ChainParams,
        recipient: RecipientKey,
        oracle: &O,
    ) -> ChainResult<Self> {
        let start = DriverState::new(
            oracle.best_block_hash()?,
            next_height(oracle.chain_height()?)?,
            params.initial_mock_time,
        );
        Ok(Self::new(params, recipient, start))
    }

    /// Stop (phase `Done`) once the chain reaches `height`.
    pub fn with_target_height(mut self, height: u32) -> Self {
        self.target_height = Some(height);
        if self.reached_target() {
            self.phase = DriverPhase::Done;
        }
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn recipient(&self) -> &RecipientKey {
        &self.recipient
    }

    /// Re-read tip and height from the oracle, keeping the virtual clock.
    pub fn resync<O: ConsensusOracle + ?Sized>(&mut self, oracle: &O) -> ChainResult<DriverState> {
        let tip = oracle.best_block_hash()?;
        let height = next_height(oracle.chain_height()?)?;
        if tip != self.state.tip {
            info!(
                "DRIVER - resynced to tip {} (next height {})",
                tip, height
            );
        }
        self.state = DriverState::new(tip, height, self.state.time);
        self.phase = if self.reached_target() {
            DriverPhase::Done
        } else {
            DriverPhase::Idle
        };
        Ok(self.state)
    }

    /// Move the virtual clock forward to at least `time`. Never rewinds.
    pub fn bump_clock(&mut self, time: u32) {
        if time > self.state.time {
            debug!("DRIVER - clock {} -> {}", self.state.time, time);
            self.state.time = time;
        }
    }

    /// The block `advance` would submit next.
    pub fn next_block(&self) -> ChainResult<Block> {
        assemble_block(
            self.state.height,
            self.state.tip,
            self.state.time,
            &self.recipient,
            &self.params,
        )
    }

    /// Build, submit and confirm one block, returning the new state.
    /// A rejection aborts the run; the state is left untouched.
    pub fn advance<O: ConsensusOracle + ?Sized>(&mut self, oracle: &mut O) -> ChainResult<DriverState> {
        if self.phase == DriverPhase::Done {
            return Err(ChainError::InvalidInput(format!(
                "driver already reached target height {}",
                self.target_height.unwrap_or(self.state.height.saturating_sub(1))
            )));
        }

        self.phase = DriverPhase::Advancing;
        match advance_state(self.state, &self.params, &self.recipient, oracle) {
            Ok(next) => {
                self.state = next;
                self.phase = if self.reached_target() {
                    DriverPhase::Done
                } else {
                    DriverPhase::Idle
                };
                Ok(next)
            }
            Err(e) => {
                self.phase = DriverPhase::Idle;
                Err(e)
            }
        }
    }

    pub fn advance_by<O: ConsensusOracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        blocks: u32,
    ) -> ChainResult<DriverState> {
        for _ in 0..blocks {
            self.advance(oracle)?;
        }
        if blocks > 0 {
            info!(
                "DRIVER - generated {} blocks, tip {} at height {}",
                blocks,
                self.state.tip,
                self.state.height.saturating_sub(1)
            );
        }
        Ok(self.state)
    }

    /// Advance until the target height; without a target this is a no-op.
    pub fn run_to_target<O: ConsensusOracle + ?Sized>(&mut self, oracle: &mut O) -> ChainResult<DriverState> {
        while self.phase != DriverPhase::Done && self.target_height.is_some() {
            self.advance(oracle)?;
        }
        Ok(self.state)
    }

    fn reached_target(&self) -> bool {
        self.target_height
            .is_some_and(|target| self.state.height > target)
    }
}
