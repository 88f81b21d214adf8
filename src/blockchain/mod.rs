pub mod block;
pub mod checkpoint;
pub mod miner;
pub mod node;
pub mod oracle;
pub mod params;
pub mod pow;
pub mod reward;

pub use block::{Block, BlockHeader};
pub use checkpoint::{Checkpoint, CheckpointLiteral};
pub use miner::{ChainDriver, DriverPhase, DriverState, assemble_block};
pub use node::RegtestNode;
pub use oracle::{ConsensusOracle, SubmitOutcome};
pub use params::ChainParams;
pub use reward::RewardSchedule;

/// Version signalled by generated blocks (version-bits top marker, no deployments).
pub const BLOCK_VERSION: i32 = 0x2000_0000;

/// Compact encoding of the regtest proof-of-work limit.
pub const POW_LIMIT_BITS: u32 = 0x207f_ffff;
