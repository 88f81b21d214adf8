use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::oracle::ConsensusOracle;
use super::params::ChainParams;
use crate::encoding::Hash256;
use crate::errors::{ChainError, ChainResult};

/// Expected chain state at a height. Absent fields are not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub height: u32,
    #[serde(default)]
    pub tip_hash: Option<Hash256>,
    #[serde(default)]
    pub utxo_digest: Option<Hash256>,
}

/// Hex form of a [`Checkpoint`] usable in `const` tables.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointLiteral {
    pub height: u32,
    pub tip_hash: Option<&'static str>,
    pub utxo_digest: Option<&'static str>,
}

impl CheckpointLiteral {
    pub fn parse(&self) -> ChainResult<Checkpoint> {
        Ok(Checkpoint {
            height: self.height,
            tip_hash: self.tip_hash.map(Hash256::from_hex).transpose()?,
            utxo_digest: self.utxo_digest.map(Hash256::from_hex).transpose()?,
        })
    }
}

/// Regtest checkpoints as computed by the in-process node.
pub const LOCAL_NODE_CHECKPOINTS: &[CheckpointLiteral] = &[
    CheckpointLiteral {
        height: 100,
        tip_hash: Some("5afde277a26b6f36aee8f61a1dbf755587e1c6be63e654a88abe2a1ff0fbfb05"),
        utxo_digest: None,
    },
    CheckpointLiteral {
        height: 110,
        tip_hash: Some("47cfb2b77860d250060e78d3248bb050928765453cbcbdbc121e3c48b99a376c"),
        utxo_digest: Some("d754ca97ef24c5132f8d2147c19310b7a6bd136766430304735a73372fe36213"),
    },
    CheckpointLiteral {
        height: 210,
        tip_hash: Some("767967616a02b32b05f8a587565190a388b333913d038846542009893f48e474"),
        utxo_digest: Some("73b4bc8dd69649c6e9ede39b156713109bf044d2466661a3fe8a8b91ba601849"),
    },
];

/// Checkpoints recorded against a full regtest node over RPC.
pub const REFERENCE_NODE_CHECKPOINTS: &[CheckpointLiteral] = &[
    CheckpointLiteral {
        height: 100,
        tip_hash: Some("8916b4cf6a6dbb901536365ed5541e39f9ec3b95880762300d0401360bd9cce9"),
        utxo_digest: None,
    },
    CheckpointLiteral {
        height: 110,
        tip_hash: None,
        utxo_digest: Some("1044c43d9fb50a5370fa67c114db0555b4f14842b955cb11652663a4c22d1be2"),
    },
    CheckpointLiteral {
        height: 210,
        tip_hash: None,
        utxo_digest: Some("9aba7b8b03f5cd2396f9dfab892e17f8c9307b9d9e1ebcacd1bd4fa99eb01249"),
    },
];

/// Genesis of the regtest variant with the 88-coin "Yahoo7 News" genesis
/// coinbase. Its nodes ship assumeutxo commitments for heights 110 and 210.
pub const ASSUMEUTXO_REGTEST_GENESIS: &str =
    "3d2160a3b5dc4a9d62e7e66a295f70313ac808440ef7400d6c0772171ce973a5";

/// Assumeutxo snapshot hashes compiled into that variant's regtest params.
pub const ASSUMEUTXO_CHECKPOINTS: &[CheckpointLiteral] = &[
    CheckpointLiteral {
        height: 0,
        tip_hash: Some(ASSUMEUTXO_REGTEST_GENESIS),
        utxo_digest: None,
    },
    CheckpointLiteral {
        height: 110,
        tip_hash: None,
        utxo_digest: Some("fcfa07adecbe5f753b9f062b5e5621dcdd9f998a45968876cb98d350667d745e"),
    },
    CheckpointLiteral {
        height: 210,
        tip_hash: None,
        utxo_digest: Some("6fa0d0be104a5990d6f743820b8a5e9eb7d525cc55e2bdb595d49e0cde33e0b5"),
    },
];

/// The recorded checkpoint table for a node started from `genesis`.
pub fn checkpoints_for_genesis(genesis: &Hash256) -> Option<&'static [CheckpointLiteral]> {
    if *genesis == ChainParams::regtest().genesis_hash() {
        Some(REFERENCE_NODE_CHECKPOINTS)
    } else if genesis.to_hex() == ASSUMEUTXO_REGTEST_GENESIS {
        Some(ASSUMEUTXO_CHECKPOINTS)
    } else {
        None
    }
}

/// Compare the oracle's height, tip and UTXO digest against `checkpoint`,
/// in that order. The first difference is returned.
pub fn verify<O: ConsensusOracle + ?Sized>(oracle: &O, checkpoint: &Checkpoint) -> ChainResult<()> {
    let height = oracle.chain_height()?;
    if height != checkpoint.height {
        return Err(mismatch(checkpoint.height, "height", checkpoint.height, height));
    }

    if let Some(expected) = checkpoint.tip_hash {
        let actual = oracle.best_block_hash()?;
        if actual != expected {
            return Err(mismatch(checkpoint.height, "tip_hash", expected, actual));
        }
    }

    if let Some(expected) = checkpoint.utxo_digest {
        let actual = oracle.utxo_set_digest()?;
        if actual != expected {
            return Err(mismatch(checkpoint.height, "utxo_digest", expected, actual));
        }
    }

    info!("CHECKPOINT - height {} verified", checkpoint.height);
    Ok(())
}

fn mismatch(
    height: u32,
    field: &'static str,
    expected: impl ToString,
    actual: impl ToString,
) -> ChainError {
    let (expected, actual) = (expected.to_string(), actual.to_string());
    warn!(
        "CHECKPOINT - {} mismatch at height {}: expected {}, actual {}",
        field, height, expected, actual
    );
    ChainError::CheckpointMismatch {
        height,
        field,
        expected,
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::miner::ChainDriver;
    use crate::blockchain::node::RegtestNode;
    use crate::wallet::RecipientKey;

    fn node_at(height: u32) -> RegtestNode {
        let params = ChainParams::regtest();
        let mut node = RegtestNode::new(params.clone());
        let key = RecipientKey::deterministic().unwrap();
        let mut driver = ChainDriver::from_oracle(params, key, &node).unwrap();
        driver.advance_by(&mut node, height).unwrap();
        node
    }

    #[test]
    fn literal_tables_parse() {
        for lit in LOCAL_NODE_CHECKPOINTS
            .iter()
            .chain(REFERENCE_NODE_CHECKPOINTS)
            .chain(ASSUMEUTXO_CHECKPOINTS)
        {
            let cp = lit.parse().unwrap();
            assert_eq!(cp.height, lit.height);
        }
    }

    #[test]
    fn tables_are_chosen_by_genesis() {
        let bitcoin_style = ChainParams::regtest().genesis_hash();
        assert_eq!(
            checkpoints_for_genesis(&bitcoin_style).map(|t| t[0].tip_hash),
            Some(REFERENCE_NODE_CHECKPOINTS[0].tip_hash)
        );

        let other = Hash256::from_hex(ASSUMEUTXO_REGTEST_GENESIS).unwrap();
        let table = checkpoints_for_genesis(&other).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].parse().unwrap().tip_hash, Some(other));

        assert!(checkpoints_for_genesis(&Hash256::ZERO).is_none());
    }

    #[test]
    fn bad_literal_is_a_decode_error() {
        let lit = CheckpointLiteral {
            height: 1,
            tip_hash: Some("zz"),
            utxo_digest: None,
        };
        assert!(matches!(lit.parse(), Err(ChainError::Decode(_))));
    }

    #[test]
    fn matching_checkpoint_passes() {
        let node = node_at(3);
        let cp = Checkpoint {
            height: 3,
            tip_hash: Some(node.tip().hash),
            utxo_digest: Some(node.utxo_set_digest().unwrap()),
        };
        verify(&node, &cp).unwrap();
    }

    #[test]
    fn wrong_digest_reports_both_values() {
        let node = node_at(3);
        let actual = node.utxo_set_digest().unwrap();
        let wrong = Hash256([0x11; 32]);
        let cp = Checkpoint {
            height: 3,
            tip_hash: None,
            utxo_digest: Some(wrong),
        };
        match verify(&node, &cp).unwrap_err() {
            ChainError::CheckpointMismatch {
                height,
                field,
                expected,
                actual: got,
            } => {
                assert_eq!(height, 3);
                assert_eq!(field, "utxo_digest");
                assert_eq!(expected, wrong.to_hex());
                assert_eq!(got, actual.to_hex());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn height_is_checked_first() {
        let node = node_at(2);
        let cp = Checkpoint {
            height: 5,
            tip_hash: Some(Hash256::ZERO),
            utxo_digest: None,
        };
        assert!(matches!(
            verify(&node, &cp),
            Err(ChainError::CheckpointMismatch { field: "height", .. })
        ));
    }
}
