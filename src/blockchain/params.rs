use super::block::{Block, BlockHeader};
use super::reward::RewardSchedule;
use super::{BLOCK_VERSION, POW_LIMIT_BITS};
use crate::encoding::Hash256;
use crate::transaction::script::{Script, encode_script_num, opcodes::OP_CHECKSIG};
use crate::transaction::{Amount, COIN, OutPoint, Transaction, TxInput, TxOutput};

const GENESIS_TIMESTAMP: &[u8] =
    b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

const GENESIS_OUTPUT_PUBKEY: [u8; 65] = [
    0x04, 0x67, 0x8a, 0xfd, 0xb0, 0xfe, 0x55, 0x48, 0x27, 0x19, 0x67, 0xf1, 0xa6,
    0x71, 0x30, 0xb7, 0x10, 0x5c, 0xd6, 0xa8, 0x28, 0xe0, 0x39, 0x09, 0xa6, 0x79,
    0x62, 0xe0, 0xea, 0x1f, 0x61, 0xde, 0xb6, 0x49, 0xf6, 0xbc, 0x3f, 0x4c, 0xef,
    0x38, 0xc4, 0xf3, 0x55, 0x04, 0xe5, 0x1e, 0xc1, 0x12, 0xde, 0x5c, 0x38, 0x4d,
    0xf7, 0xba, 0x0b, 0x8d, 0x57, 0x8a, 0x4c, 0x70, 0x2b, 0x6b, 0xf1, 0x1d, 0x5f,
];

/// Consensus and generation constants for one network.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub network: &'static str,
    pub reward: RewardSchedule,
    pub genesis_time: u32,
    pub genesis_nonce: u32,
    pub genesis_version: i32,
    pub genesis_reward: Amount,
    /// Compact form of the easiest allowed target; with retargeting off every
    /// block must carry exactly these bits.
    pub pow_limit_bits: u32,
    pub block_version: i32,
    /// Height from which the coinbase must start with its height push.
    pub bip34_height: u32,
    pub coinbase_tag: &'static [u8],
    /// Virtual clock value for the first generated block.
    pub initial_mock_time: u32,
    pub median_time_span: usize,
    /// How far past the node's clock a block time may run.
    pub max_future_block_time: u32,
}

impl ChainParams {
    pub fn regtest() -> Self {
        Self {
            network: "regtest",
            reward: RewardSchedule::new_unchecked(50 * COIN, 150),
            genesis_time: 1_296_688_602,
            genesis_nonce: 2,
            genesis_version: 1,
            genesis_reward: 50 * COIN,
            pow_limit_bits: POW_LIMIT_BITS,
            block_version: BLOCK_VERSION,
            bip34_height: 500,
            coinbase_tag: b"/EB32.0/",
            initial_mock_time: 1_598_887_952,
            median_time_span: 11,
            max_future_block_time: 2 * 60 * 60,
        }
    }

    pub fn genesis_block(&self) -> Block {
        let script_sig = Script::new()
            .push_slice(&encode_script_num(486_604_799))
            .push_slice(&encode_script_num(4))
            .push_slice(GENESIS_TIMESTAMP);
        let script_pubkey = Script::new()
            .push_slice(&GENESIS_OUTPUT_PUBKEY)
            .push_opcode(OP_CHECKSIG);

        let coinbase = Transaction::new(
            1,
            vec![TxInput {
                prevout: OutPoint::null(),
                script_sig,
                sequence: u32::MAX,
            }],
            vec![TxOutput {
                value: self.genesis_reward,
                script_pubkey,
            }],
            0,
        );

        let header = BlockHeader {
            version: self.genesis_version,
            prev_block_hash: Hash256::ZERO,
            merkle_root: coinbase.txid(),
            time: self.genesis_time,
            bits: self.pow_limit_bits,
            nonce: self.genesis_nonce,
        };
        Block {
            header,
            transactions: vec![coinbase],
        }
    }

    pub fn genesis_hash(&self) -> Hash256 {
        self.genesis_block().hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::pow::check_proof_of_work;

    #[test]
    fn regtest_genesis_matches_known_hashes() {
        let params = ChainParams::regtest();
        let genesis = params.genesis_block();
        assert_eq!(
            genesis.header.merkle_root.to_hex(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert_eq!(
            genesis.hash().to_hex(),
            "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"
        );
    }

    #[test]
    fn genesis_satisfies_its_own_target() {
        let genesis = ChainParams::regtest().genesis_block();
        assert!(check_proof_of_work(&genesis.header).unwrap());
        assert!(genesis.has_valid_merkle_root());
        assert!(genesis.transactions[0].is_coinbase());
    }
}
