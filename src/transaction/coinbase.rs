use log::debug;

use crate::blockchain::params::ChainParams;
use crate::errors::{ChainError, ChainResult};
use crate::wallet::RecipientKey;

use super::COINBASE_TX_VERSION;
use super::model::{Transaction, TxInput, TxOutput};
use super::script::{Script, encode_coinbase_script};
use super::utxo::OutPoint;

/// Build the reward transaction for `height`, paying the scheduled subsidy to
/// `<recipient> OP_CHECKSIG`. Genesis (height 0) has no generated coinbase.
pub fn build_coinbase(
    height: u32,
    recipient: &RecipientKey,
    params: &ChainParams,
) -> ChainResult<Transaction> {
    if height == 0 {
        return Err(ChainError::InvalidInput(
            "coinbase height must be at least 1".into(),
        ));
    }

    let input = TxInput {
        prevout: OutPoint::null(),
        script_sig: encode_coinbase_script(height, params.coinbase_tag),
        sequence: u32::MAX,
    };
    let output = TxOutput {
        value: params.reward.subsidy(height),
        script_pubkey: Script::pay_to_pubkey(recipient),
    };

    let tx = Transaction::new(COINBASE_TX_VERSION, vec![input], vec![output], 0);
    debug!(
        "COINBASE - height={} value={} txid={}",
        height,
        tx.outputs()[0].value,
        tx.txid()
    );
    Ok(tx)
}
