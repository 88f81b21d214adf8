pub mod coinbase;
pub mod model;
pub mod script;
pub mod utxo;

pub use coinbase::build_coinbase;
pub use model::{Transaction, TxInput, TxOutput};
pub use script::{HeightPush, Script};
pub use utxo::{Coin, OutPoint, UtxoSet};

/// Base units, 10^-8 of a coin.
pub type Amount = u64;

pub const COIN: Amount = 100_000_000;

/// Version written into every generated coinbase.
pub const COINBASE_TX_VERSION: i32 = 2;
