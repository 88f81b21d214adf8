pub mod api;
pub mod blockchain;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod rpc;
pub mod transaction;
pub mod wallet;
