use thiserror::Error;

use crate::encoding::Hash256;

/// Failures while reading wire-format bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("non-canonical compact size")]
    NonCanonicalCompactSize,
    #[error("length {0} exceeds the maximum serialized size")]
    OversizedLength(u64),
    #[error("varint overflows 64 bits")]
    VarIntOverflow,
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
    #[error("invalid hex string")]
    InvalidHex,
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Failures talking to a node over JSON-RPC.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Server { code: i64, message: String },
    #[error("unexpected rpc response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid compact target bits {0:#010x}")]
    InvalidCompactBits(u32),
    #[error("no proof-of-work solution after {attempts} attempts")]
    NonceExhausted { attempts: u64 },
    #[error("block at height {height} rejected: {reason}")]
    BlockRejected { height: u32, reason: String },
    #[error("tip did not move after accepting block at height {height} (tip {tip})")]
    TipUnchanged { height: u32, tip: Hash256 },
    #[error("checkpoint mismatch at height {height} on {field}: expected {expected}, actual {actual}")]
    CheckpointMismatch {
        height: u32,
        field: &'static str,
        expected: String,
        actual: String,
    },
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
    #[error("cryptography error: {0}")]
    Crypto(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type ChainResult<T> = Result<T, ChainError>;
